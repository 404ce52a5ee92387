//! 系统设置存储实现

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use crate::entity::system_settings::{self, Entity as SystemSettings};
use crate::entity::system_settings_audit::{self, Entity as SystemSettingsAudit};
use crate::errors::{CampusError, Result};
use crate::models::common::page_window;
use crate::models::{
    common::PaginationInfo,
    system::{
        entities::{SettingDefault, SystemSetting},
        requests::SettingAuditQuery,
        responses::SettingAuditListResponse,
    },
};

use super::{SeaOrmStorage, db_error};

/// 在给定连接（或事务）上修改一项配置并写审计记录
async fn apply_update<C: ConnectionTrait>(
    conn: &C,
    key: &str,
    value: &str,
    user_id: i64,
    ip_address: Option<String>,
) -> Result<SystemSetting> {
    let now = chrono::Utc::now().timestamp();

    let existing = SystemSettings::find_by_id(key.to_string())
        .one(conn)
        .await
        .map_err(db_error("获取设置失败"))?
        .ok_or_else(|| CampusError::not_found(format!("配置项不存在: {key}")))?;
    let old_value = existing.value.clone();

    let mut setting: system_settings::ActiveModel = existing.into();
    setting.value = Set(value.to_string());
    setting.updated_at = Set(now);
    setting.updated_by = Set(Some(user_id));
    let updated = setting
        .update(conn)
        .await
        .map_err(db_error("更新设置失败"))?;

    system_settings_audit::ActiveModel {
        setting_key: Set(key.to_string()),
        old_value: Set(Some(old_value)),
        new_value: Set(value.to_string()),
        changed_by: Set(user_id),
        changed_at: Set(now),
        ip_address: Set(ip_address),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(db_error("创建审计日志失败"))?;

    Ok(updated.into())
}

impl SeaOrmStorage {
    pub(crate) async fn list_all_settings_impl(&self) -> Result<Vec<SystemSetting>> {
        let settings = SystemSettings::find()
            .order_by_asc(system_settings::Column::Key)
            .all(&self.db)
            .await
            .map_err(db_error("获取设置列表失败"))?;

        Ok(settings.into_iter().map(Into::into).collect())
    }

    pub(crate) async fn get_setting_by_key_impl(&self, key: &str) -> Result<Option<SystemSetting>> {
        let setting = SystemSettings::find_by_id(key.to_string())
            .one(&self.db)
            .await
            .map_err(db_error("获取设置失败"))?;

        Ok(setting.map(Into::into))
    }

    /// 只插入数据库中还没有的配置项，已有的值保持不变
    pub(crate) async fn insert_missing_settings_impl(
        &self,
        defaults: &[SettingDefault],
    ) -> Result<usize> {
        let now = chrono::Utc::now().timestamp();
        let mut inserted = 0;

        for default in defaults {
            let exists = SystemSettings::find_by_id(default.key.to_string())
                .one(&self.db)
                .await
                .map_err(db_error("获取设置失败"))?
                .is_some();
            if exists {
                continue;
            }

            system_settings::ActiveModel {
                key: Set(default.key.to_string()),
                value: Set(default.value.clone()),
                value_type: Set(default.value_type.to_string()),
                description: Set(Some(default.description.to_string())),
                updated_at: Set(now),
                updated_by: Set(None),
            }
            .insert(&self.db)
            .await
            .map_err(db_error("写入默认设置失败"))?;
            inserted += 1;
        }

        Ok(inserted)
    }

    pub(crate) async fn update_setting_impl(
        &self,
        key: &str,
        value: &str,
        user_id: i64,
        ip_address: Option<String>,
    ) -> Result<SystemSetting> {
        apply_update(&self.db, key, value, user_id, ip_address).await
    }

    /// 批量更新在同一事务中完成，任一项失败则全部回滚
    pub(crate) async fn batch_update_settings_impl(
        &self,
        updates: Vec<(String, String)>,
        user_id: i64,
        ip_address: Option<String>,
    ) -> Result<Vec<SystemSetting>> {
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        let mut results = Vec::with_capacity(updates.len());
        for (key, value) in &updates {
            match apply_update(&txn, key, value, user_id, ip_address.clone()).await {
                Ok(setting) => results.push(setting),
                Err(e) => {
                    txn.rollback().await.map_err(db_error("回滚事务失败"))?;
                    return Err(e);
                }
            }
        }

        txn.commit().await.map_err(db_error("提交事务失败"))?;
        Ok(results)
    }

    /// 审计日志，最新的在前
    pub(crate) async fn list_setting_audits_impl(
        &self,
        query: SettingAuditQuery,
    ) -> Result<SettingAuditListResponse> {
        let (page, size) = page_window(query.page, query.size, 20);

        let mut select = SystemSettingsAudit::find();
        if let Some(key) = &query.key {
            select = select.filter(system_settings_audit::Column::SettingKey.eq(key.as_str()));
        }

        let paginator = select
            .order_by_desc(system_settings_audit::Column::ChangedAt)
            .order_by_desc(system_settings_audit::Column::Id)
            .paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(db_error("统计审计日志失败"))?;
        let audits = paginator
            .fetch_page(page - 1)
            .await
            .map_err(db_error("获取审计日志失败"))?;

        Ok(SettingAuditListResponse {
            audits: audits.into_iter().map(Into::into).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }
}
