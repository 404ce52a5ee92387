//! 系统设置审计日志实体

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::models::system::entities::SettingAudit;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "system_settings_audit")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub setting_key: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub changed_by: i64,
    pub changed_at: i64,
    pub ip_address: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SettingAudit {
    fn from(model: Model) -> Self {
        SettingAudit {
            id: model.id,
            setting_key: model.setting_key,
            old_value: model.old_value,
            new_value: model.new_value,
            changed_by: model.changed_by,
            changed_at: DateTime::<Utc>::from_timestamp(model.changed_at, 0).unwrap_or_default(),
            ip_address: model.ip_address,
        }
    }
}
