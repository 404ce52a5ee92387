//! 系统设置实体

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::models::system::entities::{SettingValueType, SystemSetting};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "system_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub value: String,
    pub value_type: String,
    pub description: Option<String>,
    pub updated_at: i64,
    pub updated_by: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SystemSetting {
    fn from(model: Model) -> Self {
        SystemSetting {
            // 未知类型按字符串处理，避免旧数据阻塞读取
            value_type: model.value_type.parse().unwrap_or(SettingValueType::String),
            key: model.key,
            value: model.value,
            description: model.description,
            updated_at: DateTime::<Utc>::from_timestamp(model.updated_at, 0).unwrap_or_default(),
            updated_by: model.updated_by,
        }
    }
}
