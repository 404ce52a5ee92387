//! 聊天记录实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "chat_messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub role: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::chat::entities::ChatMessage {
    fn from(m: Model) -> Self {
        use crate::models::chat::entities::ChatRole;

        Self {
            id: m.id,
            user_id: m.user_id,
            role: m.role.parse::<ChatRole>().unwrap_or(ChatRole::User),
            content: m.content,
            created_at: chrono::DateTime::from_timestamp(m.created_at, 0).unwrap_or_default(),
        }
    }
}
