//! 聊天记录存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::chat_messages::{ActiveModel, Column, Entity as ChatMessages};
use crate::errors::Result;
use crate::models::chat::entities::{ChatMessage, ChatRole};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

impl SeaOrmStorage {
    pub async fn create_chat_message_impl(
        &self,
        user_id: i64,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessage> {
        let model = ActiveModel {
            user_id: Set(user_id),
            role: Set(role.to_string()),
            content: Set(content.to_string()),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(db_error("保存聊天记录失败"))?;

        Ok(result.into())
    }

    /// 最近 limit 条记录，按时间正序返回
    pub async fn list_recent_chat_messages_impl(
        &self,
        user_id: i64,
        limit: u64,
    ) -> Result<Vec<ChatMessage>> {
        let mut rows = ChatMessages::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_error("查询聊天记录失败"))?;

        rows.reverse();
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn clear_chat_history_impl(&self, user_id: i64) -> Result<u64> {
        let result = ChatMessages::delete_many()
            .filter(Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(db_error("清空聊天记录失败"))?;

        Ok(result.rows_affected)
    }
}
