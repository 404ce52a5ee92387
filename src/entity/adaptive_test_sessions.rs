//! 自适应测试会话实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "adaptive_test_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    #[sea_orm(column_type = "Text")]
    pub questions: String,
    #[sea_orm(column_type = "Text")]
    pub answers: String,
    pub current_index: i32,
    pub total_questions: i32,
    pub started_at: i64,
    pub completed: bool,
    pub completed_at: Option<i64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub analysis: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::adaptive_tests::entities::TestSession {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            questions: serde_json::from_str(&m.questions).unwrap_or_default(),
            answers: serde_json::from_str(&m.answers).unwrap_or_default(),
            current_index: m.current_index,
            total_questions: m.total_questions,
            started_at: chrono::DateTime::from_timestamp(m.started_at, 0).unwrap_or_default(),
            completed: m.completed,
            completed_at: m
                .completed_at
                .map(|ts| chrono::DateTime::from_timestamp(ts, 0).unwrap_or_default()),
            analysis: m
                .analysis
                .and_then(|raw| serde_json::from_str(&raw).ok()),
        }
    }
}
