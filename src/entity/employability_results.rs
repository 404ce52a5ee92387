//! 就业能力评估结果实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "employability_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    #[sea_orm(column_type = "Text")]
    pub scores: String,
    #[sea_orm(column_type = "Double")]
    pub overall_score: f64,
    pub level: i32,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::employability::entities::EmployabilityResult {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            scores: serde_json::from_str(&m.scores).unwrap_or_default(),
            overall_score: m.overall_score,
            level: m.level,
            created_at: chrono::DateTime::from_timestamp(m.created_at, 0).unwrap_or_default(),
        }
    }
}
