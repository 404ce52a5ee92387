//! 生成试卷实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "question_papers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub template_id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "Text")]
    pub difficulty_distribution: String,
    pub generated_by: i64,
    pub generated_at: i64,
    pub is_edited: bool,
    pub last_edited_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::question_paper_templates::Entity",
        from = "Column::TemplateId",
        to = "super::question_paper_templates::Column::Id"
    )]
    Template,
}

impl Related<super::question_paper_templates::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Template.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::question_papers::entities::QuestionPaper {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            template_id: m.template_id,
            title: m.title,
            content: serde_json::from_str(&m.content).unwrap_or_default(),
            difficulty_distribution: serde_json::from_str(&m.difficulty_distribution)
                .unwrap_or_default(),
            generated_by: m.generated_by,
            generated_at: chrono::DateTime::from_timestamp(m.generated_at, 0)
                .unwrap_or_default(),
            is_edited: m.is_edited,
            last_edited_at: m
                .last_edited_at
                .map(|ts| chrono::DateTime::from_timestamp(ts, 0).unwrap_or_default()),
        }
    }
}
