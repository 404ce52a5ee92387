//! 试卷模板实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "question_paper_templates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub institution: String,
    pub course: String,
    pub subject: String,
    pub total_marks: i32,
    pub duration_minutes: i32,
    /// 各部分定义（JSON）
    #[sea_orm(column_type = "Text")]
    pub structure: String,
    pub created_by: i64,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::question_papers::Entity")]
    QuestionPapers,
}

impl Related<super::question_papers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::QuestionPapers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::question_papers::entities::PaperTemplate {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            institution: m.institution,
            course: m.course,
            subject: m.subject,
            total_marks: m.total_marks,
            duration_minutes: m.duration_minutes,
            sections: serde_json::from_str(&m.structure).unwrap_or_default(),
            created_by: m.created_by,
            created_at: chrono::DateTime::from_timestamp(m.created_at, 0).unwrap_or_default(),
        }
    }
}
