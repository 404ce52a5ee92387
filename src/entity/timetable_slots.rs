//! 课表时段实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "timetable_slots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub assignment_id: i64,
    pub day: String,
    pub period: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course_assignments::Entity",
        from = "Column::AssignmentId",
        to = "super::course_assignments::Column::Id"
    )]
    Assignment,
}

impl Related<super::course_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::courses::entities::TimetableSlot {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            assignment_id: m.assignment_id,
            day: m.day,
            period: m.period,
        }
    }
}
