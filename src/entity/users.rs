//! 用户实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub department_id: Option<i64>,
    pub last_login: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::departments::Entity",
        from = "Column::DepartmentId",
        to = "super::departments::Column::Id"
    )]
    Department,
    #[sea_orm(has_one = "super::students::Entity")]
    Student,
    #[sea_orm(has_many = "super::course_assignments::Entity")]
    CourseAssignments,
    #[sea_orm(has_many = "super::files::Entity")]
    Files,
}

impl Related<super::departments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::course_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CourseAssignments.def()
    }
}

impl Related<super::files::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Files.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::models::users::entities::User {
    fn from(m: Model) -> Self {
        use crate::models::users::entities::{UserProfile, UserRole, UserStatus};
        let at = |ts: i64| chrono::DateTime::from_timestamp(ts, 0).unwrap_or_default();

        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            password_hash: m.password_hash,
            role: m.role.parse().unwrap_or(UserRole::Student),
            status: m.status.parse().unwrap_or(UserStatus::Active),
            profile: UserProfile {
                display_name: m.display_name.unwrap_or_default(),
                avatar_url: m.avatar_url,
            },
            department_id: m.department_id,
            last_login: m.last_login.map(at),
            created_at: at(m.created_at),
            updated_at: at(m.updated_at),
        }
    }
}
