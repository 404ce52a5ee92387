//! 聊天时的用户上下文

use std::sync::Arc;

use crate::errors::Result;
use crate::models::{
    students::entities::StudentDetail,
    users::entities::{User, UserRole},
};
use crate::storage::Storage;

pub struct UserContext {
    pub user: User,
    pub name: String,
    pub department: Option<String>,
    /// 学生用户的学籍信息
    pub student: Option<StudentDetail>,
}

impl UserContext {
    pub fn is_teacher(&self) -> bool {
        self.user.role.is_staff()
    }

    pub fn role_title(&self) -> &'static str {
        match self.user.role {
            UserRole::Student => "Student",
            UserRole::Teacher => "Teacher",
            UserRole::Admin => "Admin",
        }
    }

    /// 流式对话使用的简短描述
    pub fn describe(&self) -> String {
        match &self.student {
            Some(student) => format!("Student {} (USN: {})", student.name, student.usn),
            None => format!("{} {}", self.role_title(), self.name),
        }
    }
}

/// 学生用户没有关联学籍时返回 `None`
pub async fn load_context(storage: &Arc<dyn Storage>, user: &User) -> Result<Option<UserContext>> {
    if user.role == UserRole::Student {
        let Some(student) = storage.get_student_by_user_id(user.id).await? else {
            return Ok(None);
        };
        let Some(detail) = storage.get_student_detail(student.id).await? else {
            return Ok(None);
        };
        return Ok(Some(UserContext {
            user: user.clone(),
            name: detail.name.clone(),
            department: Some(detail.department_name.clone()),
            student: Some(detail),
        }));
    }

    let department = match user.department_id {
        Some(id) => storage.get_department_by_id(id).await?.map(|d| d.name),
        None => None,
    };
    Ok(Some(UserContext {
        user: user.clone(),
        name: user.display_name().to_string(),
        department,
        student: None,
    }))
}
