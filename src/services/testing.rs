//! 服务层测试夹具

use std::sync::Arc;

use actix_web::{HttpMessage, HttpRequest, test::TestRequest};

use crate::config::AppConfig;
use crate::models::{
    classes::requests::CreateClassRequest,
    courses::requests::{CreateAssignmentRequest, CreateCourseRequest},
    departments::requests::CreateDepartmentRequest,
    students::requests::CreateStudentRequest,
    system::entities::SettingDefault,
    users::{
        entities::{User, UserRole},
        requests::CreateUserRequest,
    },
};
use crate::storage::{Storage, sea_orm_storage::SeaOrmStorage};

pub(crate) struct Campus {
    pub storage: Arc<dyn Storage>,
    pub admin: User,
    pub teacher: User,
    pub student_user: User,
    pub student_id: i64,
    pub class_id: i64,
    pub course_id: i64,
    pub assignment_id: i64,
}

async fn user(storage: &Arc<dyn Storage>, username: &str, role: UserRole, name: &str) -> User {
    storage
        .create_user(CreateUserRequest {
            username: username.to_string(),
            email: format!("{username}@ktu.test"),
            password: crate::utils::password::hash_password("secret123").unwrap(),
            role,
            display_name: Some(name.to_string()),
            avatar_url: None,
            department_id: None,
        })
        .await
        .unwrap()
}

/// 一个院系、一个班级、一名教师、一门已分配并排课的课程、一名已选课的学生
pub(crate) async fn campus() -> Campus {
    let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::new_in_memory().await.unwrap());
    storage
        .insert_missing_settings(&SettingDefault::all(AppConfig::get()))
        .await
        .unwrap();

    let dept = storage
        .create_department(CreateDepartmentRequest {
            code: "CSE".to_string(),
            name: "Computer Science".to_string(),
        })
        .await
        .unwrap();
    let class = storage
        .create_class(CreateClassRequest {
            department_id: dept.id,
            semester: 5,
            section: "A".to_string(),
        })
        .await
        .unwrap();

    let admin = user(&storage, "admin01", UserRole::Admin, "Admin").await;
    let teacher = user(&storage, "teacher1", UserRole::Teacher, "Dr. Rao").await;
    let student_user = user(&storage, "asha01", UserRole::Student, "Asha").await;

    let course = storage
        .create_course(CreateCourseRequest {
            code: "CS501".to_string(),
            name: "Compiler Design".to_string(),
            department_id: dept.id,
            semester: 5,
            credits: 4,
        })
        .await
        .unwrap();
    let assignment = storage
        .create_assignment(
            course.id,
            CreateAssignmentRequest {
                class_id: class.id,
                teacher_id: teacher.id,
            },
        )
        .await
        .unwrap();
    storage
        .create_timetable_slot(assignment.id, "Monday", 1)
        .await
        .unwrap();

    let student = storage
        .create_student(CreateStudentRequest {
            usn: "4KT21CS001".to_string(),
            name: "Asha".to_string(),
            class_id: class.id,
            user_id: None,
        })
        .await
        .unwrap();
    storage
        .link_student_user(student.id, student_user.id)
        .await
        .unwrap();
    storage.enroll_student(student.id, course.id).await.unwrap();

    Campus {
        storage,
        admin,
        teacher,
        student_user,
        student_id: student.id,
        class_id: class.id,
        course_id: course.id,
        assignment_id: assignment.id,
    }
}

/// 已通过认证的请求
pub(crate) fn request_as(user: &User) -> HttpRequest {
    let req = TestRequest::default().to_http_request();
    req.extensions_mut().insert(user.clone());
    req
}

pub(crate) async fn body_json(resp: actix_web::HttpResponse) -> serde_json::Value {
    let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
