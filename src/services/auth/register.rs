use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::CampusError;
use crate::models::{
    ApiResponse, ErrorCode,
    auth::RegisterRequest,
    students::entities::{Student, normalize_usn},
    users::{entities::UserRole, requests::CreateUserRequest},
};
use crate::storage::Storage;
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_password, validate_username};

use super::AuthService;

pub async fn handle_register(
    service: &AuthService,
    register_request: RegisterRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let username = register_request.username.trim().to_string();
    let email = register_request.email.trim().to_lowercase();

    if let Err(msg) = validate_username(&username) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserNameInvalid, msg)));
    }
    if let Err(msg) = validate_email(&email) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
    }
    if let Err(msg) = validate_password(&register_request.password) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
    }

    // 1. 用户名与邮箱唯一
    if let Err(response) = check_username_exists(&storage, &username).await {
        return Ok(response);
    }
    if let Err(response) = check_email_exists(&storage, &email).await {
        return Ok(response);
    }

    // 2. 可选的学籍关联
    let student = match register_request.usn.as_deref().map(normalize_usn) {
        Some(usn) if !usn.is_empty() => match find_linkable_student(&storage, &usn).await {
            Ok(student) => Some(student),
            Err(response) => return Ok(response),
        },
        _ => None,
    };

    let password_hash = match hash_password(&register_request.password) {
        Ok(hash) => hash,
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::RegisterFailed,
                    format!("Password hashing failed: {e}"),
                )),
            );
        }
    };

    let display_name = register_request
        .display_name
        .filter(|name| !name.trim().is_empty())
        .or_else(|| student.as_ref().map(|s| s.name.clone()));

    // 3. 创建学生账号
    let user = match storage
        .create_user(CreateUserRequest {
            username,
            email,
            password: password_hash,
            role: UserRole::Student,
            display_name,
            avatar_url: None,
            department_id: None,
        })
        .await
    {
        Ok(user) => user,
        Err(CampusError::Conflict(msg)) => {
            return Ok(HttpResponse::Conflict()
                .json(ApiResponse::error_empty(ErrorCode::UserAlreadyExists, msg)));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::RegisterFailed,
                    format!("Register failed: {e}"),
                )),
            );
        }
    };

    // 4. 关联学籍，并发注册时以先到者为准
    if let Some(student) = student {
        match storage.link_student_user(student.id, user.id).await {
            Ok(true) => tracing::info!("User {} linked to USN {}", user.id, student.usn),
            Ok(false) | Err(CampusError::Conflict(_)) => {
                let _ = storage.delete_user(user.id).await;
                return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::StudentAlreadyLinked,
                    "This USN is already linked to another account",
                )));
            }
            Err(e) => {
                let _ = storage.delete_user(user.id).await;
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::RegisterFailed,
                        format!("Register failed: {e}"),
                    )),
                );
            }
        }
    }

    Ok(HttpResponse::Created().json(ApiResponse::success(user, "Registration successful")))
}

async fn find_linkable_student(
    storage: &Arc<dyn Storage>,
    usn: &str,
) -> Result<Student, HttpResponse> {
    match storage.get_student_by_usn(usn).await {
        Ok(Some(student)) if student.user_id.is_some() => Err(HttpResponse::Conflict().json(
            ApiResponse::error_empty(
                ErrorCode::StudentAlreadyLinked,
                "This USN is already linked to another account",
            ),
        )),
        Ok(Some(student)) => Ok(student),
        Ok(None) => Err(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::StudentNotFound,
            format!("No student record found for USN {usn}"),
        ))),
        Err(e) => Err(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::RegisterFailed,
                format!("Register failed: {e}"),
            )),
        ),
    }
}

async fn check_username_exists(
    storage: &Arc<dyn Storage>,
    username: &str,
) -> Result<(), HttpResponse> {
    match storage.get_user_by_username(username).await {
        Ok(Some(_)) => Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserNameAlreadyExists,
            "Username already exists",
        ))),
        Ok(None) => Ok(()),
        Err(e) => Err(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::RegisterFailed,
                format!("Register failed: {e}"),
            )),
        ),
    }
}

async fn check_email_exists(storage: &Arc<dyn Storage>, email: &str) -> Result<(), HttpResponse> {
    match storage.get_user_by_email(email).await {
        Ok(Some(_)) => Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::UserEmailAlreadyExists,
            "Email already exists",
        ))),
        Ok(None) => Ok(()),
        Err(e) => Err(
            HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::RegisterFailed,
                format!("Register failed: {e}"),
            )),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::students::requests::CreateStudentRequest;
    use crate::services::testing::{body_json, campus};
    use actix_web::test::TestRequest;

    fn register(username: &str, usn: Option<&str>) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: format!("{username}@ktu.test"),
            password: "campus2025".to_string(),
            display_name: None,
            usn: usn.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_register_links_unclaimed_usn() {
        let campus = campus().await;
        let student = campus
            .storage
            .create_student(CreateStudentRequest {
                usn: "4KT21CS002".to_string(),
                name: "Bala".to_string(),
                class_id: campus.class_id,
                user_id: None,
            })
            .await
            .unwrap();
        let service = AuthService::with_deps(campus.storage.clone(), None);
        let req = TestRequest::default().to_http_request();

        let resp = handle_register(&service, register("bala_k", Some(" 4kt21cs002 ")), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["role"], "student");
        assert_eq!(body["data"]["profile"]["display_name"], "Bala");

        let linked = campus
            .storage
            .get_student_by_id(student.id)
            .await
            .unwrap()
            .unwrap();
        assert!(linked.user_id.is_some());
    }

    #[tokio::test]
    async fn test_register_rejects_linked_usn_and_weak_password() {
        let campus = campus().await;
        let service = AuthService::with_deps(campus.storage.clone(), None);
        let req = TestRequest::default().to_http_request();

        let resp = handle_register(&service, register("other01", Some("4KT21CS001")), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);
        assert_eq!(
            body_json(resp).await["code"],
            ErrorCode::StudentAlreadyLinked as i32
        );
        // 失败的注册不留下账号
        assert!(
            campus
                .storage
                .get_user_by_username("other01")
                .await
                .unwrap()
                .is_none()
        );

        let mut weak = register("other02", None);
        weak.password = "short".to_string();
        let resp = handle_register(&service, weak, &req).await.unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_register_unknown_usn_and_duplicate_username() {
        let campus = campus().await;
        let service = AuthService::with_deps(campus.storage.clone(), None);
        let req = TestRequest::default().to_http_request();

        let resp = handle_register(&service, register("nobody1", Some("9ZZ99ZZ999")), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let resp = handle_register(&service, register("teacher1", None), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);
    }
}
