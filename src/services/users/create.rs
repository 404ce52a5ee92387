use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::UserService;
use crate::errors::CampusError;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{requests::CreateUserRequest, responses::UserResponse},
};
use crate::services::error_response;
use crate::utils::password::hash_password;
use crate::utils::validate::{validate_email, validate_password, validate_username};

pub async fn create_user(
    service: &UserService,
    mut user_data: CreateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    user_data.username = user_data.username.trim().to_string();
    user_data.email = user_data.email.trim().to_lowercase();

    if let Err(msg) = validate_username(&user_data.username) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserNameInvalid, msg)));
    }
    if let Err(msg) = validate_email(&user_data.email) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
    }
    if let Err(msg) = validate_password(&user_data.password) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
    }

    user_data.password = match hash_password(&user_data.password) {
        Ok(hash) => hash,
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Password hashing failed: {e}"),
                )),
            );
        }
    };

    let storage = service.get_storage(request);

    if let Some(department_id) = user_data.department_id {
        match storage.get_department_by_id(department_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::DepartmentNotFound,
                    "Department not found",
                )));
            }
            Err(e) => return Ok(error_response(&e, "Failed to verify department")),
        }
    }

    match storage.create_user(user_data).await {
        Ok(user) => {
            info!("Created {} account {}", user.role, user.username);
            Ok(HttpResponse::Created().json(ApiResponse::success(
                UserResponse { user },
                "User created successfully",
            )))
        }
        Err(CampusError::Conflict(_)) => Ok(HttpResponse::Conflict().json(
            ApiResponse::error_empty(
                ErrorCode::UserAlreadyExists,
                "Username or email already exists",
            ),
        )),
        Err(e) => {
            error!("User creation failed: {}", e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::UserCreationFailed,
                format!("User creation failed: {e}"),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::services::testing::{body_json, campus, request_as};

    fn teacher_request(department_id: Option<i64>) -> CreateUserRequest {
        CreateUserRequest {
            username: "meera_k".to_string(),
            email: " Meera@KTU.test ".to_string(),
            password: "lecture2024".to_string(),
            role: UserRole::Teacher,
            display_name: Some("Meera K".to_string()),
            avatar_url: None,
            department_id,
        }
    }

    #[tokio::test]
    async fn test_create_teacher_in_unknown_department() {
        let campus = campus().await;
        let service = UserService::with_deps(campus.storage.clone(), None);
        let req = request_as(&campus.admin);

        let resp = create_user(&service, teacher_request(Some(999)), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        let class = campus
            .storage
            .get_class_by_id(campus.class_id)
            .await
            .unwrap()
            .unwrap();
        let resp = create_user(&service, teacher_request(Some(class.department_id)), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["user"]["email"], "meera@ktu.test");
        assert_eq!(body["data"]["user"]["department_id"], class.department_id);

        let resp = create_user(&service, teacher_request(None), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);
    }
}
