use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::cache::{ObjectCache, user_cache_key};
use crate::middlewares::RequireJWT;
use crate::models::auth::{UpdateProfileRequest, UserInfoResponse};
use crate::models::users::entities::UserRole;
use crate::models::users::requests::UpdateUserRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::unauthorized;
use crate::utils::password::{hash_password, verify_password};
use crate::utils::validate::{validate_email, validate_password};

use super::AuthService;

pub async fn handle_get_user(
    service: &AuthService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(unauthorized());
    };

    let usn = if user.role == UserRole::Student {
        match service.get_storage(request).get_student_by_user_id(user.id).await {
            Ok(student) => student.map(|s| s.usn),
            Err(e) => {
                tracing::warn!("Failed to load student record for {}: {}", user.id, e);
                None
            }
        }
    } else {
        None
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        UserInfoResponse { user, usn },
        "User information retrieved successfully",
    )))
}

pub async fn handle_update_profile(
    service: &AuthService,
    update_data: UpdateProfileRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let Some(current_user) = RequireJWT::extract_user_claims(request) else {
        return Ok(unauthorized());
    };

    let email = update_data.email.map(|e| e.trim().to_lowercase());
    if let Some(ref email) = email {
        if let Err(msg) = validate_email(email) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
        }
        if let Ok(Some(existing)) = storage.get_user_by_email(email).await
            && existing.id != current_user.id
        {
            return Ok(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::UserEmailAlreadyExists,
                "Email already exists",
            )));
        }
    }

    // 修改密码需要当前密码；缓存中的用户不含哈希，需回库读取
    let password = match update_data.new_password {
        Some(ref new_password) => {
            let stored = match storage.get_user_by_id(current_user.id).await {
                Ok(Some(user)) => user,
                Ok(None) => {
                    return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                        ErrorCode::UserNotFound,
                        "User not found",
                    )));
                }
                Err(e) => return Ok(crate::services::error_response(&e, "Profile update failed")),
            };
            let current_ok = update_data
                .current_password
                .as_deref()
                .is_some_and(|p| verify_password(p, &stored.password_hash));
            if !current_ok {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::UserPasswordInvalid,
                    "Current password is incorrect",
                )));
            }
            if let Err(msg) = validate_password(new_password) {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::UserPasswordInvalid,
                    msg,
                )));
            }
            match hash_password(new_password) {
                Ok(hash) => Some(hash),
                Err(e) => return Ok(crate::services::error_response(&e, "Password hashing failed")),
            }
        }
        None => None,
    };

    // 角色与状态只能由管理员修改
    let update = UpdateUserRequest {
        email,
        password,
        display_name: update_data.display_name,
        avatar_url: update_data.avatar_url,
        ..Default::default()
    };

    match storage.update_user(current_user.id, update).await {
        Ok(Some(user)) => {
            if let Some(token) = RequireJWT::extract_bearer_token(request)
                && let Some(cache) = request.app_data::<web::Data<Arc<dyn ObjectCache>>>()
            {
                cache.remove(&user_cache_key(&token)).await;
            }
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserInfoResponse { user, usn: None },
                "Profile updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(crate::services::error_response(&e, "Profile update failed")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{body_json, campus, request_as};

    #[tokio::test]
    async fn test_me_includes_usn_for_students() {
        let campus = campus().await;
        let service = AuthService::with_deps(campus.storage.clone(), None);

        let resp = handle_get_user(&service, &request_as(&campus.student_user))
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["usn"], "4KT21CS001");

        let resp = handle_get_user(&service, &request_as(&campus.teacher))
            .await
            .unwrap();
        assert!(body_json(resp).await["data"]["usn"].is_null());
    }

    #[tokio::test]
    async fn test_password_change_requires_current_password() {
        let campus = campus().await;
        let service = AuthService::with_deps(campus.storage.clone(), None);
        let req = request_as(&campus.teacher);

        let attempt = |current: Option<&str>| UpdateProfileRequest {
            display_name: None,
            email: None,
            avatar_url: None,
            current_password: current.map(str::to_string),
            new_password: Some("newpass2025".to_string()),
        };

        let resp = handle_update_profile(&service, attempt(Some("wrong")), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let resp = handle_update_profile(&service, attempt(Some("secret123")), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let stored = campus
            .storage
            .get_user_by_id(campus.teacher.id)
            .await
            .unwrap()
            .unwrap();
        assert!(verify_password("newpass2025", &stored.password_hash));
    }
}
