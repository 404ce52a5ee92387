use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::{
    ApiResponse, ErrorCode,
    auth::{LoginRequest, LoginResponse},
    users::entities::UserStatus,
};
use crate::services::system::DynamicConfig;
use crate::utils::jwt::JwtUtils;
use crate::utils::password::verify_password;

use super::AuthService;

pub async fn handle_login(
    service: &AuthService,
    login_request: LoginRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    // 1. 根据用户名或邮箱获取用户
    let user = match storage
        .get_user_by_username_or_email(login_request.username.trim())
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                ErrorCode::AuthFailed,
                "Username or password is incorrect",
            )));
        }
        Err(e) => {
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    format!("Login failed: {e}"),
                )),
            );
        }
    };

    // 2. 验证密码
    if !verify_password(&login_request.password, &user.password_hash) {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::AuthFailed,
            "Username or password is incorrect",
        )));
    }

    // 3. 非活跃账号不允许登录
    if user.status != UserStatus::Active {
        tracing::info!("User {} rejected: status {}", user.username, user.status);
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::UserInactive,
            format!("Account is {}", user.status),
        )));
    }

    // 4. 更新最后登录时间
    if let Err(e) = storage.update_last_login(user.id).await {
        tracing::warn!("Failed to update last login for {}: {}", user.id, e);
    }

    // 5. 生成令牌对
    let (token_pair, refresh_ttl) = match user.generate_token_pair(login_request.remember_me).await
    {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!("Failed to generate JWT token: {}", e);
            return Ok(
                HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::InternalServerError,
                    "Login failed, unable to generate token",
                )),
            );
        }
    };

    tracing::info!("User {} logged in successfully", user.username);

    let response = LoginResponse {
        access_token: token_pair.access_token,
        expires_in: DynamicConfig::access_token_expiry().await * 60,
        user,
        created_at: chrono::Utc::now(),
    };

    let refresh_cookie =
        JwtUtils::create_refresh_token_cookie(&token_pair.refresh_token, refresh_ttl);

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie)
        .json(ApiResponse::success(response, "Login successful")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{body_json, campus};
    use actix_web::test::TestRequest;

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            remember_me: false,
        }
    }

    #[tokio::test]
    async fn test_login_sets_refresh_cookie() {
        let campus = campus().await;
        let service = AuthService::with_deps(campus.storage.clone(), None);
        let req = TestRequest::default().to_http_request();

        let resp = handle_login(&service, login("teacher1", "secret123"), &req)
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        assert!(
            resp.cookies()
                .any(|c| c.name() == crate::utils::jwt::REFRESH_COOKIE)
        );
        let body = body_json(resp).await;
        assert_eq!(body["data"]["user"]["username"], "teacher1");
        assert!(body["data"]["user"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn test_login_by_email_and_wrong_password() {
        let campus = campus().await;
        let service = AuthService::with_deps(campus.storage.clone(), None);
        let req = TestRequest::default().to_http_request();

        let ok = handle_login(&service, login("asha01@ktu.test", "secret123"), &req)
            .await
            .unwrap();
        assert_eq!(ok.status(), 200);

        let bad = handle_login(&service, login("asha01", "wrong-pass1"), &req)
            .await
            .unwrap();
        assert_eq!(bad.status(), 401);
        assert_eq!(body_json(bad).await["code"], ErrorCode::AuthFailed as i32);
    }
}
