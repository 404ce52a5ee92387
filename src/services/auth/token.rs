use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use crate::models::auth::responses::RefreshTokenResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::system::DynamicConfig;
use crate::utils::jwt::JwtUtils;

pub async fn handle_refresh_token(request: &HttpRequest) -> ActixResult<HttpResponse> {
    let Some(refresh_token) = JwtUtils::extract_refresh_token_from_cookie(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )));
    };

    let expiry_minutes = DynamicConfig::access_token_expiry().await;
    match JwtUtils::refresh_access_token(&refresh_token, chrono::Duration::minutes(expiry_minutes))
    {
        Ok(access_token) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RefreshTokenResponse {
                access_token,
                expires_in: expiry_minutes * 60,
            },
            "Token refreshed successfully",
        ))),
        Err(e) => {
            tracing::info!("Refresh token rejected: {}", e);

            // 清除无效的 refresh token cookie
            Ok(HttpResponse::Unauthorized()
                .cookie(JwtUtils::create_empty_refresh_token_cookie())
                .json(ApiResponse::error_empty(
                    ErrorCode::Unauthorized,
                    "Login expired or invalid, please login again",
                )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::{REFRESH_COOKIE, TokenKind};
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;

    #[tokio::test]
    async fn test_refresh_with_valid_cookie() {
        let refresh =
            JwtUtils::issue(3, "student", TokenKind::Refresh, chrono::Duration::days(1)).unwrap();
        let req = TestRequest::default()
            .cookie(Cookie::new(REFRESH_COOKIE, refresh))
            .to_http_request();

        let resp = handle_refresh_token(&req).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let access =
            JwtUtils::issue(3, "student", TokenKind::Access, chrono::Duration::days(1)).unwrap();
        let req = TestRequest::default()
            .cookie(Cookie::new(REFRESH_COOKIE, access))
            .to_http_request();

        let resp = handle_refresh_token(&req).await.unwrap();
        assert_eq!(resp.status(), 401);

        let missing = handle_refresh_token(&TestRequest::default().to_http_request())
            .await
            .unwrap();
        assert_eq!(missing.status(), 401);
    }
}
