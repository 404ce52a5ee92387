//! JWT 签发与校验
//!
//! Access Token 放在 Authorization 头，Refresh Token 只通过 HttpOnly cookie 传递。

use crate::config::AppConfig;
use actix_web::cookie::{Cookie, SameSite};
use jsonwebtoken::errors::{Error as JwtError, ErrorKind};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub token_type: TokenKind,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct JwtUtils;

impl JwtUtils {
    fn secret() -> &'static str {
        &AppConfig::get().jwt.secret
    }

    /// 签发指定类型与有效期的 token
    pub fn issue(
        user_id: i64,
        role: &str,
        kind: TokenKind,
        ttl: chrono::Duration,
    ) -> Result<String, JwtError> {
        Self::issue_with_secret(user_id, role, kind, ttl, Self::secret())
    }

    fn issue_with_secret(
        user_id: i64,
        role: &str,
        kind: TokenKind,
        ttl: chrono::Duration,
        secret: &str,
    ) -> Result<String, JwtError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            role: role.to_string(),
            token_type: kind,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    pub fn generate_token_pair(
        user_id: i64,
        role: &str,
        access_ttl: chrono::Duration,
        refresh_ttl: chrono::Duration,
    ) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: Self::issue(user_id, role, TokenKind::Access, access_ttl)?,
            refresh_token: Self::issue(user_id, role, TokenKind::Refresh, refresh_ttl)?,
        })
    }

    /// 校验签名、有效期与 token 类型
    pub fn verify(token: &str, expected: TokenKind) -> Result<Claims, JwtError> {
        Self::verify_with_secret(token, expected, Self::secret())
    }

    fn verify_with_secret(
        token: &str,
        expected: TokenKind,
        secret: &str,
    ) -> Result<Claims, JwtError> {
        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?
        .claims;
        if claims.token_type != expected {
            return Err(JwtError::from(ErrorKind::InvalidToken));
        }
        Ok(claims)
    }

    pub fn verify_access_token(token: &str) -> Result<Claims, JwtError> {
        Self::verify(token, TokenKind::Access)
    }

    /// 用 Refresh Token 换取新的 Access Token
    pub fn refresh_access_token(
        refresh_token: &str,
        access_ttl: chrono::Duration,
    ) -> Result<String, JwtError> {
        let claims = Self::verify(refresh_token, TokenKind::Refresh)?;
        let user_id = claims.user_id().ok_or(ErrorKind::InvalidToken)?;
        Self::issue(user_id, &claims.role, TokenKind::Access, access_ttl)
    }

    pub fn create_refresh_token_cookie(
        refresh_token: &str,
        max_age: chrono::Duration,
    ) -> Cookie<'static> {
        Cookie::build(REFRESH_COOKIE, refresh_token.to_string())
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(
                max_age.num_seconds(),
            ))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(AppConfig::get().is_production())
            .finish()
    }

    /// 注销时用于覆盖的空 cookie
    pub fn create_empty_refresh_token_cookie() -> Cookie<'static> {
        Cookie::build(REFRESH_COOKIE, "")
            .path("/")
            .max_age(actix_web::cookie::time::Duration::seconds(0))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(AppConfig::get().is_production())
            .finish()
    }

    pub fn extract_refresh_token_from_cookie(req: &actix_web::HttpRequest) -> Option<String> {
        req.cookie(REFRESH_COOKIE)
            .map(|cookie| cookie.value().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_issue_and_verify() {
        let token = JwtUtils::issue_with_secret(
            7,
            "teacher",
            TokenKind::Access,
            chrono::Duration::minutes(5),
            SECRET,
        )
        .unwrap();
        let claims = JwtUtils::verify_with_secret(&token, TokenKind::Access, SECRET).unwrap();
        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.role, "teacher");
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let token = JwtUtils::issue_with_secret(
            7,
            "student",
            TokenKind::Refresh,
            chrono::Duration::days(1),
            SECRET,
        )
        .unwrap();
        assert!(JwtUtils::verify_with_secret(&token, TokenKind::Access, SECRET).is_err());
        assert!(JwtUtils::verify_with_secret(&token, TokenKind::Refresh, "other").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = JwtUtils::issue_with_secret(
            1,
            "admin",
            TokenKind::Access,
            chrono::Duration::minutes(-10),
            SECRET,
        )
        .unwrap();
        assert!(JwtUtils::verify_with_secret(&token, TokenKind::Access, SECRET).is_err());
    }
}
