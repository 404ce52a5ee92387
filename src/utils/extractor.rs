//! 路径参数安全提取器
//!
//! 路径中的 ID 必须是正整数，token 与配置键只允许有限字符集，
//! 校验失败时直接返回统一格式的 400 响应。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

/// 构造参数错误
pub fn bad_path_param(message: String) -> actix_web::Error {
    let response =
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, &message));
    InternalError::from_response(message, response).into()
}

/// 读取并解析正整数路径参数
pub fn parse_positive_i64(req: &HttpRequest, name: &str) -> Result<i64, actix_web::Error> {
    let raw = req
        .match_info()
        .get(name)
        .ok_or_else(|| bad_path_param(format!("缺少路径参数: {name}")))?;
    match raw.parse::<i64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(bad_path_param(format!("无效的路径参数 {name}: {raw}"))),
    }
}

/// 定义 i64 路径参数提取器
///
/// 生成的类型既可作为处理函数参数直接提取，也可放在 `web::Path<(A, B)>` 中反序列化。
#[macro_export]
macro_rules! define_safe_i64_extractor {
    ($name:ident, $param:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl actix_web::FromRequest for $name {
            type Error = actix_web::Error;
            type Future = std::future::Ready<Result<Self, Self::Error>>;

            fn from_request(
                req: &actix_web::HttpRequest,
                _payload: &mut actix_web::dev::Payload,
            ) -> Self::Future {
                std::future::ready(
                    $crate::utils::extractor::parse_positive_i64(req, $param).map($name),
                )
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let value = i64::deserialize(deserializer)?;
                if value <= 0 {
                    return Err(serde::de::Error::custom(format!(
                        "{} 必须为正整数",
                        $param
                    )));
                }
                Ok($name(value))
            }
        }
    };
}

define_safe_i64_extractor!(SafeIDI64, "id");
define_safe_i64_extractor!(SafeDepartmentIdI64, "department_id");
define_safe_i64_extractor!(SafeClassIdI64, "class_id");
define_safe_i64_extractor!(SafeStudentIdI64, "student_id");
define_safe_i64_extractor!(SafeCourseIdI64, "course_id");
define_safe_i64_extractor!(SafeAssignmentIdI64, "assignment_id");
define_safe_i64_extractor!(SafeSlotIdI64, "slot_id");
define_safe_i64_extractor!(SafeMaterialIdI64, "material_id");
define_safe_i64_extractor!(SafeTemplateIdI64, "template_id");
define_safe_i64_extractor!(SafePaperIdI64, "paper_id");
define_safe_i64_extractor!(SafeSessionIdI64, "session_id");

static FILE_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9-]{1,64}$").expect("Invalid file token regex"));

static SETTING_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9_]*(\.[a-z0-9_]+)*$").expect("Invalid setting key regex")
});

fn extract_matching(
    req: &HttpRequest,
    name: &str,
    re: &Regex,
    max_len: usize,
) -> Result<String, actix_web::Error> {
    let raw = req
        .match_info()
        .get(name)
        .ok_or_else(|| bad_path_param(format!("缺少路径参数: {name}")))?;
    if raw.len() > max_len || !re.is_match(raw) {
        return Err(bad_path_param(format!("无效的路径参数 {name}")));
    }
    Ok(raw.to_string())
}

/// 文件 token
#[derive(Debug, Clone)]
pub struct SafeFileToken(pub String);

impl FromRequest for SafeFileToken {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_matching(req, "file_token", &FILE_TOKEN_RE, 64).map(SafeFileToken))
    }
}

/// 系统配置键，形如 `app.system_name`
#[derive(Debug, Clone)]
pub struct SafeSettingKey(pub String);

impl FromRequest for SafeSettingKey {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(extract_matching(req, "key", &SETTING_KEY_RE, 128).map(SafeSettingKey))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_parse_positive_id() {
        let req = TestRequest::default().param("id", "42").to_http_request();
        assert_eq!(parse_positive_i64(&req, "id").unwrap(), 42);

        let req = TestRequest::default().param("id", "0").to_http_request();
        assert!(parse_positive_i64(&req, "id").is_err());

        let req = TestRequest::default().param("id", "abc").to_http_request();
        assert!(parse_positive_i64(&req, "id").is_err());
    }

    #[test]
    fn test_safe_id_deserialize() {
        let id: SafeCourseIdI64 = serde_json::from_str("7").unwrap();
        assert_eq!(id.0, 7);
        assert!(serde_json::from_str::<SafeCourseIdI64>("-1").is_err());
    }

    #[test]
    fn test_setting_key_pattern() {
        assert!(SETTING_KEY_RE.is_match("app.system_name"));
        assert!(SETTING_KEY_RE.is_match("question_paper.max_past_questions"));
        assert!(!SETTING_KEY_RE.is_match("../etc/passwd"));
        assert!(!SETTING_KEY_RE.is_match("App.Name"));
    }

    #[test]
    fn test_file_token_pattern() {
        assert!(FILE_TOKEN_RE.is_match("1718000000-9f1c2d3e-aaaa-bbbb-cccc-0123456789ab"));
        assert!(!FILE_TOKEN_RE.is_match("a/b"));
    }
}
