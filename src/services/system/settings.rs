use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{DynamicConfig, SystemService};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    system::{
        entities::{KnownSettingKey, SettingValueType},
        requests::{BatchUpdateSettingsRequest, SettingAuditQuery, UpdateSettingRequest},
        responses::{AdminSettingsListResponse, SettingResponse, SystemSettingsResponse},
    },
};
use crate::services::{error_response, unauthorized};

/// 校验配置值与配置键的类型是否匹配
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    let known: KnownSettingKey = key.parse()?;
    let value = value.trim();
    match known.value_type() {
        SettingValueType::String if value.is_empty() => Err(format!("{key} cannot be empty")),
        SettingValueType::String => Ok(()),
        SettingValueType::Integer => {
            let parsed: i64 = value
                .parse()
                .map_err(|_| format!("{key} must be an integer"))?;
            match known {
                KnownSettingKey::AttendanceMinimumPercentage if !(0..=100).contains(&parsed) => {
                    Err(format!("{key} must be between 0 and 100"))
                }
                KnownSettingKey::AttendanceMinimumPercentage => Ok(()),
                _ if parsed <= 0 => Err(format!("{key} must be positive")),
                _ => Ok(()),
            }
        }
        SettingValueType::Boolean => match value {
            "true" | "false" => Ok(()),
            _ => Err(format!("{key} must be true or false")),
        },
        SettingValueType::JsonArray => serde_json::from_str::<Vec<String>>(value)
            .map(|_| ())
            .map_err(|_| format!("{key} must be a JSON array of strings")),
    }
}

fn invalid_setting(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message))
}

fn client_ip(req: &HttpRequest) -> Option<String> {
    req.connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string())
}

/// 获取公开系统设置（只读）
pub async fn get_settings(
    service: &SystemService,
    _req: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let config = service.get_config();

    let response = SystemSettingsResponse {
        system_name: DynamicConfig::system_name().await,
        max_file_size: DynamicConfig::upload_max_size().await as u64,
        allowed_file_types: DynamicConfig::upload_allowed_types().await,
        environment: config.app.environment.clone(),
        log_level: config.app.log_level.clone(),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Settings retrieved successfully",
    )))
}

/// 获取所有管理员配置
pub async fn get_admin_settings(
    service: &SystemService,
    req: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(req);
    match storage.list_all_settings().await {
        Ok(settings) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            AdminSettingsListResponse { settings },
            "Admin settings retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, "获取配置列表失败")),
    }
}

pub async fn get_setting(
    service: &SystemService,
    req: &HttpRequest,
    key: &str,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(req);
    match storage.get_setting_by_key(key).await {
        Ok(Some(setting)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            SettingResponse { setting },
            "Setting retrieved successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::NotFound,
            format!("Setting {key} not found"),
        ))),
        Err(e) => Ok(error_response(&e, "获取配置失败")),
    }
}

/// 更新单个配置，写审计日志并刷新缓存
pub async fn update_setting(
    service: &SystemService,
    req: &HttpRequest,
    key: &str,
    body: UpdateSettingRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(req) else {
        return Ok(unauthorized());
    };
    if let Err(message) = validate_setting(key, &body.value) {
        return Ok(invalid_setting(message));
    }
    let value = body.value.trim();

    let storage = service.get_storage(req);
    let setting = match storage
        .update_setting(key, value, user_id, client_ip(req))
        .await
    {
        Ok(s) => s,
        Err(e) => return Ok(error_response(&e, "更新配置失败")),
    };

    DynamicConfig::update(key, value).await;
    tracing::info!("Setting {} updated by user {}", key, user_id);

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        SettingResponse { setting },
        "Setting updated successfully",
    )))
}

/// 批量更新，任一项校验失败则全部不生效
pub async fn batch_update_settings(
    service: &SystemService,
    req: &HttpRequest,
    body: BatchUpdateSettingsRequest,
) -> ActixResult<HttpResponse> {
    let Some(user_id) = RequireJWT::extract_user_id(req) else {
        return Ok(unauthorized());
    };
    let mut updates = Vec::with_capacity(body.settings.len());
    for item in body.settings {
        if let Err(message) = validate_setting(&item.key, &item.value) {
            return Ok(invalid_setting(message));
        }
        updates.push((item.key, item.value.trim().to_string()));
    }

    let storage = service.get_storage(req);
    let settings = match storage
        .batch_update_settings(updates.clone(), user_id, client_ip(req))
        .await
    {
        Ok(s) => s,
        Err(e) => return Ok(error_response(&e, "批量更新配置失败")),
    };
    for (key, value) in &updates {
        DynamicConfig::update(key, value).await;
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        AdminSettingsListResponse { settings },
        "Settings updated successfully",
    )))
}

/// 获取审计日志
pub async fn get_setting_audits(
    service: &SystemService,
    req: &HttpRequest,
    query: SettingAuditQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(req);
    match storage.list_setting_audits(query).await {
        Ok(audits) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            audits,
            "Setting audits retrieved successfully",
        ))),
        Err(e) => Ok(error_response(&e, "获取审计日志失败")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{body_json, campus, request_as};

    #[test]
    fn test_validate_setting() {
        assert!(validate_setting("chat.history_window", "20").is_ok());
        assert!(validate_setting("chat.history_window", "0").is_err());
        assert!(validate_setting("chat.history_window", "ten").is_err());
        assert!(validate_setting("attendance.minimum_percentage", "0").is_ok());
        assert!(validate_setting("attendance.minimum_percentage", "120").is_err());
        assert!(validate_setting("upload.allowed_types", r#"[".pdf"]"#).is_ok());
        assert!(validate_setting("upload.allowed_types", ".pdf").is_err());
        assert!(validate_setting("app.system_name", "  ").is_err());
        assert!(validate_setting("cors.max_age", "60").is_err());
    }

    #[tokio::test]
    async fn test_update_setting_writes_audit() {
        let campus = campus().await;
        let service = SystemService::with_deps(campus.storage.clone(), None);
        let req = request_as(&campus.admin);

        let resp = service
            .update_setting(
                &req,
                "question_paper.max_past_questions",
                UpdateSettingRequest {
                    value: "12".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let resp = service
            .update_setting(
                &req,
                "question_paper.max_past_questions",
                UpdateSettingRequest {
                    value: "-3".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let body = body_json(
            service
                .get_setting(&req, "question_paper.max_past_questions")
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["data"]["setting"]["value"], "12");

        let body = body_json(
            service
                .get_setting_audits(
                    &req,
                    SettingAuditQuery {
                        key: Some("question_paper.max_past_questions".to_string()),
                        page: None,
                        size: None,
                    },
                )
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["data"]["audits"][0]["new_value"], "12");
        assert_eq!(body["data"]["audits"][0]["changed_by"], campus.admin.id);
    }
}
