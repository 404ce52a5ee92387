//! 系统设置与健康检查

pub mod settings;
pub mod settings_cache;

pub use settings_cache::DynamicConfig;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::config::AppConfig;
use crate::models::{
    ApiResponse, AppStartTime,
    system::{
        requests::{BatchUpdateSettingsRequest, SettingAuditQuery, UpdateSettingRequest},
        responses::HealthResponse,
    },
};

define_service!(SystemService);

impl SystemService {
    pub(crate) fn get_config(&self) -> &AppConfig {
        AppConfig::get()
    }

    pub async fn get_settings(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        settings::get_settings(self, request).await
    }

    pub async fn get_admin_settings(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        settings::get_admin_settings(self, request).await
    }

    pub async fn get_setting(&self, request: &HttpRequest, key: &str) -> ActixResult<HttpResponse> {
        settings::get_setting(self, request, key).await
    }

    pub async fn update_setting(
        &self,
        request: &HttpRequest,
        key: &str,
        body: UpdateSettingRequest,
    ) -> ActixResult<HttpResponse> {
        settings::update_setting(self, request, key, body).await
    }

    pub async fn batch_update_settings(
        &self,
        request: &HttpRequest,
        body: BatchUpdateSettingsRequest,
    ) -> ActixResult<HttpResponse> {
        settings::batch_update_settings(self, request, body).await
    }

    pub async fn get_setting_audits(
        &self,
        request: &HttpRequest,
        query: SettingAuditQuery,
    ) -> ActixResult<HttpResponse> {
        settings::get_setting_audits(self, request, query).await
    }

    /// 健康检查，返回版本与运行时长
    pub async fn health(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        let started_at = request
            .app_data::<web::Data<AppStartTime>>()
            .map(|t| t.start_datetime)
            .unwrap_or_else(chrono::Utc::now);
        let uptime = (chrono::Utc::now() - started_at).num_seconds().max(0);

        Ok(HttpResponse::Ok().json(ApiResponse::success(
            HealthResponse {
                status: "ok".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                uptime_seconds: uptime,
                started_at,
            },
            "Service is healthy",
        )))
    }
}
