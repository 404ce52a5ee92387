//! 动态配置缓存
//!
//! 提供从数据库加载的动态配置的全局缓存访问。
//! 使用 RwLock 保护，支持热更新。

use std::collections::HashMap;
use std::sync::OnceLock;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::models::system::entities::KnownSettingKey;

/// 动态配置缓存
static DYNAMIC_CONFIG: OnceLock<RwLock<DynamicConfigCache>> = OnceLock::new();

/// 动态配置缓存内部结构
#[derive(Debug, Default)]
struct DynamicConfigCache {
    settings: HashMap<String, String>,
}

/// 动态配置访问接口
pub struct DynamicConfig;

impl DynamicConfig {
    /// 初始化动态配置缓存
    /// 在应用启动时调用，从数据库加载配置
    pub async fn init(settings: Vec<(String, String)>) {
        let cache = DYNAMIC_CONFIG.get_or_init(|| RwLock::new(DynamicConfigCache::default()));

        let mut guard = cache.write().await;
        guard.settings.clear();
        for (key, value) in settings {
            guard.settings.insert(key, value);
        }

        tracing::info!(
            "动态配置缓存初始化完成，加载了 {} 个配置项",
            guard.settings.len()
        );
    }

    /// 更新单个配置项
    pub async fn update(key: &str, value: &str) {
        if let Some(cache) = DYNAMIC_CONFIG.get() {
            let mut guard = cache.write().await;
            guard.settings.insert(key.to_string(), value.to_string());
            tracing::debug!("动态配置更新: {} = {}", key, value);
        }
    }

    /// 获取字符串配置
    async fn get_string(key: &str) -> Option<String> {
        if let Some(cache) = DYNAMIC_CONFIG.get() {
            let guard = cache.read().await;
            return guard.settings.get(key).cloned();
        }
        None
    }

    /// 取已知配置项；缓存缺失或值无法解析时使用默认值
    async fn known<T: std::str::FromStr>(key: KnownSettingKey) -> Option<T> {
        let cached = Self::get_string(key.as_str()).await;
        cached
            .and_then(|v| v.parse().ok())
            .or_else(|| key.default_value(AppConfig::get()).parse().ok())
    }

    pub async fn system_name() -> String {
        Self::get_string(KnownSettingKey::SystemName.as_str())
            .await
            .unwrap_or_else(|| AppConfig::get().app.system_name.clone())
    }

    /// Access Token 有效期（分钟）
    pub async fn access_token_expiry() -> i64 {
        Self::known(KnownSettingKey::AccessTokenExpiry)
            .await
            .unwrap_or(AppConfig::get().jwt.access_token_expiry)
    }

    /// Refresh Token 有效期（天）
    pub async fn refresh_token_expiry() -> i64 {
        Self::known(KnownSettingKey::RefreshTokenExpiry)
            .await
            .unwrap_or(AppConfig::get().jwt.refresh_token_expiry)
    }

    pub async fn refresh_token_remember_me_expiry() -> i64 {
        Self::known(KnownSettingKey::RefreshTokenRememberMeExpiry)
            .await
            .unwrap_or(AppConfig::get().jwt.refresh_token_remember_me_expiry)
    }

    /// 单文件上传上限（字节）
    pub async fn upload_max_size() -> usize {
        Self::known(KnownSettingKey::UploadMaxSize)
            .await
            .unwrap_or(AppConfig::get().upload.max_size)
    }

    pub async fn upload_allowed_types() -> Vec<String> {
        Self::get_string(KnownSettingKey::UploadAllowedTypes.as_str())
            .await
            .and_then(|v| serde_json::from_str(&v).ok())
            .unwrap_or_else(|| AppConfig::get().upload.allowed_types.clone())
    }

    /// 考勤预警线（百分比）
    pub async fn attendance_minimum_percentage() -> f64 {
        Self::known::<i64>(KnownSettingKey::AttendanceMinimumPercentage)
            .await
            .filter(|v| (0..=100).contains(v))
            .unwrap_or(75) as f64
    }

    /// 学业助手携带的历史消息条数
    pub async fn chat_history_window() -> usize {
        Self::known::<usize>(KnownSettingKey::ChatHistoryWindow)
            .await
            .filter(|v| *v > 0)
            .unwrap_or(10)
    }

    pub async fn max_past_questions() -> usize {
        Self::known(KnownSettingKey::MaxPastQuestions)
            .await
            .unwrap_or(15)
    }
}
