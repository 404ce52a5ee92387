use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::AppConfig;

/// 配置值类型，数据库中以 snake_case 字符串保存
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub enum SettingValueType {
    String,
    Integer,
    Boolean,
    JsonArray,
}

impl SettingValueType {
    const ALL: [SettingValueType; 4] = [
        SettingValueType::String,
        SettingValueType::Integer,
        SettingValueType::Boolean,
        SettingValueType::JsonArray,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingValueType::String => "string",
            SettingValueType::Integer => "integer",
            SettingValueType::Boolean => "boolean",
            SettingValueType::JsonArray => "json_array",
        }
    }
}

impl std::fmt::Display for SettingValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SettingValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Invalid setting value type: {s}"))
    }
}

/// 可在线调整的配置项；缺失的配置项在启动时按默认值补齐
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownSettingKey {
    SystemName,
    AccessTokenExpiry,
    RefreshTokenExpiry,
    RefreshTokenRememberMeExpiry,
    UploadMaxSize,
    UploadAllowedTypes,
    AttendanceMinimumPercentage,
    ChatHistoryWindow,
    MaxPastQuestions,
}

impl KnownSettingKey {
    pub const ALL: [KnownSettingKey; 9] = [
        KnownSettingKey::SystemName,
        KnownSettingKey::AccessTokenExpiry,
        KnownSettingKey::RefreshTokenExpiry,
        KnownSettingKey::RefreshTokenRememberMeExpiry,
        KnownSettingKey::UploadMaxSize,
        KnownSettingKey::UploadAllowedTypes,
        KnownSettingKey::AttendanceMinimumPercentage,
        KnownSettingKey::ChatHistoryWindow,
        KnownSettingKey::MaxPastQuestions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            KnownSettingKey::SystemName => "app.system_name",
            KnownSettingKey::AccessTokenExpiry => "jwt.access_token_expiry",
            KnownSettingKey::RefreshTokenExpiry => "jwt.refresh_token_expiry",
            KnownSettingKey::RefreshTokenRememberMeExpiry => "jwt.refresh_token_remember_me_expiry",
            KnownSettingKey::UploadMaxSize => "upload.max_size",
            KnownSettingKey::UploadAllowedTypes => "upload.allowed_types",
            KnownSettingKey::AttendanceMinimumPercentage => "attendance.minimum_percentage",
            KnownSettingKey::ChatHistoryWindow => "chat.history_window",
            KnownSettingKey::MaxPastQuestions => "question_paper.max_past_questions",
        }
    }

    pub fn value_type(self) -> SettingValueType {
        match self {
            KnownSettingKey::SystemName => SettingValueType::String,
            KnownSettingKey::UploadAllowedTypes => SettingValueType::JsonArray,
            _ => SettingValueType::Integer,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            KnownSettingKey::SystemName => "System name shown to clients",
            KnownSettingKey::AccessTokenExpiry => "Access token lifetime (minutes)",
            KnownSettingKey::RefreshTokenExpiry => "Refresh token lifetime (days)",
            KnownSettingKey::RefreshTokenRememberMeExpiry => {
                "Refresh token lifetime with remember-me (days)"
            }
            KnownSettingKey::UploadMaxSize => "Maximum upload size (bytes)",
            KnownSettingKey::UploadAllowedTypes => "Allowed upload file extensions",
            KnownSettingKey::AttendanceMinimumPercentage => {
                "Attendance percentage below which a student is flagged"
            }
            KnownSettingKey::ChatHistoryWindow => "Messages of context kept by the assistant",
            KnownSettingKey::MaxPastQuestions => {
                "Past questions listed as avoid-list when generating a paper"
            }
        }
    }

    /// 默认值：与静态配置对应的项取配置文件的值，其余为内置常量
    pub fn default_value(self, config: &AppConfig) -> String {
        match self {
            KnownSettingKey::SystemName => config.app.system_name.clone(),
            KnownSettingKey::AccessTokenExpiry => config.jwt.access_token_expiry.to_string(),
            KnownSettingKey::RefreshTokenExpiry => config.jwt.refresh_token_expiry.to_string(),
            KnownSettingKey::RefreshTokenRememberMeExpiry => {
                config.jwt.refresh_token_remember_me_expiry.to_string()
            }
            KnownSettingKey::UploadMaxSize => config.upload.max_size.to_string(),
            KnownSettingKey::UploadAllowedTypes => {
                serde_json::to_string(&config.upload.allowed_types).unwrap_or_else(|_| "[]".into())
            }
            KnownSettingKey::AttendanceMinimumPercentage => "75".to_string(),
            KnownSettingKey::ChatHistoryWindow => "10".to_string(),
            KnownSettingKey::MaxPastQuestions => "15".to_string(),
        }
    }
}

impl std::str::FromStr for KnownSettingKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown setting key: {s}"))
    }
}

/// 启动时补齐的配置项
#[derive(Debug, Clone)]
pub struct SettingDefault {
    pub key: &'static str,
    pub value: String,
    pub value_type: SettingValueType,
    pub description: &'static str,
}

impl SettingDefault {
    pub fn all(config: &AppConfig) -> Vec<Self> {
        KnownSettingKey::ALL
            .into_iter()
            .map(|k| Self {
                key: k.as_str(),
                value: k.default_value(config),
                value_type: k.value_type(),
                description: k.description(),
            })
            .collect()
    }
}

/// 系统设置实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct SystemSetting {
    pub key: String,
    pub value: String,
    pub value_type: SettingValueType,
    pub description: Option<String>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub updated_by: Option<i64>,
}

/// 设置审计日志实体
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/system.ts")]
pub struct SettingAudit {
    pub id: i64,
    pub setting_key: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub changed_by: i64,
    pub changed_at: chrono::DateTime<chrono::Utc>,
    pub ip_address: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_keys_parse_back() {
        for key in KnownSettingKey::ALL {
            let parsed: KnownSettingKey = key.as_str().parse().expect("known key parses");
            assert_eq!(parsed, key);
        }
        assert!("cors.max_age".parse::<KnownSettingKey>().is_err());
    }

    #[test]
    fn test_value_type_round_trips_through_storage_text() {
        assert_eq!("json_array".parse(), Ok(SettingValueType::JsonArray));
        assert_eq!(SettingValueType::Integer.to_string(), "integer");
        assert!("float".parse::<SettingValueType>().is_err());
    }

    #[test]
    fn test_academic_settings_are_integers() {
        assert_eq!(
            KnownSettingKey::ChatHistoryWindow.value_type(),
            SettingValueType::Integer
        );
        assert_eq!(
            KnownSettingKey::UploadAllowedTypes.value_type(),
            SettingValueType::JsonArray
        );
    }
}
