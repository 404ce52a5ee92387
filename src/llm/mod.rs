//! 本地 LLM 接入
//!
//! 业务代码只依赖 [`LlmClient`]，运行时注入 [`OllamaClient`]，测试中使用 `mock`。

#[cfg(test)]
pub mod mock;
pub mod ollama;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::errors::Result;

pub use ollama::OllamaClient;

/// 流式回复的文本片段
pub type ChunkStream = BoxStream<'static, Result<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChatOptions {
    pub temperature: f32,
}

impl ChatOptions {
    pub fn from_config() -> Self {
        Self {
            temperature: AppConfig::get().llm.temperature,
        }
    }
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self { temperature: 0.7 }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 多轮对话，返回完整回复
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String>;

    /// 单轮补全，`json_format` 要求模型输出 JSON
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        json_format: bool,
        options: &ChatOptions,
    ) -> Result<String>;

    /// 多轮对话，逐段返回回复
    async fn chat_stream(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        options: &ChatOptions,
    ) -> Result<ChunkStream>;
}

/// 去掉模型常见的 ```json 代码块包裹
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_chat_message_serializes_lowercase_role() {
        let json = serde_json::to_value(ChatMessage::system("hi")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "hi");
    }
}
