//! 测试用的脚本化 LLM

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::StreamExt;

use super::{ChatMessage, ChatOptions, ChunkStream, LlmClient};
use crate::errors::{CampusError, Result};

/// 依次返回预设回复，用完后返回 `fallback`；记录收到的提示词
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String>>>,
    fallback: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self::new(Vec::new())
    }

    fn next(&self, prompt: String) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt);
        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return reply;
        }
        self.fallback
            .clone()
            .ok_or_else(|| CampusError::llm_unavailable("scripted llm exhausted"))
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

fn join(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn chat(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _options: &ChatOptions,
    ) -> Result<String> {
        self.next(join(messages))
    }

    async fn generate(
        &self,
        _model: &str,
        prompt: &str,
        _json_format: bool,
        _options: &ChatOptions,
    ) -> Result<String> {
        self.next(prompt.to_string())
    }

    async fn chat_stream(
        &self,
        _model: &str,
        messages: Vec<ChatMessage>,
        _options: &ChatOptions,
    ) -> Result<ChunkStream> {
        let reply = self.next(join(&messages))?;
        let chunks: Vec<Result<String>> = reply
            .split_inclusive(' ')
            .map(|s| Ok(s.to_string()))
            .collect();
        Ok(futures_util::stream::iter(chunks).boxed())
    }
}
