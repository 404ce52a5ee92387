//! Ollama HTTP 客户端

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ChatMessage, ChatOptions, ChunkStream, LlmClient};
use crate::config::LlmConfig;
use crate::errors::{CampusError, Result};

pub struct OllamaClient {
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            client,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout_secs)
    }

    fn map_send_error(&self, err: reqwest::Error) -> CampusError {
        if err.is_timeout() {
            CampusError::llm_timeout(format!(
                "No response from Ollama within {} seconds",
                self.timeout_secs
            ))
        } else if err.is_connect() {
            CampusError::llm_unavailable(format!(
                "Ollama not reachable at {}. Is it running? Start with: ollama serve",
                self.base_url
            ))
        } else {
            CampusError::llm_api(err.to_string())
        }
    }

    /// 发送请求并检查状态码
    async fn post<T: Serialize>(
        &self,
        path: &str,
        model: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status().as_u16();
        if status == 404 {
            return Err(CampusError::llm_model_not_found(format!(
                "Model '{model}' not found locally. Pull it with: ollama pull {model}"
            )));
        }
        if status >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(CampusError::llm_api(format!("status {status}: {body}")));
        }
        Ok(response)
    }
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// 流式响应中的一行
#[derive(Deserialize)]
struct StreamLine {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    error: Option<String>,
}

/// 解析一行 NDJSON，空行与空片段返回 None
fn parse_stream_line(line: &[u8]) -> Option<Result<String>> {
    let text = std::str::from_utf8(line).ok()?.trim();
    if text.is_empty() {
        return None;
    }
    match serde_json::from_str::<StreamLine>(text) {
        Ok(StreamLine {
            error: Some(error), ..
        }) => Some(Err(CampusError::llm_api(error))),
        Ok(StreamLine {
            message: Some(message),
            ..
        }) if !message.content.is_empty() => Some(Ok(message.content)),
        Ok(_) => None,
        Err(e) => Some(Err(CampusError::llm_response(format!(
            "failed to parse stream chunk: {e}"
        )))),
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    #[instrument(skip(self, messages, options), fields(model = %model))]
    async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String> {
        let body = ChatRequest {
            model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
            },
        };
        let response = self.post("/api/chat", model, &body).await?;
        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CampusError::llm_response(format!("failed to parse response: {e}")))?;
        debug!("chat 回复 {} 字符", parsed.message.content.len());
        Ok(parsed.message.content)
    }

    #[instrument(skip(self, prompt, options), fields(model = %model))]
    async fn generate(
        &self,
        model: &str,
        prompt: &str,
        json_format: bool,
        options: &ChatOptions,
    ) -> Result<String> {
        let body = GenerateRequest {
            model,
            prompt,
            stream: false,
            format: json_format.then_some("json"),
            options: OllamaOptions {
                temperature: options.temperature,
            },
        };
        let response = self.post("/api/generate", model, &body).await?;
        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| CampusError::llm_response(format!("failed to parse response: {e}")))?;
        Ok(parsed.response)
    }

    #[instrument(skip(self, messages, options), fields(model = %model))]
    async fn chat_stream(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        options: &ChatOptions,
    ) -> Result<ChunkStream> {
        let body = ChatRequest {
            model,
            messages: &messages,
            stream: true,
            options: OllamaOptions {
                temperature: options.temperature,
            },
        };
        let response = self.post("/api/chat", model, &body).await?;
        let bytes = response.bytes_stream().boxed();

        // 按换行切分，片段可能跨越多个网络块
        let stream = futures_util::stream::unfold(
            (bytes, Vec::<u8>::new(), false),
            |(mut bytes, mut buf, mut finished)| async move {
                loop {
                    if let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                        let line: Vec<u8> = buf.drain(..=pos).collect();
                        if let Some(item) = parse_stream_line(&line) {
                            return Some((item, (bytes, buf, finished)));
                        }
                        continue;
                    }
                    if finished {
                        let rest = std::mem::take(&mut buf);
                        return parse_stream_line(&rest).map(|item| (item, (bytes, buf, true)));
                    }
                    match bytes.next().await {
                        Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                        Some(Err(e)) => {
                            return Some((Err(CampusError::from(e)), (bytes, Vec::new(), true)));
                        }
                        None => finished = true,
                    }
                }
            },
        );

        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OllamaClient {
        OllamaClient::new(&server.uri(), 5).unwrap()
    }

    #[tokio::test]
    async fn chat_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({"model": "llama3", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3",
                "message": {"role": "assistant", "content": "Hello there"},
                "done": true
            })))
            .mount(&server)
            .await;

        let reply = client(&server)
            .chat("llama3", &[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap();
        assert_eq!(reply, "Hello there");
    }

    #[tokio::test]
    async fn generate_requests_json_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({"format": "json"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "{\"query_type\":\"timetable\"}",
                "done": true
            })))
            .mount(&server)
            .await;

        let reply = client(&server)
            .generate("llama3", "classify", true, &ChatOptions::default())
            .await
            .unwrap();
        assert!(reply.contains("timetable"));
    }

    #[tokio::test]
    async fn unknown_model_maps_to_model_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let err = client(&server)
            .chat("missing", &[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CampusError::LlmModelNotFound(_)));
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server)
            .generate("llama3", "x", false, &ChatOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CampusError::LlmApi(ref m) if m.contains("500")));
    }

    #[tokio::test]
    async fn malformed_body_maps_to_response_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server)
            .chat("llama3", &[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CampusError::LlmResponse(_)));
    }

    #[tokio::test]
    async fn unreachable_server_maps_to_unavailable() {
        let client = OllamaClient::new("http://127.0.0.1:9", 2).unwrap();
        let err = client
            .chat("llama3", &[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CampusError::LlmUnavailable(_) | CampusError::LlmTimeout(_)
        ));
    }

    #[tokio::test]
    async fn chat_stream_yields_chunks_in_order() {
        let server = MockServer::start().await;
        let body = concat!(
            "{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"lo\"},\"done\":false}\n",
            "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n"
        );
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({"stream": true})))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let stream = client(&server)
            .chat_stream("llama3", vec![ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap();
        let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks, vec!["Hel".to_string(), "lo".to_string()]);
    }

    #[test]
    fn stream_line_with_error_field_is_an_error() {
        let item = parse_stream_line(b"{\"error\":\"model crashed\"}").unwrap();
        assert!(item.is_err());
        assert!(parse_stream_line(b"   ").is_none());
    }
}
