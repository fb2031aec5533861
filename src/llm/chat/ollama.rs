use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{ Deserialize, Serialize };
use super::{ http_stream_generate, wire_messages, ChatClient, FragmentStream, LineEvent, WireMessage };
use crate::llm::{ normalize_base_url, LlmConfig, LlmError, LlmType };
use crate::models::chat::ChatMessage;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "WDOC";

#[derive(Debug)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    completion_model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize, Default)]
struct StreamMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct StreamResponse {
    #[serde(default)]
    message: Option<StreamMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, completion_model: Option<String>) -> Result<Self, LlmError> {
        let model = completion_model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let url = normalize_base_url(base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;

        Ok(Self {
            http: HttpClient::new(),
            base_url: url,
            completion_model: model,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.llm_type != LlmType::Ollama {
            return Err(LlmError::Config("Invalid config type for OllamaClient".into()));
        }

        Self::new(config.base_url.clone(), config.completion_model.clone())
    }
}

/// One line of `/api/chat` output: `{"message":{"content":".."},"done":false}`.
/// The closing line carries `done: true`; its content, if any, is the last
/// fragment of the reply.
pub fn parse_chat_line(line: &str) -> Result<LineEvent, LlmError> {
    let resp: StreamResponse = serde_json::from_str(line)?;
    if let Some(error) = resp.error {
        return Err(LlmError::Upstream(error));
    }
    let content = resp.message.unwrap_or_default().content;
    match (content.is_empty(), resp.done) {
        (true, true) => Ok(LineEvent::Done),
        (true, false) => Ok(LineEvent::Skip),
        (false, true) => Ok(LineEvent::FinalFragment(content)),
        (false, false) => Ok(LineEvent::Fragment(content)),
    }
}

#[async_trait]
impl ChatClient for OllamaClient {
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<FragmentStream, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let req = ChatRequest {
            model: &self.completion_model,
            messages: wire_messages(messages),
            stream: true,
        };
        http_stream_generate(&self.http, &url, &req, parse_chat_line, None).await
    }

    fn model(&self) -> &str {
        &self.completion_model
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn llm_type(&self) -> LlmType {
        LlmType::Ollama
    }
}
