use async_trait::async_trait;
use reqwest::Client as HttpClient;
use reqwest::header::{ HeaderMap, HeaderValue, CONTENT_TYPE };
use serde::{ Deserialize, Serialize };

use super::{ http_stream_generate, wire_messages, ChatClient, FragmentStream, LineEvent, WireMessage };
use crate::llm::{ normalize_base_url, LlmConfig, LlmError, LlmType };
use crate::models::chat::ChatMessage;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Any server speaking the OpenAI chat-completions protocol (OpenAI itself,
/// vLLM, llama.cpp server, Ollama's `/v1` shim).
pub struct OpenAIChatClient {
    http: HttpClient,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIStreamResponse {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
    #[serde(default)]
    error: Option<OpenAIErrorBody>,
}

#[derive(Deserialize)]
struct OpenAIStreamChoice {
    #[serde(default)]
    delta: OpenAIDelta,
}

#[derive(Deserialize, Default)]
struct OpenAIDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIErrorBody {
    message: String,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: Option<String>,
        model: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self, LlmError> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let api_url = normalize_base_url(base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: chat_model,
            base_url: api_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.llm_type != LlmType::OpenAI {
            return Err(LlmError::Config("Invalid config type for OpenAIChatClient".into()));
        }

        Self::new(
            config.api_key.clone(),
            config.completion_model.clone(),
            config.base_url.clone(),
        )
    }

    fn completions_url(&self) -> String {
        if self.base_url.ends_with("/chat/completions") {
            self.base_url.clone()
        } else if self.base_url.ends_with("/v1") {
            format!("{}/chat/completions", self.base_url)
        } else {
            format!("{}/v1/chat/completions", self.base_url)
        }
    }
}

/// One server-sent-event line: `data: {"choices":[{"delta":{"content":".."}}]}`,
/// terminated by `data: [DONE]`. Comments, `event:` lines and role-only
/// deltas are skipped.
pub fn parse_sse_line(line: &str) -> Result<LineEvent, LlmError> {
    let data = match line.strip_prefix("data:") {
        Some(data) => data.trim_start(),
        None => return Ok(LineEvent::Skip),
    };
    if data == "[DONE]" {
        return Ok(LineEvent::Done);
    }

    let resp: OpenAIStreamResponse = serde_json::from_str(data)?;
    if let Some(error) = resp.error {
        return Err(LlmError::Upstream(error.message));
    }
    let text: String = resp.choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .collect();
    if text.is_empty() {
        Ok(LineEvent::Skip)
    } else {
        Ok(LineEvent::Fragment(text))
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn stream_chat(&self, messages: &[ChatMessage]) -> Result<FragmentStream, LlmError> {
        let req = OpenAIChatRequest {
            model: &self.model,
            messages: wire_messages(messages),
            stream: true,
        };
        http_stream_generate(
            &self.http,
            &self.completions_url(),
            &req,
            parse_sse_line,
            self.api_key.as_deref(),
        ).await
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn llm_type(&self) -> LlmType {
        LlmType::OpenAI
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_content_is_a_fragment() {
        let line = r#"data: {"id":"c1","choices":[{"index":0,"delta":{"content":"Hi"},"finish_reason":null}]}"#;
        assert_eq!(parse_sse_line(line).unwrap(), LineEvent::Fragment("Hi".into()));
    }

    #[test]
    fn role_only_delta_is_skipped() {
        let line = r#"data: {"choices":[{"index":0,"delta":{"role":"assistant"}}]}"#;
        assert_eq!(parse_sse_line(line).unwrap(), LineEvent::Skip);
    }

    #[test]
    fn done_marker_ends_the_reply() {
        assert_eq!(parse_sse_line("data: [DONE]").unwrap(), LineEvent::Done);
    }

    #[test]
    fn non_data_lines_are_skipped() {
        assert_eq!(parse_sse_line(": keep-alive").unwrap(), LineEvent::Skip);
        assert_eq!(parse_sse_line("event: message").unwrap(), LineEvent::Skip);
    }

    #[test]
    fn error_payload_is_an_upstream_error() {
        let err = parse_sse_line(r#"data: {"error":{"message":"overloaded"}}"#).unwrap_err();
        assert!(matches!(err, LlmError::Upstream(ref m) if m == "overloaded"));
    }

    #[test]
    fn completions_url_accepts_common_base_forms() {
        let bare = OpenAIChatClient::new(None, None, Some("http://localhost:8080".into())).unwrap();
        assert_eq!(bare.completions_url(), "http://localhost:8080/v1/chat/completions");

        let versioned = OpenAIChatClient::new(None, None, Some("http://localhost:11434/v1/".into())).unwrap();
        assert_eq!(versioned.completions_url(), "http://localhost:11434/v1/chat/completions");

        let full = OpenAIChatClient::new(
            None,
            None,
            Some("http://host/v1/chat/completions".into()),
        ).unwrap();
        assert_eq!(full.completions_url(), "http://host/v1/chat/completions");
    }

    #[test]
    fn blank_api_key_is_dropped() {
        let client = OpenAIChatClient::new(Some("  ".into()), None, None).unwrap();
        assert!(client.api_key.is_none());
    }
}
