use chrono::Utc;
use serde::{ Serialize, Deserialize };
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: i64,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub user_input: String,
}

/// One line of a streamed chat response.
///
/// Serialized untagged, so a fragment goes over the wire as `{"text":"..."}`
/// and a failed turn ends with a single `{"error":"..."}` line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamRecord {
    Fragment {
        text: String,
    },
    Error {
        error: String,
    },
}

impl StreamRecord {
    pub fn fragment(text: impl Into<String>) -> Self {
        StreamRecord::Fragment { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        StreamRecord::Error { error: message.into() }
    }

    /// Compact JSON followed by the `\n` record delimiter.
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|e| {
            format!("{{\"error\":\"failed to encode stream record: {}\"}}", e)
        });
        line.push('\n');
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_line_is_compact_json_with_newline() {
        assert_eq!(StreamRecord::fragment(" there").to_line(), "{\"text\":\" there\"}\n");
    }

    #[test]
    fn fragment_line_escapes_embedded_newlines() {
        let line = StreamRecord::fragment("a\nb").to_line();
        assert_eq!(line, "{\"text\":\"a\\nb\"}\n");
        assert_eq!(line.matches('\n').count(), 1);
    }

    #[test]
    fn error_record_uses_error_key() {
        assert_eq!(StreamRecord::error("boom").to_line(), "{\"error\":\"boom\"}\n");
    }

    #[test]
    fn role_serializes_lowercase() {
        let msg = ChatMessage::assistant("How can I help you?");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], "How can I help you?");
    }

    #[test]
    fn chat_request_requires_user_input() {
        assert!(serde_json::from_str::<ChatRequest>("{}").is_err());
        let req: ChatRequest = serde_json::from_str("{\"user_input\":\"hello\"}").unwrap();
        assert_eq!(req.user_input, "hello");
    }
}
