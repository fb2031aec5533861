pub mod chat;
pub mod error;

pub use error::LlmError;

use serde::{ Deserialize, Serialize };
use std::str::FromStr;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    Ollama,
    OpenAI,
}

impl fmt::Display for LlmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmType::Ollama => write!(f, "ollama"),
            LlmType::OpenAI => write!(f, "openai"),
        }
    }
}

impl FromStr for LlmType {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(LlmType::Ollama),
            "openai" => Ok(LlmType::OpenAI),
            _ => Err(LlmError::Config(format!("Unsupported LLM type: '{}'", s))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    pub api_key: Option<String>,
    pub completion_model: Option<String>,
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            llm_type: LlmType::Ollama,
            api_key: None,
            completion_model: None,
            base_url: None,
        }
    }
}

/// Checks that a configured base URL is an absolute http(s) URL and returns it
/// without a trailing slash, ready for route concatenation.
pub fn normalize_base_url(raw: &str) -> Result<String, LlmError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| LlmError::Config(format!("Invalid base URL '{}': {}", raw, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        other => Err(LlmError::Config(format!("Unsupported URL scheme '{}' in '{}'", other, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_types_case_insensitively() {
        assert_eq!("Ollama".parse::<LlmType>().unwrap(), LlmType::Ollama);
        assert_eq!(" openai ".parse::<LlmType>().unwrap(), LlmType::OpenAI);
        assert!("gemini".parse::<LlmType>().is_err());
    }

    #[test]
    fn base_url_loses_trailing_slash() {
        assert_eq!(normalize_base_url("http://localhost:11434/").unwrap(), "http://localhost:11434");
    }

    #[test]
    fn base_url_rejects_non_http() {
        assert!(normalize_base_url("ftp://example.com").is_err());
        assert!(normalize_base_url("localhost:11434").is_err());
    }
}
