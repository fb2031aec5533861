use clap::Parser;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the HTTP server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "0.0.0.0:8000")]
    pub server_addr: String,

    // --- Chat LLM Provider Args ---
    /// Type of LLM provider for chat completion (ollama, openai)
    #[arg(long, env = "CHAT_LLM_TYPE", default_value = "ollama")]
    pub chat_llm_type: String,

    /// Base URL for the Chat LLM provider API (e.g., http://localhost:11434 for Ollama)
    #[arg(long, env = "CHAT_BASE_URL")] // No default, let adapters handle defaults if None
    pub chat_base_url: Option<String>,

    /// API Key for the Chat LLM provider (only sent by the openai adapter)
    #[arg(long, env = "CHAT_API_KEY", default_value = "")]
    pub chat_api_key: String,

    /// Model name for chat completion, passed to the provider on every turn
    #[arg(long, env = "CHAT_MODEL", default_value = "WDOC")]
    pub chat_model: String,

    // --- Relay Args ---
    /// Assistant message the conversation log is seeded with at startup.
    #[arg(long, env = "GREETING", default_value = "How can I help you?")]
    pub greeting: String,

    /// Pause after each streamed fragment, in milliseconds. 0 only yields to the scheduler.
    #[arg(long, env = "FRAGMENT_DELAY_MS", default_value = "100")]
    pub fragment_delay_ms: u64,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Optional path to the TLS certificate file (PEM format) for enabling HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}

impl Args {
    pub fn fragment_delay(&self) -> Duration {
        Duration::from_millis(self.fragment_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_ollama_setup() {
        let args = Args::try_parse_from(["chat-relay"]).unwrap();
        assert_eq!(args.chat_llm_type, "ollama");
        assert_eq!(args.chat_model, "WDOC");
        assert_eq!(args.greeting, "How can I help you?");
        assert_eq!(args.fragment_delay(), Duration::from_millis(100));
        assert!(args.chat_base_url.is_none());
        assert!(!args.enable_tls);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "chat-relay",
            "--chat-llm-type",
            "openai",
            "--chat-model",
            "llama3",
            "--fragment-delay-ms",
            "0",
        ]).unwrap();
        assert_eq!(args.chat_llm_type, "openai");
        assert_eq!(args.chat_model, "llama3");
        assert_eq!(args.fragment_delay(), Duration::ZERO);
    }
}
