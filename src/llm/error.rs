use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request to inference server failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference server returned HTTP {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("inference server reported an error: {0}")]
    Upstream(String),

    #[error("failed to decode inference stream: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("inference stream line exceeded {0} bytes without a newline")]
    LineTooLong(usize),

    #[error("configuration error: {0}")]
    Config(String),
}
