//! Errors a chat turn can fail with before its response stream starts.
//!
//! Once the stream is open, failures travel in-band as a terminal
//! `{"error": ...}` record instead.

use axum::http::StatusCode;
use axum::response::{ IntoResponse, Response };
use axum::Json;
use log::error;
use serde_json::json;
use thiserror::Error;
use crate::llm::LlmError;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Malformed body or empty `user_input`. The log is left untouched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The inference server could not be reached or refused the request.
    #[error("inference unavailable: {0}")]
    Upstream(#[from] LlmError),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            RelayError::InvalidInput(m) => (StatusCode::BAD_REQUEST, m.clone()),
            RelayError::Upstream(e) => {
                error!("Inference request failed: {}", e);
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
