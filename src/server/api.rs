use crate::models::chat::ChatRequest;
use crate::relay::{ ChatRelay, RelayError };
use std::convert::Infallible;
use axum::{
    routing::{ get, post },
    Router,
    Json,
    body::Body,
    extract::{ State, rejection::JsonRejection },
    response::{ IntoResponse, Response },
    http::header,
};
use futures::StreamExt;
use serde_json::json;
use tower_http::cors::{ Any, CorsLayer };
use log::debug;

#[derive(Clone)]
struct AppState {
    relay: ChatRelay,
}

/// `POST /chat`, `GET /history` and `GET /health`, open to every origin.
pub fn router(relay: ChatRelay) -> Router {
    let app_state = AppState { relay };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", post(chat_handler))
        .route("/history", get(history_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(app_state)
}

/// Streams one turn as newline-delimited JSON records. The content type stays
/// `application/json` for compatibility with existing clients.
async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, RelayError> {
    let Json(req) = payload.map_err(|e| RelayError::InvalidInput(e.body_text()))?;
    debug!("POST /chat ({} bytes)", req.user_input.len());

    let records = state.relay.start_turn(req.user_input).await?;
    let body = Body::from_stream(records.map(|record| Ok::<_, Infallible>(record.to_line())));

    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}

async fn history_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.relay.history().snapshot().await)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let client = state.relay.client();
    Json(json!({
        "status": "ok",
        "provider": client.llm_type().to_string(),
        "model": client.model(),
    }))
}
