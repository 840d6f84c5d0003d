//! Completion gateway.
//!
//! Receives a transcript over HTTP, forwards it to the model service and
//! relays the reply. Each request is independent; the only shared state is
//! the backend handle.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ragchat_core::{ChatReply, ChatRequest, CompletionBackend, ErrorBody, ModelList};
use serde_json::json;
use tower_http::trace::TraceLayer;

pub const CHAT_FAILURE: &str = "Failed to get response from Ollama";
pub const MODELS_FAILURE: &str = "Failed to list models from Ollama";
pub const EMPTY_TRANSCRIPT: &str = "messages must not be empty";

/// State shared by all handlers
#[derive(Clone)]
pub struct GatewayState {
    backend: Arc<dyn CompletionBackend>,
}

impl GatewayState {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/api/chat", post(handle_chat))
        .route("/api/models", get(list_models))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

/// `POST /api/chat`
pub async fn handle_chat(
    State(state): State<GatewayState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if request.messages.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, EMPTY_TRANSCRIPT);
    }

    tracing::debug!(messages = request.messages.len(), "Forwarding transcript");
    match state.backend.complete(&request.messages).await {
        Ok(message) => Json(ChatReply { message }).into_response(),
        Err(e) => {
            tracing::error!("Error calling Ollama: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, CHAT_FAILURE)
        }
    }
}

/// `GET /api/models`
pub async fn list_models(State(state): State<GatewayState>) -> Response {
    match state.backend.list_models().await {
        Ok(models) => Json(ModelList { models }).into_response(),
        Err(e) => {
            tracing::error!("Error listing Ollama models: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, MODELS_FAILURE)
        }
    }
}

/// `GET /api/health`
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
