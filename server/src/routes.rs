//! HTTP surface: the chat endpoint plus a health probe.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::error;
use unifinder_generation::CompletionProvider;
use unifinder_retrieval::RetrievalEngine;

use crate::synthesis;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    /// Retrieval engine serving the knowledge store.
    pub engine: Arc<RetrievalEngine>,

    /// Provider used for final answer synthesis.
    pub generator: Arc<dyn CompletionProvider>,

    /// Maximum accepted chat message length in characters.
    pub max_message_len: usize,
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Incoming chat request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message. Missing means empty.
    #[serde(default)]
    pub message: String,
}

/// Outgoing chat reply body.
#[derive(Debug, Serialize)]
pub struct ChatReply {
    /// The synthesized answer.
    pub reply: String,
}

/// Generic failure response.
///
/// Infrastructure details stay in the logs; clients only ever see this.
#[derive(Debug)]
pub struct ApiError;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "failed to process the request" })),
        )
            .into_response()
    }
}

/// Answer one chat message.
async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    // Bound the message length before doing any work with it.
    let message: String = request
        .message
        .chars()
        .take(state.max_message_len)
        .collect();

    let context = state.engine.retrieve(&message).await.map_err(|err| {
        error!("retrieval failed: {err}");
        ApiError
    })?;

    let prompt = synthesis::build_prompt(&context, &message);
    let reply = state.generator.complete(&prompt).await.map_err(|err| {
        error!("answer synthesis failed: {err}");
        ApiError
    })?;

    Ok(Json(ChatReply { reply }))
}

/// Health body reported by `GET /health`.
#[derive(Debug, Serialize)]
struct HealthReply {
    status: &'static str,
    units: usize,
}

/// Report liveness and store size.
async fn health(State(state): State<AppState>) -> Json<HealthReply> {
    Json(HealthReply {
        status: "ok",
        units: state.engine.store_len().await,
    })
}
