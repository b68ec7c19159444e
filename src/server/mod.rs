//! HTTP endpoint for remote clients
//!
//! Exposes `POST /api/process-text`, forwarding each request to an
//! inference backend. This is the service [`crate::backend::HttpBackend`]
//! talks to.

use crate::backend::http::PROCESS_TEXT_PATH;
use crate::backend::wire::{from_chat_history, ErrorResponse, ProcessTextRequest, ProcessTextResponse};
use crate::backend::{BackendRequest, InferenceBackend, DEFAULT_PERSONA};
use crate::{InnerVoiceError, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

pub const MISSING_TEXT_ERROR: &str = "Text not found for processing.";
pub const GENERATION_ERROR: &str =
    "AI Error: Could not generate response. Check your Gemini API key.";

/// Shared state for the server
pub struct ServerState {
    pub backend: Arc<dyn InferenceBackend>,
}

/// Create the router
pub fn create_router(backend: Arc<dyn InferenceBackend>) -> Router {
    let state = Arc::new(ServerState { backend });
    Router::new()
        .route(PROCESS_TEXT_PATH, post(process_text))
        .with_state(state)
}

/// Serve on an already bound listener until the task is dropped
pub async fn serve(listener: TcpListener, backend: Arc<dyn InferenceBackend>) -> Result<()> {
    let addr = listener
        .local_addr()
        .map_err(|e| InnerVoiceError::Server(e.to_string()))?;
    info!("Inner Voice server running on http://{}", addr);

    axum::serve(listener, create_router(backend))
        .await
        .map_err(|e| InnerVoiceError::Server(e.to_string()))
}

/// Bind `addr` and serve
pub async fn run(addr: SocketAddr, backend: Arc<dyn InferenceBackend>) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| InnerVoiceError::Server(format!("Failed to bind {}: {}", addr, e)))?;
    serve(listener, backend).await
}

async fn process_text(
    State(state): State<Arc<ServerState>>,
    body: std::result::Result<Json<ProcessTextRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection);
            return error_response(StatusCode::BAD_REQUEST, MISSING_TEXT_ERROR, None);
        }
    };

    let text = body.user_text.trim();
    if text.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, MISSING_TEXT_ERROR, None);
    }

    let persona = match body.persona.trim() {
        "" => DEFAULT_PERSONA.to_string(),
        persona => persona.to_string(),
    };
    let request = BackendRequest {
        context: from_chat_history(&body.chat_history, &persona),
        persona,
        text: text.to_string(),
    };

    match state.backend.generate(&request).await {
        Ok(reply) => Json(ProcessTextResponse {
            response_text: reply.text,
        })
        .into_response(),
        Err(e) => {
            error!(
                "AI Error ({}): {} {}",
                state.backend.name(),
                e.message,
                e.details.as_deref().unwrap_or("")
            );
            let details = e.details.unwrap_or(e.message);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERATION_ERROR,
                Some(details),
            )
        }
    }
}

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}
