//! Route handler functions for all API endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use leadline_chat::ChatError;
use leadline_storage::MessageRepository;

use crate::error::ApiError;
use crate::state::AppState;

/// Owner recorded for sessions opened without a user id.
const ANONYMOUS_USER: &str = "anonymous";

// =============================================================================
// Request and response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    pub name: String,
    pub description: String,
    pub location: String,
    pub products: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub session_id: String,
    pub summary: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Handler functions
// =============================================================================

/// POST /chat - one conversational turn.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest(ChatError::EmptyInput.to_string()));
    }

    let session_id = match req.session_id.filter(|s| !s.trim().is_empty()) {
        Some(id) => id,
        None => {
            let user = req.user_id.as_deref().unwrap_or(ANONYMOUS_USER);
            state.orchestrator.start_session(user)
        }
    };

    let reply = state.orchestrator.handle(&session_id, &req.message).await;
    tracing::debug!(session_id = %session_id, source = ?reply.source, "Chat turn handled");

    Ok(Json(ChatResponse {
        response: reply.text,
        session_id,
    }))
}

/// GET /info - company details from the knowledge base.
pub async fn info(State(state): State<AppState>) -> Json<InfoResponse> {
    let kb = state.orchestrator.knowledge();
    Json(InfoResponse {
        name: kb.company.name.clone(),
        description: kb.company.description.clone(),
        location: kb.company.location.clone(),
        products: kb.products.iter().map(|p| p.name.clone()).collect(),
    })
}

/// GET /sessions/{id}/summary - plain-text summary of the logged conversation.
pub async fn session_summary(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let repo = MessageRepository::new(state.database.clone());
    let messages = repo.list_by_session(&session_id)?;
    let summary = state.summarizer.summarize(&messages);
    Ok(Json(SummaryResponse {
        session_id,
        summary,
    }))
}

/// POST /sessions/{id}/reset - drop the session's dialogue state.
pub async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<ResetResponse> {
    Json(ResetResponse {
        response: state.orchestrator.reset(&session_id),
    })
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
