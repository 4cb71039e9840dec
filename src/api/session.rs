//! Render session endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::error::Result;
use crate::server::AppState;
use crate::session::{SessionInfo, SessionSnapshot};

#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionInfo>,
    pub total: usize,
}

/// POST /api/v1/sessions - Create a session with a generated ID
#[tracing::instrument(name = "http.create_session", skip(state))]
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionInfo>)> {
    let session = state.session_store.create()?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// GET /api/v1/sessions - List sessions
#[tracing::instrument(name = "http.list_sessions", skip(state))]
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    let sessions = state.session_store.list();
    let total = sessions.len();

    Json(SessionListResponse { sessions, total })
}

/// GET /api/v1/sessions/{id} - Session details including its render state
#[tracing::instrument(name = "http.get_session", skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>> {
    Ok(Json(state.session_store.snapshot(&id).await?))
}

/// POST /api/v1/sessions/{id}/reset - Forget counters and running totals
#[tracing::instrument(name = "http.reset_session", skip(state))]
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.session_store.reset(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/sessions/{id} - Delete a session
#[tracing::instrument(name = "http.delete_session", skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.session_store.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
