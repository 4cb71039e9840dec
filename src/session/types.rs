//! Session types and error definitions

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::simulator::RenderState;

/// Session-specific error type
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Invalid session ID: {0}")]
    InvalidId(String),

    #[error("Session limit reached ({0})")]
    LimitReached(usize),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Summary of one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Point-in-time view of a session including its render state
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub render_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_rendered_at: Option<DateTime<Utc>>,
    pub state: RenderState,
}

/// Validate a caller-chosen session ID (alphanumeric, dash, underscore)
pub(crate) fn validate_id(id: &str) -> SessionResult<()> {
    if id.is_empty() || id.len() > 64 {
        return Err(SessionError::InvalidId(
            "ID must be 1-64 characters".to_string(),
        ));
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SessionError::InvalidId(
            "ID must contain only alphanumeric, dash, or underscore".to_string(),
        ));
    }

    Ok(())
}
