//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub sessions: SessionHealthResponse,
    pub auto_publish: AutoPublishHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct SessionHealthResponse {
    pub active: usize,
    pub max: usize,
}

#[derive(Debug, Serialize)]
pub struct AutoPublishHealthResponse {
    pub running: usize,
    pub max: usize,
    pub sink: String,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        sessions: SessionHealthResponse {
            active: state.session_store.count(),
            max: state.settings.simulator.max_sessions,
        },
        auto_publish: AutoPublishHealthResponse {
            running: state.auto_publish.running_count(),
            max: state.settings.auto_publish.max_jobs,
            sink: state.sink.name().to_string(),
        },
    })
}
