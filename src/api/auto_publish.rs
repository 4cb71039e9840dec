//! Auto-publish job endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::AppJson;
use crate::error::Result;
use crate::server::AppState;
use crate::tasks::{AutoPublishJobInfo, AutoPublishRequest};

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<AutoPublishJobInfo>,
    pub running: usize,
}

/// POST /api/v1/auto-publish - Start publishing a template on a timer
#[tracing::instrument(
    name = "http.start_auto_publish",
    skip(state, request),
    fields(topic = %request.topic, interval_ms = request.interval_ms)
)]
pub async fn start_job(
    State(state): State<AppState>,
    AppJson(request): AppJson<AutoPublishRequest>,
) -> Result<(StatusCode, Json<AutoPublishJobInfo>)> {
    let job = state.auto_publish.start(request, state.sink.clone())?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/auto-publish - List jobs
#[tracing::instrument(name = "http.list_auto_publish", skip(state))]
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobListResponse> {
    Json(JobListResponse {
        jobs: state.auto_publish.list(),
        running: state.auto_publish.running_count(),
    })
}

/// GET /api/v1/auto-publish/{id} - Job status and published count
#[tracing::instrument(name = "http.get_auto_publish", skip(state))]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AutoPublishJobInfo>> {
    Ok(Json(state.auto_publish.status(&id)?))
}

/// DELETE /api/v1/auto-publish/{id} - Stop a job and report how many
/// messages it published
#[tracing::instrument(name = "http.stop_auto_publish", skip(state))]
pub async fn stop_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AutoPublishJobInfo>> {
    Ok(Json(state.auto_publish.stop(&id).await?))
}
