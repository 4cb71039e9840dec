//! One-shot publish endpoint.

use axum::{extract::State, Json};
use serde::Deserialize;

use super::AppJson;
use crate::error::Result;
use crate::metrics::PublishMetrics;
use crate::publish::{validate_target, PublishMessage};
use crate::server::AppState;
use crate::simulator::RenderState;

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub topic: String,
    pub template: String,
    #[serde(default)]
    pub qos: u8,
    #[serde(default)]
    pub retain: bool,
    /// Session shared with auto-publish jobs and `/render` (optional)
    #[serde(default)]
    pub session_id: Option<String>,
}

/// POST /api/v1/publish - Render a template once and hand it to the sink
#[tracing::instrument(
    name = "http.publish",
    skip(state, request),
    fields(topic = %request.topic, session_id = ?request.session_id)
)]
pub async fn publish_message(
    State(state): State<AppState>,
    AppJson(request): AppJson<PublishRequest>,
) -> Result<Json<PublishMessage>> {
    validate_target(&request.topic, request.qos)?;

    let rendered = match &request.session_id {
        Some(id) => state.session_store.render(id, &request.template).await?,
        None => state
            .engine
            .render(&request.template, &mut RenderState::new()),
    };
    let message = PublishMessage::new(request.topic, rendered, request.qos, request.retain);

    if let Err(e) = state.sink.publish(&message).await {
        PublishMetrics::record("failed");
        return Err(e.into());
    }
    PublishMetrics::record("published");

    Ok(Json(message))
}
