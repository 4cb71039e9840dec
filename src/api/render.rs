//! Template render endpoint.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::AppJson;
use crate::error::Result;
use crate::server::AppState;
use crate::simulator::RenderState;
use crate::telemetry::attributes;

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    /// Template containing bracket expressions
    pub template: String,

    /// Session whose state carries counters between calls (optional)
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenderResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub rendered: String,
}

/// POST /api/v1/render - Render a template once
///
/// Without a `session_id` the template is rendered against a fresh state, so
/// auto-increment and accumulator expressions always start over.
#[tracing::instrument(
    name = "http.render_template",
    skip(state, request),
    fields(session_id = ?request.session_id, template_len = request.template.len())
)]
pub async fn render_template(
    State(state): State<AppState>,
    AppJson(request): AppJson<RenderRequest>,
) -> Result<Json<RenderResponse>> {
    let rendered = match &request.session_id {
        Some(id) => {
            let kv = attributes::session_id(id);
            tracing::Span::current().set_attribute(kv.key, kv.value);
            state.session_store.render(id, &request.template).await?
        }
        None => state
            .engine
            .render(&request.template, &mut RenderState::new()),
    };

    Ok(Json(RenderResponse {
        session_id: request.session_id,
        rendered,
    }))
}
