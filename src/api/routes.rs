use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::auto_publish::{get_job, list_jobs, start_job, stop_job};
use super::health::health;
use super::metrics::prometheus_metrics;
use super::publish::publish_message;
use super::render::render_template;
use super::session::{create_session, delete_session, get_session, list_sessions, reset_session};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                // Rendering
                .route("/render", post(render_template))
                .route("/publish", post(publish_message))
                // Sessions
                .route("/sessions", post(create_session).get(list_sessions))
                .route("/sessions/{id}", get(get_session).delete(delete_session))
                .route("/sessions/{id}/reset", post(reset_session))
                // Auto-publish
                .route("/auto-publish", post(start_job).get(list_jobs))
                .route("/auto-publish/{id}", get(get_job).delete(stop_job)),
        )
}
