//! API layer - HTTP endpoint handlers organized by domain.

mod auto_publish;
mod extract;
mod health;
mod metrics;
mod publish;
mod render;
mod routes;
mod session;

// Re-export all handlers for use in server/app.rs
pub use auto_publish::{get_job, list_jobs, start_job, stop_job};
pub use extract::AppJson;
pub use health::health;
pub use metrics::prometheus_metrics;
pub use publish::{publish_message, PublishRequest};
pub use render::{render_template, RenderRequest, RenderResponse};
pub use routes::api_routes;
pub use session::{create_session, delete_session, get_session, list_sessions, reset_session};
