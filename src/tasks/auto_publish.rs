use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::time::MissedTickBehavior;

use crate::config::AutoPublishConfig;
use crate::metrics::AutoPublishMetrics;
use crate::publish::{validate_target, MessageSink, PublishMessage};
use crate::session::{SessionError, SessionStore};
use crate::simulator::{RenderState, TemplateEngine};

/// Auto-publish error type
#[derive(Debug, Error)]
pub enum AutoPublishError {
    #[error("Invalid auto-publish request: {0}")]
    InvalidRequest(String),

    #[error("Auto-publish job not found: {0}")]
    NotFound(String),

    #[error("Auto-publish job limit reached ({0})")]
    LimitReached(usize),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Request to start publishing a template on a timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoPublishRequest {
    pub topic: String,
    pub template: String,
    pub interval_ms: u64,
    #[serde(default)]
    pub qos: u8,
    #[serde(default)]
    pub retain: bool,
    /// Render through this session so counters continue across manual
    /// publishes and other jobs sharing it
    #[serde(default)]
    pub session_id: Option<String>,
}

impl AutoPublishRequest {
    /// Validate against the configured limits
    pub fn validate(&self, config: &AutoPublishConfig) -> Result<(), AutoPublishError> {
        validate_target(&self.topic, self.qos)
            .map_err(|e| AutoPublishError::InvalidRequest(e.to_string()))?;

        if self.interval_ms < config.min_interval_ms {
            return Err(AutoPublishError::InvalidRequest(format!(
                "interval must be at least {} ms",
                config.min_interval_ms
            )));
        }

        Ok(())
    }
}

/// Lifecycle of one auto-publish job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Stopped,
    Failed { error: String },
}

/// Where a job keeps counters and running totals between ticks
enum RenderTarget {
    Owned(RenderState),
    Session {
        store: Arc<SessionStore>,
        id: String,
    },
}

/// Background task rendering and publishing one template on an interval.
///
/// Publishes once immediately, then once per interval. Without a session the
/// task owns its [`RenderState`]; either way counters and running totals
/// continue across ticks.
pub struct AutoPublishTask {
    id: String,
    request: AutoPublishRequest,
    engine: TemplateEngine,
    target: RenderTarget,
    sink: Arc<dyn MessageSink>,
    published: Arc<AtomicU64>,
    status: watch::Sender<JobStatus>,
    stop: oneshot::Receiver<()>,
    shutdown: broadcast::Receiver<()>,
}

/// Handles the owner keeps for a spawned [`AutoPublishTask`]
pub(crate) struct TaskHandles {
    pub published: Arc<AtomicU64>,
    pub status: watch::Receiver<JobStatus>,
    pub stop: oneshot::Sender<()>,
}

impl AutoPublishTask {
    pub(crate) fn new(
        id: String,
        request: AutoPublishRequest,
        engine: TemplateEngine,
        sessions: Arc<SessionStore>,
        sink: Arc<dyn MessageSink>,
        shutdown: broadcast::Receiver<()>,
    ) -> (Self, TaskHandles) {
        let published = Arc::new(AtomicU64::new(0));
        let (status_tx, status_rx) = watch::channel(JobStatus::Running);
        let (stop_tx, stop_rx) = oneshot::channel();
        let target = match &request.session_id {
            Some(session_id) => RenderTarget::Session {
                store: sessions,
                id: session_id.clone(),
            },
            None => RenderTarget::Owned(RenderState::new()),
        };

        let task = Self {
            id,
            request,
            engine,
            target,
            sink,
            published: published.clone(),
            status: status_tx,
            stop: stop_rx,
            shutdown,
        };
        let handles = TaskHandles {
            published,
            status: status_rx,
            stop: stop_tx,
        };

        (task, handles)
    }

    /// Run until stopped, shut down, or the sink refuses a message
    pub async fn run(mut self) {
        let mut timer = tokio::time::interval(Duration::from_millis(self.request.interval_ms));
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            job_id = %self.id,
            topic = %self.request.topic,
            interval_ms = self.request.interval_ms,
            sink = self.sink.name(),
            "Auto-publish task started"
        );

        let final_status = loop {
            tokio::select! {
                biased;
                _ = &mut self.stop => {
                    tracing::info!(job_id = %self.id, "Auto-publish task stop requested");
                    break JobStatus::Stopped;
                }
                _ = self.shutdown.recv() => {
                    tracing::info!(job_id = %self.id, "Auto-publish task received shutdown signal");
                    break JobStatus::Stopped;
                }
                _ = timer.tick() => {
                    if let Err(error) = self.publish_once().await {
                        break JobStatus::Failed { error };
                    }
                }
            }
        };

        tracing::info!(
            job_id = %self.id,
            published = self.published.load(Ordering::Relaxed),
            status = ?final_status,
            "Auto-publish task stopped"
        );
        let _ = self.status.send(final_status);
    }

    async fn publish_once(&mut self) -> Result<(), String> {
        let start = Instant::now();
        let rendered = match &mut self.target {
            RenderTarget::Owned(state) => self.engine.render(&self.request.template, state),
            RenderTarget::Session { store, id } => {
                match store.render(id, &self.request.template).await {
                    Ok(rendered) => rendered,
                    Err(e) => {
                        AutoPublishMetrics::record_failed();
                        tracing::warn!(
                            job_id = %self.id,
                            session_id = %id,
                            error = %e,
                            "Auto-publish render failed, stopping job"
                        );
                        return Err(e.to_string());
                    }
                }
            }
        };
        let message = PublishMessage::new(
            self.request.topic.clone(),
            rendered,
            self.request.qos,
            self.request.retain,
        );

        match self.sink.publish(&message).await {
            Ok(()) => {
                let count = self.published.fetch_add(1, Ordering::Relaxed) + 1;
                AutoPublishMetrics::record_published(start.elapsed().as_secs_f64() * 1000.0);
                tracing::debug!(job_id = %self.id, count, "Auto-publish message sent");
                Ok(())
            }
            Err(e) => {
                AutoPublishMetrics::record_failed();
                tracing::warn!(
                    job_id = %self.id,
                    sink = self.sink.name(),
                    error = %e,
                    "Auto-publish failed, stopping job"
                );
                Err(e.to_string())
            }
        }
    }
}

/// Public view of one job
#[derive(Debug, Clone, Serialize)]
pub struct AutoPublishJobInfo {
    pub id: String,
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub interval_ms: u64,
    pub published: u64,
    #[serde(flatten)]
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
}
