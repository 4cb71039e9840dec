use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

use super::auto_publish::{
    AutoPublishError, AutoPublishJobInfo, AutoPublishRequest, AutoPublishTask, JobStatus,
};
use crate::config::AutoPublishConfig;
use crate::metrics::AutoPublishMetrics;
use crate::publish::MessageSink;
use crate::session::SessionStore;
use crate::simulator::TemplateEngine;
use crate::telemetry::attributes;

struct JobEntry {
    topic: String,
    session_id: Option<String>,
    interval_ms: u64,
    started_at: DateTime<Utc>,
    published: Arc<AtomicU64>,
    status: watch::Receiver<JobStatus>,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl JobEntry {
    fn info(&self, id: &str) -> AutoPublishJobInfo {
        AutoPublishJobInfo {
            id: id.to_string(),
            topic: self.topic.clone(),
            session_id: self.session_id.clone(),
            interval_ms: self.interval_ms,
            published: self.published.load(Ordering::Relaxed),
            status: self.status.borrow().clone(),
            started_at: self.started_at,
        }
    }

    fn is_running(&self) -> bool {
        *self.status.borrow() == JobStatus::Running
    }
}

/// Registry of auto-publish jobs
pub struct AutoPublishManager {
    jobs: DashMap<String, JobEntry>,
    config: AutoPublishConfig,
    engine: TemplateEngine,
    sessions: Arc<SessionStore>,
    shutdown: broadcast::Sender<()>,
}

impl AutoPublishManager {
    pub fn new(
        config: AutoPublishConfig,
        engine: TemplateEngine,
        sessions: Arc<SessionStore>,
        shutdown: broadcast::Sender<()>,
    ) -> Self {
        Self {
            jobs: DashMap::new(),
            config,
            engine,
            sessions,
            shutdown,
        }
    }

    /// Validate `request` and spawn a job publishing into `sink`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(
        &self,
        request: AutoPublishRequest,
        sink: Arc<dyn MessageSink>,
    ) -> Result<AutoPublishJobInfo, AutoPublishError> {
        request.validate(&self.config)?;

        let running = self.running_count();
        if running >= self.config.max_jobs {
            tracing::warn!(max_jobs = self.config.max_jobs, "Auto-publish job limit reached");
            return Err(AutoPublishError::LimitReached(self.config.max_jobs));
        }
        if let Some(session_id) = &request.session_id {
            self.sessions.get_or_create(session_id)?;
        }

        let id = Uuid::new_v4().to_string();
        let topic = request.topic.clone();
        let session_id = request.session_id.clone();
        let interval_ms = request.interval_ms;
        let (task, handles) = AutoPublishTask::new(
            id.clone(),
            request,
            self.engine.clone(),
            self.sessions.clone(),
            sink,
            self.shutdown.subscribe(),
        );

        let span = tracing::info_span!("auto_publish.job", job_id = %id, topic = %topic);
        for kv in [attributes::job_id(&id), attributes::topic(&topic)] {
            span.set_attribute(kv.key, kv.value);
        }
        let handle = tokio::spawn(task.run().instrument(span));

        let entry = JobEntry {
            topic,
            session_id,
            interval_ms,
            started_at: Utc::now(),
            published: handles.published,
            status: handles.status,
            stop: Some(handles.stop),
            handle,
        };
        let info = entry.info(&id);
        self.jobs.insert(id, entry);
        AutoPublishMetrics::set_active_jobs(running + 1);

        Ok(info)
    }

    /// Stop a job, wait for it to finish and return its final state
    pub async fn stop(&self, id: &str) -> Result<AutoPublishJobInfo, AutoPublishError> {
        let (_, mut entry) = self
            .jobs
            .remove(id)
            .ok_or_else(|| AutoPublishError::NotFound(id.to_string()))?;

        if let Some(stop) = entry.stop.take() {
            let _ = stop.send(());
        }
        if let Err(e) = (&mut entry.handle).await {
            tracing::error!(job_id = %id, error = %e, "Auto-publish task panicked");
        }
        AutoPublishMetrics::set_active_jobs(self.running_count());

        Ok(entry.info(id))
    }

    /// Current state of one job
    pub fn status(&self, id: &str) -> Result<AutoPublishJobInfo, AutoPublishError> {
        self.jobs
            .get(id)
            .map(|entry| entry.info(id))
            .ok_or_else(|| AutoPublishError::NotFound(id.to_string()))
    }

    /// All known jobs, oldest first
    pub fn list(&self) -> Vec<AutoPublishJobInfo> {
        let mut jobs: Vec<AutoPublishJobInfo> = self
            .jobs
            .iter()
            .map(|entry| entry.value().info(entry.key()))
            .collect();
        jobs.sort_by_key(|job| job.started_at);
        jobs
    }

    /// Number of jobs still publishing
    pub fn running_count(&self) -> usize {
        self.jobs.iter().filter(|entry| entry.is_running()).count()
    }

    /// Stop every job and wait for all of them; returns how many were stopped
    pub async fn stop_all(&self) -> usize {
        let ids: Vec<String> = self.jobs.iter().map(|entry| entry.key().clone()).collect();
        let results = join_all(ids.iter().map(|id| self.stop(id))).await;
        let stopped = results.iter().filter(|r| r.is_ok()).count();

        if stopped > 0 {
            tracing::info!(stopped, "Stopped all auto-publish jobs");
        }
        stopped
    }
}
