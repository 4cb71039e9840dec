use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::config::Settings;
use crate::publish::{LoggingSink, MessageSink};
use crate::session::SessionStore;
use crate::simulator::TemplateEngine;
use crate::tasks::AutoPublishManager;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub engine: TemplateEngine,
    pub session_store: Arc<SessionStore>,
    pub auto_publish: Arc<AutoPublishManager>,
    pub sink: Arc<dyn MessageSink>,
    pub start_time: Instant,
}

impl AppState {
    /// Build state publishing auto-publish output through the logging sink
    pub fn new(settings: Settings, shutdown: broadcast::Sender<()>) -> Self {
        Self::with_sink(settings, shutdown, Arc::new(LoggingSink))
    }

    /// Build state publishing auto-publish output into `sink`
    pub fn with_sink(
        settings: Settings,
        shutdown: broadcast::Sender<()>,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        let engine = TemplateEngine::new();
        let session_store = Arc::new(SessionStore::with_engine(
            engine.clone(),
            settings.simulator.max_sessions,
        ));
        let auto_publish = Arc::new(AutoPublishManager::new(
            settings.auto_publish.clone(),
            engine.clone(),
            session_store.clone(),
            shutdown,
        ));

        Self {
            settings: Arc::new(settings),
            engine,
            session_store,
            auto_publish,
            sink,
            start_time: Instant::now(),
        }
    }
}
