//! Session storage with per-session locking

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::types::{validate_id, SessionError, SessionInfo, SessionResult, SessionSnapshot};
use crate::metrics::SessionMetrics;
use crate::simulator::{RenderState, TemplateEngine};

struct SessionEntry {
    created_at: DateTime<Utc>,
    data: Mutex<SessionData>,
}

#[derive(Default)]
struct SessionData {
    state: RenderState,
    render_count: u64,
    last_rendered_at: Option<DateTime<Utc>>,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            created_at: Utc::now(),
            data: Mutex::new(SessionData::default()),
        }
    }
}

/// In-memory session storage
pub struct SessionStore {
    sessions: DashMap<String, Arc<SessionEntry>>,
    engine: TemplateEngine,
    max_sessions: usize,
    /// Reserved slots; never exceeds `max_sessions`
    reserved: AtomicUsize,
}

impl SessionStore {
    /// Create a new session store backed by the system clock
    pub fn new(max_sessions: usize) -> Self {
        Self::with_engine(TemplateEngine::new(), max_sessions)
    }

    /// Create a session store rendering through `engine`
    pub fn with_engine(engine: TemplateEngine, max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            engine,
            max_sessions,
            reserved: AtomicUsize::new(0),
        }
    }

    /// Create a session with a generated ID
    pub fn create(&self) -> SessionResult<SessionInfo> {
        let id = Uuid::new_v4().to_string();
        let entry = self.get_or_insert(&id)?;
        tracing::debug!(session_id = %id, "Session created");

        Ok(SessionInfo {
            id,
            created_at: entry.created_at,
        })
    }

    /// Return the session with `id`, creating it if needed
    pub fn get_or_create(&self, id: &str) -> SessionResult<SessionInfo> {
        let entry = self.get_or_insert(id)?;
        Ok(SessionInfo {
            id: id.to_string(),
            created_at: entry.created_at,
        })
    }

    /// Render `template` against the session's state, creating the session
    /// on first use
    pub async fn render(&self, id: &str, template: &str) -> SessionResult<String> {
        let entry = self.get_or_insert(id)?;
        let mut data = entry.data.lock().await;

        let rendered = self.engine.render(template, &mut data.state);
        data.render_count += 1;
        data.last_rendered_at = Some(Utc::now());

        Ok(rendered)
    }

    /// Copy out the session's current state
    pub async fn snapshot(&self, id: &str) -> SessionResult<SessionSnapshot> {
        let entry = self.get(id)?;
        let data = entry.data.lock().await;

        Ok(SessionSnapshot {
            id: id.to_string(),
            created_at: entry.created_at,
            render_count: data.render_count,
            last_rendered_at: data.last_rendered_at,
            state: data.state.clone(),
        })
    }

    /// Clear all counters and running totals of a session
    pub async fn reset(&self, id: &str) -> SessionResult<()> {
        let entry = self.get(id)?;
        entry.data.lock().await.state.reset();
        tracing::debug!(session_id = %id, "Session state reset");
        Ok(())
    }

    /// Delete a session by ID
    pub fn delete(&self, id: &str) -> SessionResult<()> {
        self.sessions
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        self.reserved.fetch_sub(1, Ordering::AcqRel);
        SessionMetrics::set_active(self.sessions.len());
        Ok(())
    }

    /// List all sessions, oldest first
    pub fn list(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self
            .sessions
            .iter()
            .map(|entry| SessionInfo {
                id: entry.key().clone(),
                created_at: entry.value().created_at,
            })
            .collect();
        sessions.sort_by_key(|s| s.created_at);
        sessions
    }

    /// Check if a session exists
    pub fn exists(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Get the number of sessions
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    fn get(&self, id: &str) -> SessionResult<Arc<SessionEntry>> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn reserve_slot(&self) -> SessionResult<()> {
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_sessions).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|_| {
                tracing::warn!(max_sessions = self.max_sessions, "Session limit reached");
                SessionError::LimitReached(self.max_sessions)
            })
    }

    fn get_or_insert(&self, id: &str) -> SessionResult<Arc<SessionEntry>> {
        if let Ok(entry) = self.get(id) {
            return Ok(entry);
        }

        validate_id(id)?;
        self.reserve_slot()?;

        // The shard guard must be released before len() is called
        let mut inserted = false;
        let entry = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                inserted = true;
                Arc::new(SessionEntry::new())
            })
            .value()
            .clone();
        if !inserted {
            // Another caller created the same id first
            self.reserved.fetch_sub(1, Ordering::AcqRel);
        }
        SessionMetrics::set_active(self.sessions.len());

        Ok(entry)
    }
}
