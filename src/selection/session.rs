use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::selection::types::{Session, SessionSummary};

struct SessionEntry {
    created_at: DateTime<Utc>,
    session: Arc<Mutex<Session>>,
}

/// In-memory registry of running tests. Each session has its own mutex, so
/// mutations of one session are serialized without blocking the others.
/// Nothing here survives a restart; attempts themselves live in the store.
pub struct SessionStore {
    next_id: AtomicU64,
    sessions: RwLock<HashMap<u64, SessionEntry>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create_session(&self, learner_name: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let session = Session::new(id, learner_name);
        let entry = SessionEntry {
            created_at: session.created_at,
            session: Arc::new(Mutex::new(session)),
        };
        self.sessions.write().await.insert(id, entry);
        tracing::debug!(session_id = id, learner = learner_name, "Session created");
        id
    }

    async fn handle(&self, session_id: u64) -> Option<Arc<Mutex<Session>>> {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .map(|entry| entry.session.clone())
    }

    /// Exclusive access to one session for a read-modify-write sequence.
    pub async fn lock(&self, session_id: u64) -> Option<OwnedMutexGuard<Session>> {
        let handle = self.handle(session_id).await?;
        Some(handle.lock_owned().await)
    }

    pub async fn get_session(&self, session_id: u64) -> Option<Session> {
        let guard = self.lock(session_id).await?;
        Some(guard.clone())
    }

    /// No-op for unknown sessions and already-recorded questions.
    pub async fn record_attempt(&self, session_id: u64, question_id: u64) -> bool {
        match self.lock(session_id).await {
            Some(mut session) => session.record_attempt(question_id),
            None => false,
        }
    }

    pub async fn mark_diagnostic_done(&self, session_id: u64) -> bool {
        match self.lock(session_id).await {
            Some(mut session) => session.mark_diagnostic_done(),
            None => false,
        }
    }

    /// Removes the session. Waits for any in-flight mutation to finish so the
    /// summary reflects it. A second call for the same id yields `None`.
    pub async fn end_session(&self, session_id: u64) -> Option<SessionSummary> {
        let entry = self.sessions.write().await.remove(&session_id)?;
        let session = entry.session.lock().await;
        Some(SessionSummary {
            learner_name: session.learner_name.clone(),
            attempted_count: session.attempted.len(),
            attempted_ids: session.attempted.clone(),
        })
    }

    /// Drops sessions created more than `max_age` ago.
    pub async fn expire_older_than(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.created_at > cutoff);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
