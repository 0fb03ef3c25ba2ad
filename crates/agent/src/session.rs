//! Session registry
//!
//! Maps session ids to conversation state. Each session carries its own
//! lock, so turns on different sessions never wait on each other and turns on
//! the same session are applied one at a time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::watch;

use crate::feedback::FeedbackSummary;
use crate::state::{ConversationState, DialogueState, Turn};
use crate::AgentError;

/// One conversation
pub struct Session {
    pub id: String,
    pub created_at: DateTime<Utc>,
    state: Mutex<ConversationState>,
    last_activity: RwLock<Instant>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            state: Mutex::new(ConversationState::new()),
            last_activity: RwLock::new(Instant::now()),
        }
    }

    /// Exclusive access to the conversation state for one turn
    pub fn lock(&self) -> parking_lot::MutexGuard<'_, ConversationState> {
        self.state.lock()
    }

    /// Update last activity
    pub fn touch(&self) {
        *self.last_activity.write() = Instant::now();
    }

    /// Check if session is expired
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.read().elapsed() > timeout
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.read().elapsed()
    }

    /// Point-in-time copy for reporting
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        SessionSnapshot {
            id: self.id.clone(),
            created_at: self.created_at,
            idle_secs: self.idle_for().as_secs(),
            state: state.dialogue.clone(),
            last_intent: state.last_intent.clone(),
            slots: state.slots.clone(),
            turn_count: state.turn_count,
            history: state.history.iter().cloned().collect(),
            feedback: state.feedback.summary(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Serializable view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub idle_secs: u64,
    pub state: DialogueState,
    pub last_intent: Option<String>,
    pub slots: HashMap<String, String>,
    pub turn_count: u64,
    pub history: Vec<Turn>,
    pub feedback: FeedbackSummary,
}

/// Feedback across all live sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeedbackReport {
    pub summary: FeedbackSummary,
    /// Sessions with at least one negative verdict, sorted
    pub negative_sessions: Vec<String>,
}

/// Usage counters across all live sessions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub sessions: usize,
    pub idle: usize,
    pub awaiting_slot: usize,
    pub closed: usize,
    pub total_turns: u64,
    pub feedback_positive: u64,
    pub feedback_negative: u64,
}

/// Session registry
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
    max_sessions: usize,
    session_timeout: Duration,
    cleanup_interval: Duration,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize, session_timeout: Duration, cleanup_interval: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            session_timeout,
            cleanup_interval,
        }
    }

    pub fn session_timeout(&self) -> Duration {
        self.session_timeout
    }

    /// Start a background task that periodically evicts expired sessions
    ///
    /// Returns a shutdown sender; send `true` to stop the task.
    pub fn start_cleanup_task(self: &Arc<Self>) -> watch::Sender<bool> {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let registry = Arc::clone(self);
        let interval = registry.cleanup_interval;

        tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval_timer.tick() => {
                        let removed = registry.cleanup_expired();
                        if removed > 0 {
                            tracing::info!(
                                removed,
                                remaining = registry.count(),
                                "Session cleanup"
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            tracing::info!("Session cleanup task shutting down");
                            break;
                        }
                    }
                }
            }
        });

        shutdown_tx
    }

    /// Create a session with a fresh id
    pub fn create(&self) -> Result<Arc<Session>, AgentError> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.write();
        self.ensure_capacity(&mut sessions)?;

        let session = Arc::new(Session::new(&id));
        sessions.insert(id.clone(), Arc::clone(&session));
        tracing::info!(session_id = %id, "Created session");
        Ok(session)
    }

    /// Session for `id`, created on first contact
    ///
    /// An expired session is replaced by a fresh one under the same id.
    pub fn get_or_create(&self, id: &str) -> Result<Arc<Session>, AgentError> {
        if let Some(session) = self.sessions.read().get(id) {
            if !session.is_expired(self.session_timeout) {
                return Ok(Arc::clone(session));
            }
        }

        let mut sessions = self.sessions.write();
        match sessions.get(id) {
            Some(session) if !session.is_expired(self.session_timeout) => {
                return Ok(Arc::clone(session));
            }
            Some(_) => {
                tracing::info!(session_id = %id, "Session expired, starting over");
                sessions.remove(id);
            }
            None => {}
        }

        self.ensure_capacity(&mut sessions)?;
        let session = Arc::new(Session::new(id));
        sessions.insert(id.to_string(), Arc::clone(&session));
        tracing::debug!(session_id = %id, "Created session on first contact");
        Ok(session)
    }

    /// Live session by id
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions
            .read()
            .get(id)
            .filter(|s| !s.is_expired(self.session_timeout))
            .cloned()
    }

    /// Remove a session, returning whether it existed
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Removed session");
        }
        removed
    }

    /// Session count, expired ones included until evicted
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// List all session IDs
    pub fn list(&self) -> Vec<String> {
        self.sessions.read().keys().cloned().collect()
    }

    /// Live sessions, expired ones excluded
    fn live(&self) -> Vec<Arc<Session>> {
        self.sessions
            .read()
            .values()
            .filter(|s| !s.is_expired(self.session_timeout))
            .cloned()
            .collect()
    }

    pub fn feedback_report(&self) -> FeedbackReport {
        let mut report = FeedbackReport::default();
        for session in self.live() {
            let state = session.lock();
            report.summary.add(&state.feedback);
            if state.feedback.negative > 0 {
                report.negative_sessions.push(session.id.clone());
            }
        }
        report.negative_sessions.sort();
        report
    }

    pub fn stats(&self) -> SessionStats {
        let mut stats = SessionStats::default();
        for session in self.live() {
            let state = session.lock();
            stats.sessions += 1;
            match state.dialogue {
                DialogueState::Idle => stats.idle += 1,
                DialogueState::AwaitingSlot { .. } => stats.awaiting_slot += 1,
                DialogueState::Closed => stats.closed += 1,
            }
            stats.total_turns += state.turn_count;
            stats.feedback_positive += state.feedback.positive;
            stats.feedback_negative += state.feedback.negative;
        }
        stats
    }

    /// Evict expired sessions, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write();
        self.cleanup_expired_internal(&mut sessions)
    }

    fn cleanup_expired_internal(&self, sessions: &mut HashMap<String, Arc<Session>>) -> usize {
        let timeout = self.session_timeout;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = !session.is_expired(timeout);
            if !keep {
                tracing::debug!(session_id = %id, "Expired session");
            }
            keep
        });
        before - sessions.len()
    }

    fn ensure_capacity(
        &self,
        sessions: &mut HashMap<String, Arc<Session>>,
    ) -> Result<(), AgentError> {
        if sessions.len() >= self.max_sessions {
            self.cleanup_expired_internal(sessions);
            if sessions.len() >= self.max_sessions {
                tracing::warn!(max_sessions = self.max_sessions, "Session limit reached");
                return Err(AgentError::SessionLimit(self.max_sessions));
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.count())
            .field("max_sessions", &self.max_sessions)
            .field("session_timeout", &self.session_timeout)
            .finish()
    }
}
