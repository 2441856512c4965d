//! Shared session store.
//!
//! The store maps each session id to exactly one [`SessionHistory`]. It is a
//! cheap-to-clone handle: every connection handler receives a clone and all
//! clones share the same map. Nothing is persisted or evicted; histories live
//! until they are cleared or the process exits.

use crate::history::SessionHistory;
use crate::turn::{Role, Turn};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use touchline_core::SessionId;
use tracing::debug;

/// Retention limits applied to every history in a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct StoreLimits {
    /// Maximum turns kept per session. `None` keeps every turn.
    #[serde(default)]
    pub max_turns_per_session: Option<usize>,
}

/// In-process map from session id to conversation history.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    limits: StoreLimits,
    sessions: Arc<RwLock<HashMap<SessionId, SessionHistory>>>,
}

impl SessionStore {
    /// Creates an empty store with no retention cap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store applying the given limits.
    #[must_use]
    pub fn with_limits(limits: StoreLimits) -> Self {
        Self {
            limits,
            sessions: Arc::default(),
        }
    }

    /// Returns a handle to the session's history, creating it if needed.
    ///
    /// When no id is given a fresh one is generated.
    pub fn get_or_create(&self, session_id: Option<SessionId>) -> SessionHandle {
        let id = session_id.unwrap_or_else(SessionId::generate);
        self.write()
            .entry(id.clone())
            .or_insert_with(|| self.new_history());
        SessionHandle {
            id,
            store: self.clone(),
        }
    }

    /// Appends a user turn, creating the history if absent.
    pub fn append_user(&self, session_id: &SessionId, text: impl Into<String>) {
        self.append(session_id, Role::User, text.into());
    }

    /// Appends an assistant turn, creating the history if absent.
    pub fn append_assistant(&self, session_id: &SessionId, text: impl Into<String>) {
        self.append(session_id, Role::Assistant, text.into());
    }

    /// Renders the session transcript, or the empty string if unknown.
    #[must_use]
    pub fn render(&self, session_id: &SessionId) -> String {
        self.read()
            .get(session_id)
            .map(SessionHistory::render)
            .unwrap_or_default()
    }

    /// Resets the session history to empty. Unknown ids are ignored.
    pub fn clear(&self, session_id: &SessionId) {
        if let Some(history) = self.write().get_mut(session_id) {
            history.clear();
            debug!(session_id = %session_id, "cleared session history");
        }
    }

    /// Returns a snapshot of the session's turns.
    #[must_use]
    pub fn turns(&self, session_id: &SessionId) -> Vec<Turn> {
        self.read()
            .get(session_id)
            .map(|history| history.turns().to_vec())
            .unwrap_or_default()
    }

    /// Returns true if a history exists for the id.
    #[must_use]
    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.read().contains_key(session_id)
    }

    /// Returns the number of known sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.read().len()
    }

    /// Returns the configured limits.
    #[must_use]
    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    fn append(&self, session_id: &SessionId, role: Role, text: String) {
        let mut sessions = self.write();
        let history = sessions
            .entry(session_id.clone())
            .or_insert_with(|| self.new_history());
        history.push(Turn::new(role, text));
        debug!(session_id = %session_id, %role, turns = history.len(), "appended turn");
    }

    fn new_history(&self) -> SessionHistory {
        SessionHistory::with_max_turns(self.limits.max_turns_per_session)
    }

    // A panic while holding the lock cannot leave a history half-written:
    // every mutation is a single push or clear.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionId, SessionHistory>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionId, SessionHistory>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to one session's history inside a [`SessionStore`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    store: SessionStore,
}

impl SessionHandle {
    /// Returns the session id.
    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn append_user(&self, text: impl Into<String>) {
        self.store.append_user(&self.id, text);
    }

    pub fn append_assistant(&self, text: impl Into<String>) {
        self.store.append_assistant(&self.id, text);
    }

    #[must_use]
    pub fn render(&self) -> String {
        self.store.render(&self.id)
    }

    pub fn clear(&self) {
        self.store.clear(&self.id);
    }

    #[must_use]
    pub fn turns(&self) -> Vec<Turn> {
        self.store.turns(&self.id)
    }
}
