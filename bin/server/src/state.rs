//! Shared application state.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use touchline_ai::TurnOrchestrator;
use touchline_core::{ConnectionId, SessionId};
use tracing::debug;

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    /// Runs turns and owns the session store.
    pub orchestrator: TurnOrchestrator,
    /// Open chat sockets.
    pub connections: ConnectionRegistry,
    /// Whether a provider API key was configured at startup.
    pub provider_configured: bool,
}

impl AppState {
    #[must_use]
    pub fn new(orchestrator: TurnOrchestrator, provider_configured: bool) -> Self {
        Self {
            orchestrator,
            connections: ConnectionRegistry::default(),
            provider_configured,
        }
    }
}

/// One open socket and the session it talks in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub session_id: SessionId,
    pub endpoint: &'static str,
}

/// Tracks open sockets. Entries are removed when their guard drops.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<ConnectionId, ConnectionInfo>>>,
}

impl ConnectionRegistry {
    /// Registers a socket and returns the guard that unregisters it.
    #[must_use]
    pub fn register(&self, session_id: SessionId, endpoint: &'static str) -> ConnectionGuard {
        let id = ConnectionId::new();
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                ConnectionInfo {
                    session_id,
                    endpoint,
                },
            );
        debug!(connection = %id, endpoint, "connection registered");
        ConnectionGuard {
            id,
            registry: self.clone(),
        }
    }

    #[must_use]
    pub fn get(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove(&self, id: ConnectionId) {
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        debug!(connection = %id, "connection removed");
    }
}

/// Keeps a registry entry alive for the lifetime of a socket.
#[derive(Debug)]
pub struct ConnectionGuard {
    id: ConnectionId,
    registry: ConnectionRegistry,
}

impl ConnectionGuard {
    #[must_use]
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
