//! Client registry
//!
//! The shared, lock-protected index of every logged-in session. All access
//! goes through one `tokio::sync::Mutex`; the backing collection is never
//! handed out.

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::message::ServerMessage;
use crate::session::Session;
use crate::types::ClientId;

/// Ordered collection of active sessions
///
/// Iteration order is insertion order. Broadcasts hold the lock while they
/// queue each delivery, so two broadcasts never interleave, but a peer whose
/// outbound queue is full stalls every broadcast until it drains.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    sessions: Mutex<Vec<Session>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session
    ///
    /// Returns false and leaves the registry unchanged if a session with the
    /// same id is already present.
    pub async fn add(&self, session: Session) -> bool {
        let mut sessions = self.sessions.lock().await;
        if sessions.iter().any(|s| s.id == session.id) {
            return false;
        }
        debug!("Registered {} ({})", session.id, session.username);
        sessions.push(session);
        true
    }

    /// Remove the session with the given id
    ///
    /// Silently returns false if no such session is registered.
    pub async fn remove(&self, id: ClientId) -> bool {
        let mut sessions = self.sessions.lock().await;
        match sessions.iter().position(|s| s.id == id) {
            Some(index) => {
                sessions.remove(index);
                true
            }
            None => false,
        }
    }

    /// Copy of the current sessions, in registry order
    pub async fn snapshot(&self) -> Vec<Session> {
        self.sessions.lock().await.clone()
    }

    /// Queue `message` for every session except `sender`
    ///
    /// Failed deliveries are skipped; the failing session stays registered
    /// until its own handler removes it. Returns how many sessions the
    /// message was queued for.
    pub async fn broadcast(&self, sender: ClientId, message: ServerMessage) -> usize {
        let sessions = self.sessions.lock().await;
        let mut delivered = 0;
        for session in sessions.iter().filter(|s| s.id != sender) {
            match session.send(message.clone()).await {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Dropped broadcast to {}: {}", session.id, e),
            }
        }
        delivered
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
