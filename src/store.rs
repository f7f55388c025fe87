//! In-memory session registry
//!
//! Keeps one `Session` per conversation id for the HTTP surface. Each session
//! sits behind its own mutex so turns on one conversation run one at a time
//! while other conversations proceed independently.

use crate::session::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

pub type SharedSession = Arc<Mutex<Session>>;

/// Sessions live until `remove` (the `DELETE /api/sessions/:id` route) or
/// process exit. There is no expiry or eviction, so the map grows with every
/// new conversation id.
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SharedSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Existing session for `id`, or a fresh greeted one
    pub async fn get_or_create(&self, id: Uuid) -> SharedSession {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(&id) {
                return session.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id)
            .or_insert_with(|| {
                debug!(session_id = %id, "Creating session");
                Arc::new(Mutex::new(Session::with_id(id)))
            })
            .clone()
    }

    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        let sessions = self.sessions.read().await;
        sessions.get(&id).cloned()
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
