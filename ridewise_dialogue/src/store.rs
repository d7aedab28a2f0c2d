//! Session store abstraction.
//!
//! The router receives the store by injection rather than reaching for a
//! global map, so a distributed implementation can slot in later. Each entry
//! hands out an `Arc<Mutex<_>>`; holding that mutex for a whole turn
//! serializes concurrent turns on one session while distinct sessions
//! proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::session::SessionSlots;

/// Keyed access to per-session slot state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the session entry, creating an empty one on first use.
    async fn get_or_create(&self, id: &str) -> Arc<Mutex<SessionSlots>>;

    /// Drop a session entirely.
    async fn delete(&self, id: &str);
}

/// Process-local session store. State lives only for the process lifetime.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionSlots>>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: &str) -> Arc<Mutex<SessionSlots>> {
        if let Some(entry) = self.sessions.read().await.get(id) {
            return Arc::clone(entry);
        }

        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!("creating session {id}");
                Arc::new(Mutex::new(SessionSlots::new()))
            });
        Arc::clone(entry)
    }

    async fn delete(&self, id: &str) {
        if self.sessions.write().await.remove(id).is_some() {
            debug!("deleted session {id}");
        }
    }
}
