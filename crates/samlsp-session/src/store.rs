//! Session persistence.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::SessionResult;
use crate::session::SessionData;

/// Generates a new opaque session ID.
#[must_use]
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Storage for session contents keyed by session ID.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a live session.
    async fn load(&self, id: &str) -> SessionResult<Option<SessionData>>;

    /// Stores a session for `ttl`.
    async fn save(&self, id: &str, data: &SessionData, ttl: Duration) -> SessionResult<()>;

    /// Deletes a session.
    async fn delete(&self, id: &str) -> SessionResult<()>;
}

/// In-process session store with per-entry expiry.
///
/// Suitable for a single instance; sessions do not survive a restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, (SessionData, Instant)>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops expired sessions and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, remaining = entries.len(), "Purged expired sessions");
        }
        purged
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> SessionResult<Option<SessionData>> {
        let entries = self.entries.read();
        Ok(entries
            .get(id)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(data, _)| data.clone()))
    }

    async fn save(&self, id: &str, data: &SessionData, ttl: Duration) -> SessionResult<()> {
        let expires_at = Instant::now() + ttl;
        self.entries
            .write()
            .insert(id.to_string(), (data.clone(), expires_at));
        Ok(())
    }

    async fn delete(&self, id: &str) -> SessionResult<()> {
        if self.entries.write().remove(id).is_some() {
            trace!("Session removed from memory store");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn data() -> SessionData {
        let mut data = SessionData::new();
        data.insert("saml".into(), Value::from("alice"));
        data
    }

    #[tokio::test]
    async fn save_load_delete() {
        let store = MemorySessionStore::new();
        let id = new_session_id();

        assert!(store.load(&id).await.unwrap().is_none());

        store.save(&id, &data(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(store.load(&id).await.unwrap(), Some(data()));

        store.delete(&id).await.unwrap();
        assert!(store.load(&id).await.unwrap().is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn expired_sessions_are_invisible() {
        let store = MemorySessionStore::new();
        store.save("gone", &data(), Duration::ZERO).await.unwrap();
        store.save("live", &data(), Duration::from_secs(60)).await.unwrap();

        assert!(store.load("gone").await.unwrap().is_none());
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn session_ids_are_unique() {
        assert_ne!(new_session_id(), new_session_id());
        assert_eq!(new_session_id().len(), 32);
    }
}
