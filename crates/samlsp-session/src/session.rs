//! The request-scoped session handle.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::SessionResult;

/// Raw session contents.
pub type SessionData = serde_json::Map<String, Value>;

#[derive(Debug, Default)]
struct Inner {
    data: SessionData,
    modified: bool,
    regenerate: bool,
}

/// A cloneable handle to the session of the current request.
///
/// Clones share the same map, so a handle given to an event listener and
/// the one held by the session middleware observe the same writes.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<Inner>>,
}

impl Session {
    /// Creates an empty session that is not backed by any store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps previously stored contents.
    #[must_use]
    pub fn from_data(data: SessionData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                data,
                ..Inner::default()
            })),
        }
    }

    /// Reads and deserializes a value.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> SessionResult<Option<T>> {
        let value = self.inner.lock().data.get(key).cloned();
        Ok(value.map(serde_json::from_value::<T>).transpose()?)
    }

    /// Reads a raw value.
    #[must_use]
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.inner.lock().data.get(key).cloned()
    }

    /// Serializes and stores a value.
    pub fn insert<T: Serialize>(&self, key: impl Into<String>, value: &T) -> SessionResult<()> {
        let value = serde_json::to_value(value)?;
        let mut inner = self.inner.lock();
        inner.data.insert(key.into(), value);
        inner.modified = true;
        Ok(())
    }

    /// Removes a value.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut inner = self.inner.lock();
        let removed = inner.data.remove(key);
        if removed.is_some() {
            inner.modified = true;
        }
        removed
    }

    /// Removes every value.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        if !inner.data.is_empty() {
            inner.data.clear();
            inner.modified = true;
        }
    }

    /// Whether a key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().data.contains_key(key)
    }

    /// Whether the session holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().data.is_empty()
    }

    /// Whether the session changed since it was loaded.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.inner.lock().modified
    }

    /// Asks the store layer to move the contents to a fresh session ID.
    ///
    /// Call this whenever the privilege level changes, e.g. right after a
    /// login, so an ID planted before authentication is never promoted.
    pub fn regenerate(&self) {
        let mut inner = self.inner.lock();
        inner.regenerate = true;
        inner.modified = true;
    }

    /// Whether [`Session::regenerate`] was called.
    #[must_use]
    pub fn needs_new_id(&self) -> bool {
        self.inner.lock().regenerate
    }

    /// Snapshot of the contents.
    #[must_use]
    pub fn data(&self) -> SessionData {
        self.inner.lock().data.clone()
    }
}
