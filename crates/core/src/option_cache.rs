//! Session-scoped cache of fetched location options.
//!
//! Dropdown contents are written to a [`SessionStore`] after every cascade
//! mutation, keyed by route, and read back when a form on that route is
//! mounted again. The cache is never authoritative: a fresh fetch always
//! overwrites it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::CoreError;
use crate::location::LocationSnapshot;

/// Prefix applied to the route when building the storage key.
pub const CACHE_KEY_PREFIX: &str = "location-options:";

/// String key/value storage that lives for one browsing session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);
}

/// In-process [`SessionStore`]. Clones share the same map, so every
/// resolver mounted on a route sees the same record.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        let map = self.inner.read().unwrap_or_else(|e| e.into_inner());
        map.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        let mut map = self.inner.write().unwrap_or_else(|e| e.into_inner());
        map.remove(key);
    }
}

/// The cache record for one route.
#[derive(Clone)]
pub struct OptionCache {
    store: Arc<dyn SessionStore>,
    key: String,
}

impl std::fmt::Debug for OptionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionCache").field("key", &self.key).finish()
    }
}

impl OptionCache {
    pub fn for_route(store: Arc<dyn SessionStore>, route: &str) -> Self {
        Self {
            store,
            key: cache_key(route),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the cached snapshot. A record that no longer decodes is removed
    /// and treated as a miss.
    pub fn load(&self) -> Option<LocationSnapshot> {
        let raw = self.store.get(&self.key)?;
        match serde_json::from_str::<LocationSnapshot>(&raw) {
            Ok(snapshot) => Some(snapshot.repaired()),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Discarding undecodable option cache");
                self.store.remove(&self.key);
                None
            }
        }
    }

    pub fn save(&self, snapshot: &LocationSnapshot) -> Result<(), CoreError> {
        let raw = serde_json::to_string(snapshot)
            .map_err(|e| CoreError::Storage(format!("Failed to encode option cache: {e}")))?;
        self.store.set(&self.key, raw);
        Ok(())
    }

    pub fn clear(&self) {
        self.store.remove(&self.key);
    }
}

/// `/customer/post-job/` and `/customer/post-job` share one record.
pub fn cache_key(route: &str) -> String {
    let trimmed = route.trim();
    let normalized = match trimmed.trim_end_matches('/') {
        "" => "/",
        path => path,
    };
    format!("{CACHE_KEY_PREFIX}{normalized}")
}
