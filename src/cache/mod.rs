//! Generic key-value cache facade.
//!
//! # Data Flow
//! ```text
//! caller → CacheStore trait → MemoryStore (DashMap)
//!                                 ↘ optional JSON file persistence
//! ```
//!
//! # Design Decisions
//! - Callers depend on the [`CacheStore`] trait, not a concrete backend
//! - Expiry is per entry; `Some(0)` means "cache forever"
//! - A deactivated cache warns and degrades to a permanent miss rather
//!   than failing callers

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::schema::CacheSettings;

/// Backend-agnostic cache operations.
///
/// `expire` is seconds to live: `None` applies the configured default,
/// `Some(0)` stores without expiration.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value, expire: Option<u64>);
    fn delete(&self, key: &str);
    fn clear(&self);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    value: Value,
    /// Unix timestamp; `None` never expires.
    expires_at: Option<u64>,
}

impl Entry {
    fn is_expired(&self, now: u64) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// In-process cache store with optional file persistence.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, Entry>>,
    active: bool,
    default_expire: u64,
    persistence_path: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new(settings: &CacheSettings) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            active: settings.active,
            default_expire: settings.default_expire,
            persistence_path: None,
        }
    }

    pub fn with_persistence(mut self, path: impl Into<PathBuf>) -> Self {
        self.persistence_path = Some(path.into());
        self
    }

    /// Load persisted entries if the file exists.
    pub fn load_from_file(settings: &CacheSettings, path: &Path) -> std::io::Result<Self> {
        let store = Self::new(settings).with_persistence(path);
        if path.exists() {
            let file = File::open(path)?;
            let reader = BufReader::new(file);
            let map: HashMap<String, Entry> = serde_json::from_reader(reader)?;
            let count = map.len();
            for (key, entry) in map {
                store.inner.insert(key, entry);
            }
            tracing::info!(entries = count, path = %path.display(), "cache store loaded");
        }
        Ok(store)
    }

    /// Save current entries; a no-op without a persistence path.
    pub fn save_to_file(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);
            let snapshot: HashMap<String, Entry> = self
                .inner
                .iter()
                .map(|r| (r.key().clone(), r.value().clone()))
                .collect();
            serde_json::to_writer(writer, &snapshot)?;
            tracing::info!(entries = snapshot.len(), path = %path.display(), "cache store saved");
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        if !self.active {
            tracing::warn!(key, "cache is deactivated, read degraded to a miss");
            return None;
        }
        let expired = match self.inner.get(key) {
            Some(entry) if entry.is_expired(Self::now()) => true,
            Some(entry) => return Some(entry.value.clone()),
            None => return None,
        };
        if expired {
            self.inner.remove(key);
        }
        None
    }

    fn set(&self, key: &str, value: Value, expire: Option<u64>) {
        if !self.active {
            tracing::warn!(key, "cache is deactivated, write dropped");
            return;
        }
        let ttl = expire.unwrap_or(self.default_expire);
        let expires_at = (ttl > 0).then(|| Self::now() + ttl);
        self.inner.insert(key.to_string(), Entry { value, expires_at });
    }

    fn delete(&self, key: &str) {
        self.inner.remove(key);
    }

    fn clear(&self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> CacheSettings {
        CacheSettings {
            active: true,
            default_expire: 3600,
        }
    }

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new(&settings());
        assert!(store.get("missing").is_none());

        store.set("key", Value::from("value"), None);
        assert_eq!(store.get("key"), Some(Value::from("value")));

        store.delete("key");
        assert!(store.get("key").is_none());
    }

    #[test]
    fn test_zero_expire_means_forever() {
        let store = MemoryStore::new(&settings());
        store.set("pinned", Value::from(1), Some(0));
        let entry = store.inner.get("pinned").unwrap();
        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_expired_entries_read_as_misses() {
        let store = MemoryStore::new(&settings());
        store.set("stale", Value::from(1), None);
        store
            .inner
            .alter("stale", |_, mut entry| {
                entry.expires_at = Some(0);
                entry
            });
        assert!(store.get("stale").is_none());
        // The expired entry is also evicted.
        assert!(store.inner.get("stale").is_none());
    }

    #[test]
    fn test_deactivated_cache_degrades() {
        let store = MemoryStore::new(&CacheSettings {
            active: false,
            default_expire: 3600,
        });
        store.set("key", Value::from(1), None);
        assert!(store.get("key").is_none());
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let store = MemoryStore::new(&settings()).with_persistence(&path);
        store.set("key", Value::from("value"), Some(0));
        store.save_to_file().unwrap();

        let loaded = MemoryStore::load_from_file(&settings(), &path).unwrap();
        assert_eq!(loaded.get("key"), Some(Value::from("value")));
    }
}
