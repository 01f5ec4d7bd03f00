//! In-memory KV store with Consul lookup semantics
//!
//! Lookups match by raw key prefix, the way a recursive Consul read does.

use crate::domain::ports::{KvEntries, KvStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-process [`KvStore`]
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    prefix: String,
    entries: RwLock<KvEntries>,
    lookups: AtomicU64,
}

impl MemoryKvStore {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    /// Build a store pre-populated with `entries`
    pub fn with_entries<K, V>(prefix: impl Into<String>, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new(prefix);
        {
            let mut map = store.entries.write();
            for (k, v) in entries {
                map.insert(k.into(), v.into());
            }
        }
        store
    }

    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.write().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.write().remove(key)
    }

    /// Number of `get` calls served
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<KvEntries> {
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let entries = self.entries.read();
        let found: KvEntries = entries
            .range(key.to_string()..)
            .take_while(|(k, _)| k.starts_with(key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if found.is_empty() {
            return Err(Error::KvKeyNotFound {
                key: key.to_string(),
            });
        }
        Ok(found)
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}
