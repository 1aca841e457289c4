//! In-process store provider
//!
//! Keeps entries in a `DashMap` with per-entry expiry measured on the tokio
//! clock, so paused-clock tests can drive TTLs deterministically. SCAN walks
//! live keys in sorted order; each non-zero cursor names the last key it
//! returned, so keys removed between pages never shift the rest.
//!
//! **Important**: This store is NOT distributed. Each process has its own.

use crate::cache::errors::{CacheError, CacheResult};
use crate::cache::traits::CacheStore;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Debug, Clone)]
enum EntryValue {
    Text(String),
    Hash(HashMap<String, String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: EntryValue,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-memory store implementing the full `CacheStore` surface
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, Entry>>,
    /// Open SCAN cursors, mapped to the last key each one returned
    cursors: Arc<DashMap<u64, String>>,
    last_cursor: Arc<AtomicU64>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.entries.len())
            .finish()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| !e.is_expired(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining time to live for a key, if it exists and has an expiry
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entry = self.entries.get(key)?;
        if entry.is_expired(now) {
            return None;
        }
        entry.expires_at.map(|at| at.saturating_duration_since(now))
    }

    /// Drop the key if it has expired
    fn evict_expired(&self, key: &str, now: Instant) {
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
    }

    /// Register a cursor that resumes after `last_key`
    fn open_cursor(&self, last_key: String) -> u64 {
        let mut cursor = self.last_cursor.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if cursor == 0 {
            cursor = self.last_cursor.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        }
        self.cursors.insert(cursor, last_key);
        cursor
    }

    fn live_keys_sorted(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.is_expired(now))
            .map(|e| e.key().clone())
            .collect();
        keys.sort();
        keys
    }
}

impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let found = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => match &entry.value {
                EntryValue::Text(text) => Some(text.clone()),
                EntryValue::Hash(_) => return Err(CacheError::BackendError(WRONG_TYPE.to_string())),
            },
            _ => None,
        };

        if found.is_none() {
            self.evict_expired(key, now);
            debug!(key = key, "Cache MISS (memory)");
        } else {
            debug!(key = key, "Cache HIT (memory)");
        }
        Ok(found)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let ttl = ttl.max(Duration::from_secs(1));
        self.entries.insert(
            key.to_string(),
            Entry {
                value: EntryValue::Text(value.to_string()),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        debug!(key = key, ttl_seconds = ttl.as_secs(), "Cache SET (memory)");
        Ok(())
    }

    async fn h_get(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        let now = Instant::now();
        let found = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => match &entry.value {
                EntryValue::Hash(fields) => fields.get(field).cloned(),
                EntryValue::Text(_) => return Err(CacheError::BackendError(WRONG_TYPE.to_string())),
            },
            _ => None,
        };

        if found.is_none() {
            self.evict_expired(key, now);
        }
        Ok(found)
    }

    async fn h_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        let now = Instant::now();
        self.evict_expired(key, now);

        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: EntryValue::Hash(HashMap::new()),
            expires_at: None,
        });

        match &mut entry.value {
            EntryValue::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
                debug!(key = key, field = field, "Cache HSET (memory)");
                Ok(())
            }
            EntryValue::Text(_) => Err(CacheError::BackendError(WRONG_TYPE.to_string())),
        }
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let now = Instant::now();
        let live = self
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now));
        if !live {
            self.evict_expired(key, now);
        }
        Ok(live)
    }

    async fn del(&self, keys: &[String]) -> CacheResult<u64> {
        let now = Instant::now();
        let removed = keys
            .iter()
            .filter_map(|key| self.entries.remove(key))
            .filter(|(_, entry)| !entry.is_expired(now))
            .count() as u64;
        debug!(requested = keys.len(), removed = removed, "Cache DEL (memory)");
        Ok(removed)
    }

    async fn h_del(&self, key: &str, field: &str) -> CacheResult<u64> {
        let now = Instant::now();
        self.evict_expired(key, now);

        let (removed, now_empty) = match self.entries.get_mut(key) {
            Some(mut entry) => match &mut entry.value {
                EntryValue::Hash(fields) => {
                    let removed = u64::from(fields.remove(field).is_some());
                    (removed, fields.is_empty())
                }
                EntryValue::Text(_) => return Err(CacheError::BackendError(WRONG_TYPE.to_string())),
            },
            None => (0, false),
        };

        // Empty hashes cease to exist
        if now_empty {
            self.entries.remove_if(key, |_, entry| {
                matches!(&entry.value, EntryValue::Hash(fields) if fields.is_empty())
            });
        }
        Ok(removed)
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> CacheResult<(u64, Vec<String>)> {
        let matcher = glob::Pattern::new(pattern)
            .map_err(|e| CacheError::BackendError(format!("Invalid scan pattern '{pattern}': {e}")))?;

        let resume_after = if cursor == 0 {
            None
        } else {
            match self.cursors.remove(&cursor) {
                Some((_, last_key)) => Some(last_key),
                // Unknown or already consumed: the iteration is over
                None => return Ok((0, Vec::new())),
            }
        };

        let keys = self.live_keys_sorted();
        let start = resume_after
            .as_deref()
            .map_or(0, |last| keys.partition_point(|key| key.as_str() <= last));
        let end = start.saturating_add(count.max(1)).min(keys.len());

        let batch = keys[start..end]
            .iter()
            .filter(|key| matcher.matches(key))
            .cloned()
            .collect();
        let next_cursor = if end >= keys.len() {
            0
        } else {
            self.open_cursor(keys[end - 1].clone())
        };

        Ok((next_cursor, batch))
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scan_all(store: &MemoryStore, pattern: &str, count: usize) -> Vec<String> {
        let mut cursor = 0;
        let mut found = Vec::new();
        loop {
            let (next, batch) = store.scan(cursor, pattern, count).await.unwrap();
            found.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }
        found
    }

    #[tokio::test]
    async fn test_memory_get_returns_none_on_miss() {
        let store = MemoryStore::new();
        assert_eq!(store.get("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_set_and_get() {
        let store = MemoryStore::new();
        store
            .set_ex("key", "value", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.get("key").await.unwrap(), Some("value".to_string()));
        assert!(store.exists("key").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_memory_entries_expire() {
        let store = MemoryStore::new();
        store
            .set_ex("key", "value", Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(store.ttl("key"), Some(Duration::from_secs(2)));

        tokio::time::advance(Duration::from_secs(3)).await;

        assert!(!store.exists("key").await.unwrap());
        assert_eq!(store.get("key").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_hash_fields() {
        let store = MemoryStore::new();
        store.h_set("h", "a", "1").await.unwrap();
        store.h_set("h", "b", "2").await.unwrap();

        assert_eq!(store.h_get("h", "a").await.unwrap(), Some("1".to_string()));
        assert_eq!(store.h_get("h", "missing").await.unwrap(), None);
        assert_eq!(store.h_del("h", "a").await.unwrap(), 1);
        assert_eq!(store.h_del("h", "a").await.unwrap(), 0);
        assert!(store.exists("h").await.unwrap());

        assert_eq!(store.h_del("h", "b").await.unwrap(), 1);
        assert!(!store.exists("h").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_wrong_type_is_an_error() {
        let store = MemoryStore::new();
        store.h_set("h", "a", "1").await.unwrap();
        assert!(matches!(
            store.get("h").await,
            Err(CacheError::BackendError(_))
        ));

        store
            .set_ex("s", "text", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(store.h_get("s", "a").await.is_err());
        assert!(store.h_set("s", "a", "1").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_del_counts_removed_keys() {
        let store = MemoryStore::new();
        for key in ["a", "b"] {
            store
                .set_ex(key, "v", Duration::from_secs(60))
                .await
                .unwrap();
        }
        let removed = store
            .del(&["a".to_string(), "b".to_string(), "c".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_memory_scan_pages_through_matches() {
        let store = MemoryStore::new();
        for i in 0..25 {
            store
                .set_ex(&format!("cache:m:{i}"), "v", Duration::from_secs(60))
                .await
                .unwrap();
        }
        store
            .set_ex("cache:other:1", "v", Duration::from_secs(60))
            .await
            .unwrap();

        let found = scan_all(&store, "cache:m:*", 10).await;
        assert_eq!(found.len(), 25);
        assert!(found.iter().all(|k| k.starts_with("cache:m:")));
    }

    #[tokio::test]
    async fn test_memory_scan_survives_deletes_between_pages() {
        let store = MemoryStore::new();
        for i in 0..30 {
            store
                .set_ex(&format!("cache:m:{i:02}"), "v", Duration::from_secs(60))
                .await
                .unwrap();
        }

        let (mut cursor, mut found) = store.scan(0, "cache:m:*", 10).await.unwrap();
        assert_eq!(found.len(), 10);

        // Drop keys that were already returned
        let returned: Vec<String> = found.iter().take(5).cloned().collect();
        assert_eq!(store.del(&returned).await.unwrap(), 5);

        while cursor != 0 {
            let (next, batch) = store.scan(cursor, "cache:m:*", 10).await.unwrap();
            found.extend(batch);
            cursor = next;
        }

        assert_eq!(found.len(), 30);
        for i in 10..30 {
            assert!(found.contains(&format!("cache:m:{i:02}")));
        }
    }

    #[tokio::test]
    async fn test_memory_scan_unknown_cursor_ends_iteration() {
        let store = MemoryStore::new();
        store
            .set_ex("cache:m:1", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(store.scan(42, "cache:*", 10).await.unwrap(), (0, Vec::new()));
    }

    #[tokio::test]
    async fn test_memory_scan_rejects_invalid_pattern() {
        let store = MemoryStore::new();
        assert!(store.scan(0, "cache:[", 10).await.is_err());
    }
}
