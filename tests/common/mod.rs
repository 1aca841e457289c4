//! Shared helpers for integration tests

#![allow(dead_code)]

use namespaced_cache::{CacheError, CacheResult, CacheStore, MemoryStore};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

pub fn init_logging() {
    namespaced_cache::logging::init_structured_logging();
}

/// Store whose SCAN replays scripted pages, delegating everything else to a
/// `MemoryStore`
#[derive(Clone, Default)]
pub struct ScriptedScanStore {
    pub inner: MemoryStore,
    pages: Arc<Vec<Vec<String>>>,
    pub patterns_seen: Arc<Mutex<Vec<String>>>,
    pub deleted: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedScanStore {
    pub fn with_pages(pages: Vec<Vec<&str>>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|page| page.into_iter().map(str::to_string).collect())
                    .collect(),
            ),
            ..Self::default()
        }
    }
}

impl CacheStore for ScriptedScanStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.inner.set_ex(key, value, ttl).await
    }

    async fn h_get(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        self.inner.h_get(key, field).await
    }

    async fn h_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        self.inner.h_set(key, field, value).await
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.inner.exists(key).await
    }

    async fn del(&self, keys: &[String]) -> CacheResult<u64> {
        self.deleted.lock().push(keys.to_vec());
        Ok(keys.len() as u64)
    }

    async fn h_del(&self, key: &str, field: &str) -> CacheResult<u64> {
        self.inner.h_del(key, field).await
    }

    async fn scan(&self, cursor: u64, pattern: &str, _count: usize) -> CacheResult<(u64, Vec<String>)> {
        self.patterns_seen.lock().push(pattern.to_string());
        let index = cursor as usize;
        let page = self.pages.get(index).cloned().unwrap_or_default();
        let next = if index + 1 >= self.pages.len() { 0 } else { cursor + 1 };
        Ok((next, page))
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Store on which every operation fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingStore;

fn broken<T>() -> CacheResult<T> {
    Err(CacheError::BackendError("connection reset by peer".to_string()))
}

impl CacheStore for FailingStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        broken()
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        broken()
    }

    async fn h_get(&self, _key: &str, _field: &str) -> CacheResult<Option<String>> {
        broken()
    }

    async fn h_set(&self, _key: &str, _field: &str, _value: &str) -> CacheResult<()> {
        broken()
    }

    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        broken()
    }

    async fn del(&self, _keys: &[String]) -> CacheResult<u64> {
        broken()
    }

    async fn h_del(&self, _key: &str, _field: &str) -> CacheResult<u64> {
        broken()
    }

    async fn scan(&self, _cursor: u64, _pattern: &str, _count: usize) -> CacheResult<(u64, Vec<String>)> {
        broken()
    }

    async fn health_check(&self) -> CacheResult<bool> {
        broken()
    }

    fn provider_name(&self) -> &'static str {
        "failing"
    }
}
