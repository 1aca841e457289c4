//! No-op store provider
//!
//! Always misses, always succeeds. Substituted whenever no Redis handle can
//! be obtained (no URI configured, client construction failed).

use crate::cache::errors::CacheResult;
use crate::cache::traits::CacheStore;
use std::time::Duration;

/// Store that never holds anything
///
/// All reads return None/false/empty, all writes succeed silently, and no
/// network call is ever made.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpStore;

impl NoOpStore {
    /// Create a new no-op store
    pub fn new() -> Self {
        Self
    }
}

impl CacheStore for NoOpStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
        Ok(())
    }

    async fn h_get(&self, _key: &str, _field: &str) -> CacheResult<Option<String>> {
        Ok(None)
    }

    async fn h_set(&self, _key: &str, _field: &str, _value: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        Ok(false)
    }

    async fn del(&self, _keys: &[String]) -> CacheResult<u64> {
        Ok(0)
    }

    async fn h_del(&self, _key: &str, _field: &str) -> CacheResult<u64> {
        Ok(0)
    }

    async fn scan(&self, _cursor: u64, _pattern: &str, _count: usize) -> CacheResult<(u64, Vec<String>)> {
        Ok((0, Vec::new()))
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}
