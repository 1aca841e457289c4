//! Store capability trait definition

use super::errors::CacheResult;
use std::future::Future;
use std::time::Duration;

/// Primitive operations a backing store must provide
///
/// Implemented by concrete stores (Redis, in-memory, NoOp). Keys passed here
/// are already namespaced; values are already serialized. All operations are
/// async and return `CacheResult` for error handling.
pub trait CacheStore: Send + Sync {
    /// Get a text value by key
    ///
    /// Returns `Ok(Some(value))` on hit, `Ok(None)` on miss.
    fn get(&self, key: &str) -> impl Future<Output = CacheResult<Option<String>>> + Send;

    /// Set a text value that expires after `ttl`
    fn set_ex(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = CacheResult<()>> + Send;

    /// Get a single field of a hash
    fn h_get(
        &self,
        key: &str,
        field: &str,
    ) -> impl Future<Output = CacheResult<Option<String>>> + Send;

    /// Set a single field of a hash
    fn h_set(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> impl Future<Output = CacheResult<()>> + Send;

    /// Check whether a key exists
    fn exists(&self, key: &str) -> impl Future<Output = CacheResult<bool>> + Send;

    /// Delete keys, returning how many were removed
    fn del(&self, keys: &[String]) -> impl Future<Output = CacheResult<u64>> + Send;

    /// Delete a hash field, returning how many were removed
    fn h_del(&self, key: &str, field: &str) -> impl Future<Output = CacheResult<u64>> + Send;

    /// One incremental scan round-trip
    ///
    /// Returns the next cursor (`0` when iteration is complete) and the keys
    /// matching the glob `pattern` found in this batch. A key may be reported
    /// by more than one batch.
    fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> impl Future<Output = CacheResult<(u64, Vec<String>)>> + Send;

    /// Check if the backing store is healthy
    fn health_check(&self) -> impl Future<Output = CacheResult<bool>> + Send;

    /// Get the name of the store provider
    fn provider_name(&self) -> &'static str;
}
