//! Store backend with enum dispatch
//!
//! `CacheStore` uses `async fn` in a trait and is not object safe, so the
//! concrete stores are wrapped in an enum instead of a `Box<dyn _>`.

use super::errors::CacheResult;
use super::providers::{MemoryStore, NoOpStore};
use super::traits::CacheStore;
use std::time::Duration;

#[cfg(feature = "cache-redis")]
use super::providers::RedisStore;

/// Any of the built-in stores
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// Redis store (boxed to reduce enum size)
    #[cfg(feature = "cache-redis")]
    Redis(Box<RedisStore>),

    /// In-process store
    Memory(MemoryStore),

    /// No-op store (always miss, always succeed)
    NoOp(NoOpStore),
}

impl Default for StoreBackend {
    fn default() -> Self {
        Self::NoOp(NoOpStore::new())
    }
}

#[cfg(feature = "cache-redis")]
impl From<RedisStore> for StoreBackend {
    fn from(store: RedisStore) -> Self {
        Self::Redis(Box::new(store))
    }
}

impl From<MemoryStore> for StoreBackend {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<NoOpStore> for StoreBackend {
    fn from(store: NoOpStore) -> Self {
        Self::NoOp(store)
    }
}

impl StoreBackend {
    /// Check if caching is actually enabled (not NoOp)
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::NoOp(_))
    }
}

/// Forward a call to whichever store is wrapped
macro_rules! dispatch {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            #[cfg(feature = "cache-redis")]
            StoreBackend::Redis($store) => $call,
            StoreBackend::Memory($store) => $call,
            StoreBackend::NoOp($store) => $call,
        }
    };
}

impl CacheStore for StoreBackend {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        dispatch!(self, s => s.get(key).await)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        dispatch!(self, s => s.set_ex(key, value, ttl).await)
    }

    async fn h_get(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        dispatch!(self, s => s.h_get(key, field).await)
    }

    async fn h_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        dispatch!(self, s => s.h_set(key, field, value).await)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        dispatch!(self, s => s.exists(key).await)
    }

    async fn del(&self, keys: &[String]) -> CacheResult<u64> {
        dispatch!(self, s => s.del(keys).await)
    }

    async fn h_del(&self, key: &str, field: &str) -> CacheResult<u64> {
        dispatch!(self, s => s.h_del(key, field).await)
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> CacheResult<(u64, Vec<String>)> {
        dispatch!(self, s => s.scan(cursor, pattern, count).await)
    }

    async fn health_check(&self) -> CacheResult<bool> {
        dispatch!(self, s => s.health_check().await)
    }

    fn provider_name(&self) -> &'static str {
        dispatch!(self, s => s.provider_name())
    }
}
