//! Module-namespaced cache adapter
//!
//! Every key is stored as `<prefix>:<module>:<key>`. Values are JSON; hash
//! fields use the buffer-aware codec. Failures never reach the caller: each
//! method logs and returns its type's empty value.

use super::codec;
use super::connection::CacheConnection;
use super::errors::CacheError;
use super::provider::StoreBackend;
use super::traits::CacheStore;
use crate::config::CacheConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Keys requested per SCAN round-trip
pub const SCAN_BATCH_SIZE: usize = 100;

/// Cache scoped to one logical module
#[derive(Debug, Clone)]
pub struct ModuleCache<S = StoreBackend> {
    module: String,
    prefix: String,
    default_ttl: Duration,
    store: S,
}

impl ModuleCache<StoreBackend> {
    /// Bind a module to the connection's current handle
    ///
    /// Without a handle every operation is a no-op returning its default.
    pub fn new(connection: &CacheConnection, module: impl Into<String>) -> Self {
        let module = module.into();
        let store = Self::backend_for(connection, &module);
        Self::with_store(store, connection.config(), module)
    }

    #[cfg(feature = "cache-redis")]
    fn backend_for(connection: &CacheConnection, module: &str) -> StoreBackend {
        match connection.handle() {
            Some(handle) => StoreBackend::from(handle),
            None => {
                warn!(module = module, "Redis client not available. Continuing without Redis.");
                StoreBackend::default()
            }
        }
    }

    #[cfg(not(feature = "cache-redis"))]
    fn backend_for(connection: &CacheConnection, module: &str) -> StoreBackend {
        let _ = connection.handle();
        warn!(module = module, "Redis client not available. Continuing without Redis.");
        StoreBackend::default()
    }

    /// Check if caching is actually enabled (not NoOp)
    pub fn is_enabled(&self) -> bool {
        self.store.is_enabled()
    }
}

impl<S: CacheStore> ModuleCache<S> {
    /// Run the adapter over an explicit store
    pub fn with_store(store: S, config: &CacheConfig, module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            prefix: config.prefix().to_string(),
            default_ttl: config.default_ttl(),
            store,
        }
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn provider_name(&self) -> &'static str {
        self.store.provider_name()
    }

    /// `<prefix>:<module>:<key>`
    pub fn build_key(&self, key: &str) -> String {
        format!("{}:{}:{}", self.prefix, self.module, key)
    }

    /// Glob pattern matching every key of this module, optionally narrowed
    /// to keys under `criteria:`
    ///
    /// Empty criteria count as none.
    pub fn match_pattern(&self, criteria: Option<&str>) -> String {
        match criteria.filter(|criteria| !criteria.is_empty()) {
            Some(criteria) => format!("{}{}:*", self.build_key(""), criteria),
            None => format!("{}*", self.build_key("")),
        }
    }

    fn report(&self, operation: &str, key: &str, e: &CacheError) {
        if e.is_unavailable() {
            debug!(module = %self.module, operation = operation, key = key, "Cache unavailable, skipping");
        } else {
            error!(module = %self.module, operation = operation, key = key, error = %e, "Cache operation failed");
        }
    }

    /// Fetch and parse a value
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.build_key(key);
        let result = match self.store.get(&full_key).await {
            Ok(Some(text)) => codec::from_json(&text).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            self.report("get", &full_key, &e);
            None
        })
    }

    /// Store a value, expiring after `ttl` or the configured default
    ///
    /// A zero `ttl` counts as no TTL.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let full_key = self.build_key(key);
        let ttl = ttl
            .filter(|ttl| !ttl.is_zero())
            .unwrap_or(self.default_ttl);

        let result = match codec::to_json(value) {
            Ok(text) => self.store.set_ex(&full_key, &text, ttl).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            self.report("set", &full_key, &e);
        }
    }

    /// Fetch and parse one hash field
    pub async fn h_get<T: DeserializeOwned>(&self, key: &str, field: &str) -> Option<T> {
        let full_key = self.build_key(key);
        let result = match self.store.h_get(&full_key, field).await {
            Ok(Some(text)) if !text.is_empty() => codec::from_hash_json(&text).map(Some),
            Ok(_) => Ok(None),
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            self.report("h_get", &full_key, &e);
            None
        })
    }

    /// Store one hash field
    pub async fn h_set<T: Serialize + ?Sized>(&self, key: &str, field: &str, value: &T) {
        let full_key = self.build_key(key);
        let result = match codec::to_hash_json(value) {
            Ok(text) => self.store.h_set(&full_key, field, &text).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            self.report("h_set", &full_key, &e);
        }
    }

    pub async fn has(&self, key: &str) -> bool {
        let full_key = self.build_key(key);
        self.store.exists(&full_key).await.unwrap_or_else(|e| {
            self.report("has", &full_key, &e);
            false
        })
    }

    /// Remove a key, returning how many were removed
    pub async fn delete(&self, key: &str) -> u64 {
        let full_key = self.build_key(key);
        self.store
            .del(std::slice::from_ref(&full_key))
            .await
            .unwrap_or_else(|e| {
                self.report("delete", &full_key, &e);
                0
            })
    }

    /// Remove one hash field, returning how many were removed
    pub async fn h_delete(&self, key: &str, field: &str) -> u64 {
        let full_key = self.build_key(key);
        self.store.h_del(&full_key, field).await.unwrap_or_else(|e| {
            self.report("h_delete", &full_key, &e);
            0
        })
    }

    /// Every stored key of this module, optionally under `criteria:`
    ///
    /// Walks the keyspace with SCAN in batches of `SCAN_BATCH_SIZE` and
    /// returns full keys, de-duplicated, in first-seen order.
    pub async fn keys(&self, criteria: Option<&str>) -> Vec<String> {
        let pattern = self.match_pattern(criteria);
        self.scan_keys(&pattern).await.unwrap_or_else(|e| {
            self.report("keys", &pattern, &e);
            Vec::new()
        })
    }

    async fn scan_keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        let mut cursor: u64 = 0;

        // Use SCAN to iterate without blocking the server
        loop {
            let (next_cursor, batch) = self.store.scan(cursor, pattern, SCAN_BATCH_SIZE).await?;
            for key in batch {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(keys)
    }

    /// Remove every key `keys(criteria)` reports, in one bulk delete
    pub async fn delete_all(&self, criteria: Option<&str>) -> u64 {
        let pattern = self.match_pattern(criteria);
        let keys = match self.scan_keys(&pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                self.report("delete_all", &pattern, &e);
                return 0;
            }
        };

        if keys.is_empty() {
            return 0;
        }

        let deleted = self.store.del(&keys).await.unwrap_or_else(|e| {
            self.report("delete_all", &pattern, &e);
            0
        });
        debug!(module = %self.module, pattern = %pattern, deleted = deleted, "Cache pattern DEL");
        deleted
    }

    /// Check if the backing store is healthy
    pub async fn health_check(&self) -> bool {
        self.store.health_check().await.unwrap_or_else(|e| {
            self.report("health_check", "", &e);
            false
        })
    }
}
