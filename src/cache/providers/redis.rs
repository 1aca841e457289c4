//! Redis store provider
//!
//! Uses `redis::aio::ConnectionManager` for async multiplexed connections.
//! Requires the `cache-redis` feature flag.
//!
//! A `RedisStore` is handed out before its connection exists: the manager
//! slot is filled by the connect task owned by `CacheConnection`, and every
//! command issued before then fails with `CacheError::NotReady`.

use crate::cache::connection::{ConnectionEvent, ConnectionState, StateTracker};
use crate::cache::errors::{CacheError, CacheResult};
use crate::cache::traits::CacheStore;
use parking_lot::RwLock;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::RedisError;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Upper bound on establishing the initial connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Redis-backed store using a lazily-installed ConnectionManager
#[derive(Clone)]
pub struct RedisStore {
    client: redis::Client,
    manager: Arc<RwLock<Option<ConnectionManager>>>,
    tracker: StateTracker,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("state", &self.tracker.state())
            .field("connected", &self.manager.read().is_some())
            .finish()
    }
}

impl RedisStore {
    /// Create a store bound to `uri` without connecting
    ///
    /// Fails only when the URI cannot be parsed into a client.
    pub fn open(uri: &str) -> CacheResult<Self> {
        let client = redis::Client::open(uri).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        Ok(Self {
            client,
            manager: Arc::new(RwLock::new(None)),
            tracker: StateTracker::new(),
        })
    }

    /// Tracked connection state
    pub fn state(&self) -> ConnectionState {
        self.tracker.state()
    }

    /// Drive the connection to ready, reporting lifecycle events
    ///
    /// Runs as a background task spawned by `CacheConnection::handle`.
    pub async fn connect(&self) {
        self.tracker.apply(ConnectionEvent::Connecting);

        // A single attempt: a failed connect is reported, never retried here
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(0)
            .set_connection_timeout(CONNECT_TIMEOUT);

        match ConnectionManager::new_with_config(self.client.clone(), config).await {
            Ok(manager) => {
                *self.manager.write() = Some(manager);
                self.tracker.apply(ConnectionEvent::Ready);
            }
            Err(e) => {
                self.tracker
                    .apply(ConnectionEvent::Error(format!("redis connect exception: {}", e)));
            }
        }
    }

    /// Feed a lifecycle event to the tracker directly
    #[cfg(test)]
    pub(crate) fn report(&self, event: ConnectionEvent) {
        self.tracker.apply(event);
    }

    /// Clone the installed manager without holding the lock across an await
    fn connection(&self) -> CacheResult<ConnectionManager> {
        self.manager.read().clone().ok_or(CacheError::NotReady)
    }

    /// Map a client error, reporting connection loss to the tracker
    fn backend_error(&self, command: &str, e: RedisError) -> CacheError {
        if let Some(event) = lifecycle_event(&e) {
            self.tracker.apply(event);
        }
        CacheError::BackendError(format!("Redis {} failed: {}", command, e))
    }
}

/// Lifecycle event implied by a command failure, if any
///
/// Reply errors (WRONGTYPE and friends) leave the connection untouched.
pub(crate) fn lifecycle_event(e: &RedisError) -> Option<ConnectionEvent> {
    if e.is_connection_dropped() {
        Some(ConnectionEvent::End)
    } else if e.is_io_error() || e.is_connection_refusal() || e.is_timeout() {
        Some(ConnectionEvent::Error(e.to_string()))
    } else {
        None
    }
}

impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection()?;
        let result: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.backend_error("GET", e))?;

        if result.is_some() {
            debug!(key = key, "Cache HIT");
        } else {
            debug!(key = key, "Cache MISS");
        }

        Ok(result)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection()?;
        let ttl_seconds = ttl.as_secs().max(1);

        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_seconds)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| self.backend_error("SETEX", e))?;

        debug!(key = key, ttl_seconds = ttl_seconds, "Cache SET");
        Ok(())
    }

    async fn h_get(&self, key: &str, field: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection()?;
        redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.backend_error("HGET", e))
    }

    async fn h_set(&self, key: &str, field: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.connection()?;
        redis::cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| self.backend_error("HSET", e))?;

        debug!(key = key, field = field, "Cache HSET");
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection()?;
        let count: u64 = redis::cmd("EXISTS")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.backend_error("EXISTS", e))?;
        Ok(count > 0)
    }

    async fn del(&self, keys: &[String]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.connection()?;
        let count: u64 = redis::cmd("DEL")
            .arg(keys)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.backend_error("DEL", e))?;

        debug!(keys = keys.len(), deleted = count, "Cache DEL");
        Ok(count)
    }

    async fn h_del(&self, key: &str, field: &str) -> CacheResult<u64> {
        let mut conn = self.connection()?;
        redis::cmd("HDEL")
            .arg(key)
            .arg(field)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.backend_error("HDEL", e))
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> CacheResult<(u64, Vec<String>)> {
        let mut conn = self.connection()?;
        redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await
            .map_err(|e| self.backend_error("SCAN", e))
    }

    async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.connection()?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| self.backend_error("PING", e))?;

        Ok(pong == "PONG")
    }

    fn provider_name(&self) -> &'static str {
        "redis"
    }
}
