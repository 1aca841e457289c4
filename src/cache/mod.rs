//! # Module Cache
//!
//! Namespaced key-value and hash-field caching over Redis, degrading to a
//! no-op cache when Redis is unconfigured or unavailable.
//!
//! ## Architecture
//!
//! ```text
//! ModuleCache<S>                 <- prefix:module:key namespacing + JSON codec
//!   └── S: CacheStore
//!         StoreBackend (enum)    <- Zero-cost dispatch, no vtable
//!           ├── Redis(RedisStore)  <- handle from CacheConnection
//!           ├── Memory(MemoryStore)
//!           └── NoOp(NoOpStore)    <- Always-miss, always-succeed fallback
//! ```
//!
//! ## Design Decisions
//!
//! - **Lazy, non-blocking connect**: `CacheConnection::handle` returns at once
//! - **Graceful degradation**: no URI or no client means NoOp, never a failure
//! - **Best-effort operations**: errors are logged and never propagated
//! - **SCAN for enumeration**: non-blocking key iteration (never uses KEYS)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use namespaced_cache::{CacheConfig, CacheConnection, ModuleCache};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let connection = CacheConnection::new(CacheConfig::for_uri("redis://localhost:6379"));
//! let sessions = ModuleCache::new(&connection, "sessions");
//!
//! sessions.set("42", &serde_json::json!({"uid": 7}), Some(Duration::from_secs(300))).await;
//! let session: Option<serde_json::Value> = sessions.get("42").await;
//! # }
//! ```

pub mod codec;
pub mod connection;
pub mod errors;
pub mod module_cache;
pub mod provider;
pub mod providers;
pub mod traits;

pub use codec::Buffer;
pub use connection::{redact_url, CacheConnection, ConnectionEvent, ConnectionState, StateTracker};
pub use errors::{CacheError, CacheResult};
pub use module_cache::{ModuleCache, SCAN_BATCH_SIZE};
pub use provider::StoreBackend;
pub use providers::{MemoryStore, NoOpStore};
pub use traits::CacheStore;

#[cfg(feature = "cache-redis")]
pub use providers::RedisStore;
