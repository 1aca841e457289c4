#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! # Namespaced Cache
//!
//! A small key-value and hash-field cache, namespaced per module and backed
//! by Redis, that quietly becomes a no-op when Redis is not configured or not
//! reachable. Caching is an optional performance layer: no operation on a
//! [`ModuleCache`] ever returns an error or panics.
//!
//! ## Module Organization
//!
//! - [`cache`] - Connection holder, stores and the module-scoped adapter
//! - [`config`] - Layered configuration (file + `CACHE__*` environment)
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use namespaced_cache::{CacheConfig, CacheConnection, ModuleCache};
//!
//! // No URI configured: the cache is disabled
//! let connection = CacheConnection::new(CacheConfig::default());
//! let cache = ModuleCache::new(&connection, "sessions");
//! assert_eq!(cache.build_key("foo"), "cache:sessions:foo");
//! assert!(!cache.is_enabled());
//! ```

pub mod cache;
pub mod config;
pub mod logging;

pub use cache::{
    Buffer, CacheConnection, CacheError, CacheResult, CacheStore, ConnectionState, MemoryStore,
    ModuleCache, NoOpStore, StoreBackend,
};
pub use config::{CacheConfig, ConfigurationError, RedisConfig};

#[cfg(feature = "cache-redis")]
pub use cache::RedisStore;
