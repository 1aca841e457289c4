//! Cache error types

use thiserror::Error;

/// Errors that can occur during cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    /// Failed to create or connect the cache backend client
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    /// The handle exists but its connection has not reached the ready state
    #[error("Cache connection not ready")]
    NotReady,

    /// Failed to serialize or deserialize cache value
    #[error("Cache serialization error: {0}")]
    SerializationError(String),

    /// Generic backend error
    #[error("Cache backend error: {0}")]
    BackendError(String),
}

impl CacheError {
    /// Whether this error belongs to the silent degraded mode rather than an
    /// operational failure
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NotReady)
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::SerializationError(e.to_string())
    }
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
