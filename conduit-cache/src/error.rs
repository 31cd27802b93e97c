//! Error types for cache operations.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific errors.
///
/// These stay inside the caching behavior during dispatch; only explicit
/// operations such as [`CacheInvalidator`](crate::CacheInvalidator) return them.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Redis-specific error
    #[cfg(feature = "redis")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Request or response could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stored payload could not be decoded
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Store reports itself unavailable
    #[error("Cache store unavailable")]
    Unavailable,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation timeout
    #[error("Operation timeout")]
    Timeout,

    /// Generic error
    #[error("Cache error: {0}")]
    Other(String),
}

impl CacheError {
    /// Short label used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            #[cfg(feature = "redis")]
            CacheError::Redis(_) => "redis",
            CacheError::Serialization(_) => "serialization",
            CacheError::Deserialization(_) => "deserialization",
            CacheError::Connection(_) => "connection",
            CacheError::Unavailable => "unavailable",
            CacheError::Config(_) => "config",
            CacheError::Timeout => "timeout",
            CacheError::Other(_) => "other",
        }
    }
}
