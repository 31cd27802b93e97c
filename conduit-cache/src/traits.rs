//! Cache store trait definition.

use crate::error::{CacheError, CacheResult};
use async_trait::async_trait;
use std::time::Duration;

/// Key/value byte store with per-entry TTL.
///
/// This is the only surface the caching behavior touches. Any backend that
/// can get, set and expire opaque blobs can sit behind it.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a value from the cache.
    ///
    /// Returns `Ok(Some(bytes))` if the key exists, `Ok(None)` if not found,
    /// or an error if the operation fails.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Set a value that expires after `ttl`.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()>;

    /// Remove a key from the cache.
    async fn remove(&self, key: &str) -> CacheResult<()> {
        Err(CacheError::Other(format!("remove not supported for key {key}")))
    }

    /// Remove several keys concurrently.
    async fn remove_many(&self, keys: &[String]) -> CacheResult<()> {
        use futures::future::try_join_all;

        let futures = keys.iter().map(|key| self.remove(key));
        try_join_all(futures).await?;
        Ok(())
    }

    /// Whether the store can currently serve requests.
    ///
    /// The caching behavior bypasses an unavailable store without trying it.
    fn is_available(&self) -> bool {
        true
    }
}
