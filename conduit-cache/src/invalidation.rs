//! Explicit cache invalidation

use crate::cacheable::CacheableRequest;
use crate::config::CacheOptions;
use crate::error::CacheResult;
use crate::key::CacheKeyGenerator;
use crate::traits::CacheStore;
use conduit_core::{DispatchResult, Resolver};
use std::sync::Arc;
use tracing::debug;

/// Removes cached responses
///
/// Keys are derived exactly as the caching behavior derives them, so
/// invalidating with a request equal to one that was dispatched removes
/// that dispatch's entry. Unlike dispatch, store errors are returned.
#[derive(Clone)]
pub struct CacheInvalidator {
    store: Arc<dyn CacheStore>,
    keys: CacheKeyGenerator,
}

impl CacheInvalidator {
    pub fn new(store: Arc<dyn CacheStore>, options: &CacheOptions) -> Self {
        Self {
            store,
            keys: CacheKeyGenerator::new(options.key_prefix.clone()),
        }
    }

    /// Build from the registered store and options
    ///
    /// Fails if no store is registered.
    pub fn from_resolver(resolver: &dyn Resolver) -> DispatchResult<Self> {
        let store = resolver.resolve::<Arc<dyn CacheStore>>()?;
        let options = resolver
            .try_resolve::<CacheOptions>()
            .map(|options| (*options).clone())
            .unwrap_or_default();

        Ok(Self::new((*store).clone(), &options))
    }

    /// Key the caching behavior uses for `request`
    pub fn key_for<R: CacheableRequest>(&self, request: &R) -> CacheResult<String> {
        self.keys.generate(request)
    }

    /// Remove the entry for `request`
    pub async fn invalidate<R: CacheableRequest>(&self, request: &R) -> CacheResult<()> {
        let key = self.key_for(request)?;
        debug!(key = %key, "Invalidating cache entry");
        self.store.remove(&key).await
    }

    /// Remove the entries for every request in `requests`
    pub async fn invalidate_all<R: CacheableRequest>(&self, requests: &[R]) -> CacheResult<()> {
        let keys = requests
            .iter()
            .map(|request| self.key_for(request))
            .collect::<CacheResult<Vec<_>>>()?;
        debug!(count = keys.len(), "Invalidating cache entries");
        self.store.remove_many(&keys).await
    }

    /// Remove an entry by explicit key; the prefix is applied here
    pub async fn invalidate_key(&self, key: &str) -> CacheResult<()> {
        let key = format!("{}{}", self.keys.prefix(), key);
        self.store.remove(&key).await
    }
}
