//! Cache-aside pipeline behavior

use crate::cacheable::CacheableRequest;
use crate::config::CacheOptions;
use crate::error::{CacheError, CacheResult};
use crate::key::CacheKeyGenerator;
use crate::traits::CacheStore;
use async_trait::async_trait;
use conduit_core::{CancellationToken, DispatchResult, Next, PipelineBehavior, Resolver};
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Serves cacheable requests from a [`CacheStore`], populating it on a miss.
///
/// Cache faults never fail a dispatch: a failed read counts as a miss and a
/// failed write is logged and dropped. Faults from the inner stages pass
/// through and are not cached.
pub struct CachingBehavior<R> {
    store: Option<Arc<dyn CacheStore>>,
    options: CacheOptions,
    keys: CacheKeyGenerator,
    _request: PhantomData<fn(R)>,
}

impl<R: CacheableRequest> CachingBehavior<R> {
    /// A behavior over `store`; `None` makes every request bypass the cache
    pub fn new(store: Option<Arc<dyn CacheStore>>, options: CacheOptions) -> Self {
        let keys = CacheKeyGenerator::new(options.key_prefix.clone());
        Self {
            store,
            options,
            keys,
            _request: PhantomData,
        }
    }

    /// Pick up the registered store and options, if any
    pub fn from_resolver(resolver: &dyn Resolver) -> DispatchResult<Self> {
        let store = resolver
            .try_resolve::<Arc<dyn CacheStore>>()
            .map(|store| (*store).clone());
        let options = resolver
            .try_resolve::<CacheOptions>()
            .map(|options| (*options).clone())
            .unwrap_or_default();

        Ok(Self::new(store, options))
    }

    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    fn encode(response: &R::Response) -> CacheResult<Vec<u8>> {
        serde_json::to_vec(response).map_err(|error| CacheError::Serialization(error.to_string()))
    }

    fn decode(bytes: &[u8]) -> CacheResult<R::Response> {
        serde_json::from_slice(bytes).map_err(|error| CacheError::Deserialization(error.to_string()))
    }

    async fn read(&self, store: &dyn CacheStore, key: &str) -> Option<R::Response> {
        let request_type = std::any::type_name::<R>();

        match store.get(key).await {
            Ok(Some(bytes)) => match Self::decode(&bytes) {
                Ok(response) => {
                    debug!(request_type, key, "Cache hit");
                    Some(response)
                }
                Err(error) => {
                    warn!(
                        request_type,
                        key,
                        kind = error.kind(),
                        error = %error,
                        "Cached payload unreadable, treating as miss"
                    );
                    None
                }
            },
            Ok(None) => {
                debug!(request_type, key, "Cache miss");
                None
            }
            Err(error) => {
                warn!(
                    request_type,
                    key,
                    kind = error.kind(),
                    error = %error,
                    "Cache read failed, treating as miss"
                );
                None
            }
        }
    }

    async fn write(&self, store: &dyn CacheStore, key: &str, bytes: Vec<u8>, ttl: Duration) {
        let request_type = std::any::type_name::<R>();

        match store.set(key, bytes, ttl).await {
            Ok(()) => trace!(request_type, key, ttl_secs = ttl.as_secs(), "Response cached"),
            Err(error) => warn!(
                request_type,
                key,
                kind = error.kind(),
                error = %error,
                "Cache write failed"
            ),
        }
    }
}

#[async_trait]
impl<R: CacheableRequest> PipelineBehavior<R> for CachingBehavior<R> {
    async fn handle(
        &self,
        request: R,
        _cancellation: CancellationToken,
        next: Next<R>,
    ) -> DispatchResult<R::Response> {
        let request_type = std::any::type_name::<R>();

        if !self.options.enabled || !request.use_cache() {
            trace!(request_type, "Caching bypassed");
            return next(request).await;
        }

        let store = match &self.store {
            Some(store) if store.is_available() => Arc::clone(store),
            Some(_) => {
                let error = CacheError::Unavailable;
                warn!(request_type, kind = error.kind(), error = %error, "Bypassing cache");
                return next(request).await;
            }
            None => {
                trace!(request_type, "No cache store registered");
                return next(request).await;
            }
        };

        let key = match self.keys.generate(&request) {
            Ok(key) => key,
            Err(error) => {
                warn!(request_type, error = %error, "Cache key generation failed, bypassing cache");
                return next(request).await;
            }
        };

        if let Some(cached) = self.read(store.as_ref(), &key).await {
            return Ok(cached);
        }

        let ttl = request.cache_duration().unwrap_or(self.options.default_ttl);
        let response = next(request).await?;

        match Self::encode(&response) {
            Ok(bytes) => self.write(store.as_ref(), &key, bytes, ttl).await,
            Err(error) => warn!(
                request_type,
                key,
                kind = error.kind(),
                error = %error,
                "Response not serializable, skipping cache write"
            ),
        }

        Ok(response)
    }
}
