//! Response caching for Conduit dispatchers.
//!
//! [`CachingBehavior`] is a pipeline behavior that serves repeated requests
//! from a [`CacheStore`]. Requests opt in by implementing
//! [`CacheableRequest`]; a single open rule added with
//! [`CacheRegistrationsExt::with_caching`] then covers all of them.
//!
//! A failing or unavailable store never fails a dispatch. The request simply
//! goes to its handler.
//!
//! # Features
//!
//! - `redis` - Enable the Redis store
//!
//! # Examples
//!
//! ```
//! use conduit_cache::*;
//! use conduit_core::*;
//! use serde::Serialize;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[derive(Serialize)]
//! struct GetPrice {
//!     sku: String,
//! }
//!
//! impl Request for GetPrice {
//!     type Response = u64;
//! }
//!
//! impl CacheableRequest for GetPrice {}
//!
//! #[derive(Default)]
//! struct GetPriceHandler;
//!
//! #[async_trait]
//! impl RequestHandler<GetPrice> for GetPriceHandler {
//!     async fn handle(&self, _request: GetPrice, _cancellation: CancellationToken) -> DispatchResult<u64> {
//!         Ok(1999)
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let registrations = Registrations::new()
//!     .cacheable_handler::<GetPrice, _, _>(|_| Ok(GetPriceHandler))
//!     .with_caching();
//!
//! let mut container = Container::new();
//! container
//!     .register_cache_store(Arc::new(InMemoryCache::new()))
//!     .register_cache_options(CacheOptions::default().with_default_ttl(Duration::from_secs(60)));
//!
//! let (_registry, dispatcher) = configure(registrations, Arc::new(container));
//! let price = dispatcher
//!     .dispatch(GetPrice { sku: "A-1".into() }, CancellationToken::new())
//!     .await
//!     .unwrap();
//! assert_eq!(price, 1999);
//! # });
//! ```

pub mod behavior;
pub mod cacheable;
pub mod config;
pub mod error;
pub mod invalidation;
pub mod key;
pub mod memory;
pub mod registration;
pub mod traits;

#[cfg(feature = "redis")]
pub mod redis_cache;

pub use behavior::CachingBehavior;
pub use cacheable::CacheableRequest;
pub use config::CacheOptions;
pub use error::{CacheError, CacheResult};
pub use invalidation::CacheInvalidator;
pub use key::{CacheKeyGenerator, canonical_json, fingerprint, short_type_name};
pub use memory::InMemoryCache;
pub use registration::{CACHEABLE, CacheContainerExt, CacheRegistrationsExt};
pub use traits::CacheStore;

#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;
