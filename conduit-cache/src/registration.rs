//! Wiring the caching behavior into a dispatcher

use crate::behavior::CachingBehavior;
use crate::cacheable::CacheableRequest;
use crate::config::CacheOptions;
use crate::traits::CacheStore;
use conduit_core::{Capability, Container, DispatchResult, Registrations, RequestHandler, Resolver};
use std::sync::Arc;

/// Capability shared by every request served through [`CachingBehavior`]
pub const CACHEABLE: Capability = Capability::new("cacheable");

/// Cache-related registration helpers
///
/// ```
/// use conduit_cache::*;
/// use conduit_core::*;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Double(i64);
///
/// impl Request for Double {
///     type Response = i64;
/// }
///
/// impl CacheableRequest for Double {}
///
/// #[derive(Default)]
/// struct DoubleHandler;
///
/// #[async_trait]
/// impl RequestHandler<Double> for DoubleHandler {
///     async fn handle(&self, request: Double, _cancellation: CancellationToken) -> DispatchResult<i64> {
///         Ok(request.0 * 2)
///     }
/// }
///
/// let registrations = Registrations::new()
///     .cacheable_handler::<Double, DoubleHandler, _>(|_| Ok(DoubleHandler))
///     .with_caching();
///
/// let registry = HandlerRegistry::build(registrations);
/// let descriptor = registry.lookup_type::<Double>().unwrap();
/// assert_eq!(descriptor.behavior_names().len(), 1);
/// ```
pub trait CacheRegistrationsExt: Sized {
    /// Opt `R` into the caching rule
    fn cacheable<R: CacheableRequest>(self) -> Self;

    /// Register a handler for `R` and opt `R` into caching
    fn cacheable_handler<R, H, F>(self, factory: F) -> Self
    where
        R: CacheableRequest,
        H: RequestHandler<R> + 'static,
        F: Fn(&dyn Resolver) -> DispatchResult<H> + Send + Sync + 'static;

    /// Add the caching rule at this point in the behavior order
    fn with_caching(self) -> Self;
}

impl CacheRegistrationsExt for Registrations {
    fn cacheable<R: CacheableRequest>(self) -> Self {
        self.capability::<R, CachingBehavior<R>, _>(CACHEABLE, |resolver| {
            CachingBehavior::from_resolver(resolver)
        })
    }

    fn cacheable_handler<R, H, F>(self, factory: F) -> Self
    where
        R: CacheableRequest,
        H: RequestHandler<R> + 'static,
        F: Fn(&dyn Resolver) -> DispatchResult<H> + Send + Sync + 'static,
    {
        self.handler::<R, H, F>(factory).cacheable::<R>()
    }

    fn with_caching(self) -> Self {
        self.open_behavior(CACHEABLE)
    }
}

/// Cache-related container helpers
pub trait CacheContainerExt {
    /// Make `store` available to the caching behavior
    fn register_cache_store(&mut self, store: Arc<dyn CacheStore>) -> &mut Self;

    /// Override the default [`CacheOptions`]
    fn register_cache_options(&mut self, options: CacheOptions) -> &mut Self;
}

impl CacheContainerExt for Container {
    fn register_cache_store(&mut self, store: Arc<dyn CacheStore>) -> &mut Self {
        self.register(store)
    }

    fn register_cache_options(&mut self, options: CacheOptions) -> &mut Self {
        self.register(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCache;
    use async_trait::async_trait;
    use conduit_core::{CancellationToken, Dispatcher, HandlerRegistry, Request};
    use serde::Serialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Serialize)]
    struct Square(u32);

    impl Request for Square {
        type Response = u32;
    }

    impl CacheableRequest for Square {}

    #[derive(Serialize)]
    struct Ping;

    impl Request for Ping {
        type Response = String;
    }

    impl CacheableRequest for Ping {}

    struct SquareHandler {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RequestHandler<Square> for SquareHandler {
        async fn handle(&self, request: Square, _cancellation: CancellationToken) -> DispatchResult<u32> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(request.0 * request.0)
        }
    }

    #[derive(Default)]
    struct PingHandler;

    #[async_trait]
    impl RequestHandler<Ping> for PingHandler {
        async fn handle(&self, _request: Ping, _cancellation: CancellationToken) -> DispatchResult<String> {
            Ok("pong".to_string())
        }
    }

    #[test]
    fn test_caching_rule_applies_only_to_cacheable_requests() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registrations = Registrations::new()
            .cacheable_handler::<Square, _, _>(move |_| {
                Ok(SquareHandler {
                    calls: calls.clone(),
                })
            })
            .handler_default::<Ping, PingHandler>()
            .with_caching();

        let registry = HandlerRegistry::build(registrations);

        let square = registry.lookup_type::<Square>().unwrap();
        assert_eq!(square.behavior_names().len(), 1);
        assert!(square.behavior_names()[0].contains("CachingBehavior"));

        let ping = registry.lookup_type::<Ping>().unwrap();
        assert!(ping.behavior_names().is_empty());
    }

    #[test]
    fn test_without_rule_nothing_is_cached() {
        let registrations = Registrations::new()
            .handler_default::<Ping, PingHandler>()
            .cacheable::<Ping>();

        let registry = HandlerRegistry::build(registrations);
        assert!(registry.lookup_type::<Ping>().unwrap().behavior_names().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_through_registered_cache() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handler_calls = calls.clone();
        let registrations = Registrations::new()
            .cacheable_handler::<Square, _, _>(move |_| {
                Ok(SquareHandler {
                    calls: handler_calls.clone(),
                })
            })
            .with_caching();

        let store = Arc::new(InMemoryCache::new());
        let mut container = Container::new();
        container
            .register_cache_store(store.clone())
            .register_cache_options(CacheOptions::default().with_key_prefix("test:"));

        let dispatcher = Dispatcher::builder()
            .registrations(registrations)
            .resolver(Arc::new(container))
            .build();

        for _ in 0..3 {
            let result = dispatcher
                .dispatch(Square(12), CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(result, 144);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.len().await, 1);
    }
}
