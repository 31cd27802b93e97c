// Conduit - a typed CQRS mediator for Rust
//
// Requests are routed to exactly one handler through an ordered chain of
// pipeline behaviors. Response caching ships as one of those behaviors.

// Re-export core functionality
pub use conduit_core::*;

// Re-export optional crates
#[cfg(feature = "cache")]
pub use conduit_cache;

/// Prelude module for convenient imports
///
/// ```
/// use conduit::prelude::*;
/// ```
pub mod prelude {
    pub use conduit_core::{
        CancellationToken, Container, DispatchError, DispatchResult, Dispatcher, HandlerRegistry,
        LoggingBehavior, Next, PipelineBehavior, Registrations, Request, RequestHandler, Resolver,
        Unit, async_trait, configure,
    };

    #[cfg(feature = "cache")]
    pub use conduit_cache::{
        CacheContainerExt, CacheInvalidator, CacheOptions, CacheRegistrationsExt, CacheStore,
        CacheableRequest, CachingBehavior, InMemoryCache,
    };

    #[cfg(feature = "cache-redis")]
    pub use conduit_cache::RedisCache;
}
