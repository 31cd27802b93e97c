//! Cache opt-in for requests

use conduit_core::Request;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// A request whose response may be served from the cache.
///
/// The request is serialized to derive its key, and the response is stored
/// as JSON. Every method has a default, so opting in is usually an empty
/// `impl` block.
///
/// ```
/// use conduit_cache::CacheableRequest;
/// use conduit_core::Request;
/// use serde::Serialize;
/// use std::time::Duration;
///
/// #[derive(Serialize)]
/// struct GetProduct {
///     sku: String,
/// }
///
/// impl Request for GetProduct {
///     type Response = String;
/// }
///
/// impl CacheableRequest for GetProduct {
///     fn cache_duration(&self) -> Option<Duration> {
///         Some(Duration::from_secs(30))
///     }
/// }
/// ```
pub trait CacheableRequest: Request<Response: Serialize + DeserializeOwned> + Serialize {
    /// Explicit key, used verbatim after the prefix instead of a content hash
    fn cache_key(&self) -> Option<String> {
        None
    }

    /// TTL for this request, overriding the configured default
    fn cache_duration(&self) -> Option<Duration> {
        None
    }

    /// Per-instance opt-in
    fn use_cache(&self) -> bool {
        true
    }
}
