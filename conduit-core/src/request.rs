//! Request, handler and behavior contracts

use crate::error::DispatchResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

/// Request trait
///
/// A request is one unit of intent. Its type selects exactly one handler.
pub trait Request: Send + Sync + 'static {
    /// Response type produced by the handler
    type Response: Send + 'static;
}

/// Placeholder response for requests that produce nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit;

/// Request handler trait
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync {
    /// Handle the request
    async fn handle(&self, request: R, cancellation: CancellationToken)
    -> DispatchResult<R::Response>;
}

/// Boxed future returned by pipeline stages.
pub type PipelineFuture<T> = Pin<Box<dyn Future<Output = DispatchResult<T>> + Send>>;

/// Continuation into the rest of the pipeline.
///
/// Takes the request back so a behavior can hand it on, or replace it.
pub type Next<R> = Box<dyn FnOnce(R) -> PipelineFuture<<R as Request>::Response> + Send>;

/// Pipeline behavior trait
///
/// Behaviors wrap handler invocation. A behavior that never calls `next`
/// short-circuits the pipeline and its return value becomes the result.
#[async_trait]
pub trait PipelineBehavior<R: Request>: Send + Sync {
    /// Process the request and optionally pass it on
    async fn handle(
        &self,
        request: R,
        cancellation: CancellationToken,
        next: Next<R>,
    ) -> DispatchResult<R::Response>;
}
