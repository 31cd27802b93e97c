//! Request dispatch

use crate::container::{Container, Resolver};
use crate::error::{DispatchError, DispatchResult};
use crate::pipeline::Pipeline;
use crate::registry::{HandlerRegistry, Registrations};
use crate::request::{Request, Unit};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Dispatcher
///
/// Routes each request to its registered handler through the applicable
/// behaviors. Holds only the frozen registry and the resolver, so one
/// instance can serve any number of concurrent dispatches.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    resolver: Arc<dyn Resolver>,
}

impl Dispatcher {
    /// Create a dispatcher over an existing registry
    pub fn new(registry: Arc<HandlerRegistry>, resolver: Arc<dyn Resolver>) -> Self {
        debug!(handler_count = registry.len(), "Creating dispatcher");
        Self { registry, resolver }
    }

    /// Create a dispatcher builder
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Shared handle to the registry
    pub fn registry(&self) -> Arc<HandlerRegistry> {
        self.registry.clone()
    }

    /// Dispatch a request and return its response
    ///
    /// Faults raised by the handler or a behavior are returned unchanged.
    pub async fn dispatch<R: Request>(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> DispatchResult<R::Response> {
        let request_type = std::any::type_name::<R>();
        trace!(request_type, "Dispatching request");

        if cancellation.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }

        let pipeline = self.pipeline::<R>(cancellation.clone())?;

        let result = tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(DispatchError::Cancelled),
            result = pipeline.run(request) => result,
        };

        match &result {
            Ok(_) => trace!(request_type, "Request dispatched"),
            Err(error) => debug!(request_type, error = %error, kind = error.kind(), "Dispatch failed"),
        }

        result
    }

    /// Dispatch a request that may be absent
    ///
    /// `None` fails with [`DispatchError::InvalidArgument`] before any
    /// handler or behavior is constructed.
    pub async fn dispatch_optional<R: Request>(
        &self,
        request: Option<R>,
        cancellation: CancellationToken,
    ) -> DispatchResult<R::Response> {
        match request {
            Some(request) => self.dispatch(request, cancellation).await,
            None => Err(DispatchError::invalid_argument(format!(
                "request of type {} is required",
                std::any::type_name::<R>()
            ))),
        }
    }

    /// Dispatch a request that produces no response
    pub async fn dispatch_unit<R>(
        &self,
        request: R,
        cancellation: CancellationToken,
    ) -> DispatchResult<()>
    where
        R: Request<Response = Unit>,
    {
        self.dispatch(request, cancellation).await.map(|Unit| ())
    }

    /// Resolve the handler and behaviors for `R` and compose them
    ///
    /// Nothing runs until [`Pipeline::run`] is called.
    pub fn pipeline<R: Request>(&self, cancellation: CancellationToken) -> DispatchResult<Pipeline<R>> {
        let descriptor = self
            .registry
            .lookup_type::<R>()
            .ok_or(DispatchError::HandlerNotFound {
                request_type: std::any::type_name::<R>(),
            })?;

        let resolver = self.resolver.as_ref();
        let handler = descriptor.create_handler::<R>(resolver)?;
        let behaviors = descriptor.create_behaviors::<R>(resolver)?;

        trace!(
            request_type = descriptor.request_type_name(),
            handler = descriptor.handler_type_name(),
            behavior_count = behaviors.len(),
            "Building pipeline"
        );

        Ok(Pipeline::build(behaviors, handler, cancellation))
    }
}

/// Builder for [`Dispatcher`]
#[derive(Default)]
pub struct DispatcherBuilder {
    registrations: Registrations,
    resolver: Option<Arc<dyn Resolver>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the registrations to freeze into the registry
    pub fn registrations(mut self, registrations: Registrations) -> Self {
        self.registrations = registrations;
        self
    }

    /// Set the resolver (an empty [`Container`] is used otherwise)
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Build the registry and the dispatcher
    pub fn build(self) -> Dispatcher {
        let resolver = self
            .resolver
            .unwrap_or_else(|| Arc::new(Container::new()));
        let registry = Arc::new(HandlerRegistry::build(self.registrations));
        Dispatcher::new(registry, resolver)
    }
}

/// Host setup entry point
///
/// Freezes `registrations` and returns the registry together with a
/// dispatcher over it, both meant to live for the rest of the process.
pub fn configure(
    registrations: Registrations,
    resolver: Arc<dyn Resolver>,
) -> (Arc<HandlerRegistry>, Dispatcher) {
    let dispatcher = Dispatcher::builder()
        .registrations(registrations)
        .resolver(resolver)
        .build();
    (dispatcher.registry(), dispatcher)
}
