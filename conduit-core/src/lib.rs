//! Request dispatching for Conduit
//!
//! Commands and queries are plain types implementing [`Request`]. Each
//! request type has exactly one [`RequestHandler`], and any number of
//! [`PipelineBehavior`]s wrap that handler to add cross-cutting work such as
//! logging or caching.
//!
//! ## Features
//!
//! - **Typed dispatch** - `dispatch::<R>` returns `R::Response`, no casting at the call site
//! - **Pipeline behaviors** - ordered wrappers that may short-circuit the handler
//! - **Capabilities** - one behavior rule applied to every request type that opts in
//! - **Cancellation** - a [`CancellationToken`] flows through every stage
//!
//! ## Quick Start
//!
//! ```
//! use conduit_core::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct GetGreeting {
//!     name: String,
//! }
//!
//! impl Request for GetGreeting {
//!     type Response = String;
//! }
//!
//! #[derive(Default)]
//! struct GetGreetingHandler;
//!
//! #[async_trait]
//! impl RequestHandler<GetGreeting> for GetGreetingHandler {
//!     async fn handle(
//!         &self,
//!         request: GetGreeting,
//!         _cancellation: CancellationToken,
//!     ) -> DispatchResult<String> {
//!         Ok(format!("hello, {}", request.name))
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let registrations = Registrations::new()
//!     .handler_default::<GetGreeting, GetGreetingHandler>()
//!     .behavior::<GetGreeting, LoggingBehavior, _>(|_| Ok(LoggingBehavior::new()));
//!
//! let (_registry, dispatcher) = configure(registrations, Arc::new(Container::new()));
//!
//! let greeting = dispatcher
//!     .dispatch(GetGreeting { name: "ada".into() }, CancellationToken::new())
//!     .await
//!     .unwrap();
//! assert_eq!(greeting, "hello, ada");
//! # });
//! ```

pub mod behaviors;
pub mod container;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod registry;
pub mod request;

pub use behaviors::LoggingBehavior;
pub use container::{Container, Instance, Resolver};
pub use dispatcher::{Dispatcher, DispatcherBuilder, configure};
pub use error::{BoxError, DispatchError, DispatchResult};
pub use pipeline::Pipeline;
pub use registry::{Capability, HandlerDescriptor, HandlerRegistry, Registrations};
pub use request::{Next, PipelineBehavior, PipelineFuture, Request, RequestHandler, Unit};

pub use async_trait::async_trait;
pub use tokio_util::sync::CancellationToken;
