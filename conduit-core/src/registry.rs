//! Handler registration and lookup
//!
//! Handlers and behaviors are registered explicitly through [`Registrations`]
//! and frozen into a [`HandlerRegistry`] once at startup. Each registry entry
//! already carries the ordered behavior factories that apply to its request
//! type, so a dispatch is one hash probe followed by instance construction.

use crate::container::{Instance, Resolver};
use crate::error::{DispatchError, DispatchResult};
use crate::request::{PipelineBehavior, Request, RequestHandler};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

type HandlerFactory<R> =
    Arc<dyn Fn(&dyn Resolver) -> DispatchResult<Arc<dyn RequestHandler<R>>> + Send + Sync>;

type BehaviorFactory<R> =
    Arc<dyn Fn(&dyn Resolver) -> DispatchResult<Arc<dyn PipelineBehavior<R>>> + Send + Sync>;

/// Wrapper for typed handler factories
struct TypedHandlerFactory<R: Request> {
    create: HandlerFactory<R>,
}

/// Wrapper for typed behavior factories
struct TypedBehaviorFactory<R: Request> {
    create: BehaviorFactory<R>,
}

/// Named behavior category a request type can opt into.
///
/// Open behavior rules registered with [`Registrations::open_behavior`] apply
/// to every request type that declared the same capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capability(&'static str);

impl Capability {
    /// Create a capability with the given name
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Capability name
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Clone)]
struct BehaviorEntry {
    name: &'static str,
    factory: Instance,
}

struct HandlerRegistration {
    request_type: TypeId,
    request_name: &'static str,
    response_type: TypeId,
    response_name: &'static str,
    handler_name: &'static str,
    factory: Instance,
}

struct CapabilityRegistration {
    request_type: TypeId,
    capability: Capability,
    entry: BehaviorEntry,
}

enum BehaviorRule {
    Exact {
        request_type: TypeId,
        response_type: TypeId,
        entry: BehaviorEntry,
    },
    Open(Capability),
}

/// Ordered list of handler and behavior registrations
///
/// # Examples
///
/// ```
/// use conduit_core::*;
/// use async_trait::async_trait;
///
/// struct Double(i64);
///
/// impl Request for Double {
///     type Response = i64;
/// }
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
/// let registrations = Registrations::new().handler_default::<Double, DoubleHandler>();
/// let registry = HandlerRegistry::build(registrations);
/// assert!(registry.lookup_type::<Double>().is_some());
/// ```
#[derive(Default)]
pub struct Registrations {
    handlers: Vec<HandlerRegistration>,
    capabilities: Vec<CapabilityRegistration>,
    rules: Vec<BehaviorRule>,
}

impl Registrations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler built per dispatch by `factory`
    pub fn handler<R, H, F>(mut self, factory: F) -> Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
        F: Fn(&dyn Resolver) -> DispatchResult<H> + Send + Sync + 'static,
    {
        let create: HandlerFactory<R> = Arc::new(move |resolver: &dyn Resolver| {
            factory(resolver).map(|handler| Arc::new(handler) as Arc<dyn RequestHandler<R>>)
        });

        self.handlers.push(HandlerRegistration {
            request_type: TypeId::of::<R>(),
            request_name: std::any::type_name::<R>(),
            response_type: TypeId::of::<R::Response>(),
            response_name: std::any::type_name::<R::Response>(),
            handler_name: std::any::type_name::<H>(),
            factory: Arc::new(TypedHandlerFactory { create }),
        });
        self
    }

    /// Register a handler constructed with `Default`
    pub fn handler_default<R, H>(self) -> Self
    where
        R: Request,
        H: RequestHandler<R> + Default + 'static,
    {
        self.handler::<R, H, _>(|_| Ok(H::default()))
    }

    /// Register a behavior bound to the exact `(R, R::Response)` pair
    pub fn behavior<R, B, F>(mut self, factory: F) -> Self
    where
        R: Request,
        B: PipelineBehavior<R> + 'static,
        F: Fn(&dyn Resolver) -> DispatchResult<B> + Send + Sync + 'static,
    {
        self.rules.push(BehaviorRule::Exact {
            request_type: TypeId::of::<R>(),
            response_type: TypeId::of::<R::Response>(),
            entry: behavior_entry::<R, B, F>(factory),
        });
        self
    }

    /// Declare that `R` belongs to `capability`, supplying its behavior factory
    ///
    /// The behavior only runs where a matching [`open_behavior`](Self::open_behavior)
    /// rule sits in the ordered rule list.
    pub fn capability<R, B, F>(mut self, capability: Capability, factory: F) -> Self
    where
        R: Request,
        B: PipelineBehavior<R> + 'static,
        F: Fn(&dyn Resolver) -> DispatchResult<B> + Send + Sync + 'static,
    {
        self.capabilities.push(CapabilityRegistration {
            request_type: TypeId::of::<R>(),
            capability,
            entry: behavior_entry::<R, B, F>(factory),
        });
        self
    }

    /// Add an open rule applying to every request that declared `capability`
    pub fn open_behavior(mut self, capability: Capability) -> Self {
        self.rules.push(BehaviorRule::Open(capability));
        self
    }

    /// Number of handler registrations (duplicates included)
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

fn behavior_entry<R, B, F>(factory: F) -> BehaviorEntry
where
    R: Request,
    B: PipelineBehavior<R> + 'static,
    F: Fn(&dyn Resolver) -> DispatchResult<B> + Send + Sync + 'static,
{
    let create: BehaviorFactory<R> = Arc::new(move |resolver: &dyn Resolver| {
        factory(resolver).map(|behavior| Arc::new(behavior) as Arc<dyn PipelineBehavior<R>>)
    });

    BehaviorEntry {
        name: std::any::type_name::<B>(),
        factory: Arc::new(TypedBehaviorFactory { create }),
    }
}

/// Frozen registry entry for one request type
pub struct HandlerDescriptor {
    request_type: TypeId,
    request_name: &'static str,
    response_type: TypeId,
    response_name: &'static str,
    handler_name: &'static str,
    factory: Instance,
    behaviors: Vec<BehaviorEntry>,
}

impl HandlerDescriptor {
    pub fn request_type_id(&self) -> TypeId {
        self.request_type
    }

    pub fn response_type_id(&self) -> TypeId {
        self.response_type
    }

    pub fn request_type_name(&self) -> &'static str {
        self.request_name
    }

    pub fn response_type_name(&self) -> &'static str {
        self.response_name
    }

    pub fn handler_type_name(&self) -> &'static str {
        self.handler_name
    }

    /// Names of the applicable behaviors, outermost first
    pub fn behavior_names(&self) -> Vec<&'static str> {
        self.behaviors.iter().map(|entry| entry.name).collect()
    }

    /// Build a fresh handler instance
    pub fn create_handler<R: Request>(
        &self,
        resolver: &dyn Resolver,
    ) -> DispatchResult<Arc<dyn RequestHandler<R>>> {
        match self.factory.downcast_ref::<TypedHandlerFactory<R>>() {
            Some(factory) => (factory.create)(resolver),
            None => Err(DispatchError::TypeMismatch {
                expected: std::any::type_name::<R>(),
            }),
        }
    }

    /// Build fresh behavior instances, in pipeline order
    pub fn create_behaviors<R: Request>(
        &self,
        resolver: &dyn Resolver,
    ) -> DispatchResult<Vec<Arc<dyn PipelineBehavior<R>>>> {
        self.behaviors
            .iter()
            .map(|entry| match entry.factory.downcast_ref::<TypedBehaviorFactory<R>>() {
                Some(factory) => (factory.create)(resolver),
                None => Err(DispatchError::TypeMismatch {
                    expected: std::any::type_name::<R>(),
                }),
            })
            .collect()
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("request", &self.request_name)
            .field("response", &self.response_name)
            .field("handler", &self.handler_name)
            .field("behaviors", &self.behavior_names())
            .finish()
    }
}

/// Immutable request-type to handler mapping
///
/// Read-only after [`build`](Self::build); lookups need no synchronization.
pub struct HandlerRegistry {
    handlers: HashMap<TypeId, HandlerDescriptor>,
}

impl HandlerRegistry {
    /// Freeze registrations into a registry
    ///
    /// An empty registration list yields a valid, empty registry. A second
    /// handler for the same request type replaces the first.
    pub fn build(registrations: Registrations) -> Self {
        let Registrations {
            handlers: handler_registrations,
            capabilities: capability_registrations,
            rules,
        } = registrations;

        let mut capabilities: HashMap<(TypeId, Capability), BehaviorEntry> = HashMap::new();
        for registration in capability_registrations {
            capabilities.insert(
                (registration.request_type, registration.capability),
                registration.entry,
            );
        }

        let mut handlers: HashMap<TypeId, HandlerDescriptor> =
            HashMap::with_capacity(handler_registrations.len());

        for registration in handler_registrations {
            let behaviors: Vec<BehaviorEntry> = rules
                .iter()
                .filter_map(|rule| match rule {
                    BehaviorRule::Exact {
                        request_type,
                        response_type,
                        entry,
                    } if *request_type == registration.request_type
                        && *response_type == registration.response_type =>
                    {
                        Some(entry.clone())
                    }
                    BehaviorRule::Exact { .. } => None,
                    BehaviorRule::Open(capability) => capabilities
                        .get(&(registration.request_type, *capability))
                        .cloned(),
                })
                .collect();

            let descriptor = HandlerDescriptor {
                request_type: registration.request_type,
                request_name: registration.request_name,
                response_type: registration.response_type,
                response_name: registration.response_name,
                handler_name: registration.handler_name,
                factory: registration.factory,
                behaviors,
            };

            debug!(
                request_type = descriptor.request_name,
                handler = descriptor.handler_name,
                behavior_count = descriptor.behaviors.len(),
                "Handler registered"
            );

            if let Some(previous) = handlers.insert(descriptor.request_type, descriptor) {
                warn!(
                    request_type = previous.request_name,
                    replaced_handler = previous.handler_name,
                    "Duplicate handler registration, keeping the last one"
                );
            }
        }

        debug!(handler_count = handlers.len(), "Handler registry built");
        Self { handlers }
    }

    /// Look up the descriptor for a request type
    pub fn lookup(&self, request_type: TypeId) -> Option<&HandlerDescriptor> {
        self.handlers.get(&request_type)
    }

    /// Look up the descriptor for `R`
    pub fn lookup_type<R: Request>(&self) -> Option<&HandlerDescriptor> {
        self.lookup(TypeId::of::<R>())
    }

    pub fn contains(&self, request_type: TypeId) -> bool {
        self.handlers.contains_key(&request_type)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Names of all registered request types
    pub fn request_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.values().map(|descriptor| descriptor.request_name)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handlers.values().collect::<Vec<_>>())
            .finish()
    }
}
