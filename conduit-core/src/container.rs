// Dependency resolution for handlers and behaviors

use crate::error::{DispatchError, DispatchResult};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Type-erased shared instance.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Source of handler and behavior dependencies.
///
/// Hosts plug their own container in here. [`Container`] is a ready-made
/// implementation.
pub trait Resolver: Send + Sync {
    /// Resolve the most recently registered instance of a type
    fn resolve_erased(&self, type_id: TypeId) -> Option<Instance>;

    /// Resolve every instance of a type, in registration order
    fn resolve_all_erased(&self, type_id: TypeId) -> Vec<Instance>;
}

impl dyn Resolver + '_ {
    /// Resolve a dependency by type
    pub fn resolve<T: Any + Send + Sync>(&self) -> DispatchResult<Arc<T>> {
        let type_name = std::any::type_name::<T>();
        self.try_resolve::<T>()
            .ok_or_else(|| DispatchError::resolution(type_name, "no instance registered"))
    }

    /// Resolve a dependency that may legitimately be absent
    pub fn try_resolve<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.resolve_erased(TypeId::of::<T>())
            .and_then(|any| any.downcast::<T>().ok())
    }

    /// Resolve every registered instance of a type
    pub fn resolve_all<T: Any + Send + Sync>(&self) -> Vec<Arc<T>> {
        self.resolve_all_erased(TypeId::of::<T>())
            .into_iter()
            .filter_map(|any| any.downcast::<T>().ok())
            .collect()
    }
}

/// Simple type-keyed container
///
/// Populated at startup, then shared read-only behind an `Arc`.
#[derive(Default)]
pub struct Container {
    instances: HashMap<TypeId, Vec<Instance>>,
}

impl Container {
    pub fn new() -> Self {
        debug!("Creating new DI container");
        Self::default()
    }

    /// Register an instance
    pub fn register<T: Any + Send + Sync>(&mut self, instance: T) -> &mut Self {
        self.register_arc(Arc::new(instance))
    }

    /// Register an already shared instance
    pub fn register_arc<T: Any + Send + Sync>(&mut self, instance: Arc<T>) -> &mut Self {
        let type_name = std::any::type_name::<T>();
        self.instances
            .entry(TypeId::of::<T>())
            .or_default()
            .push(instance);

        debug!(provider = type_name, "Provider registered in container");
        self
    }

    /// Check if a type is registered
    pub fn has<T: Any + Send + Sync>(&self) -> bool {
        let exists = self.instances.contains_key(&TypeId::of::<T>());
        trace!(provider = std::any::type_name::<T>(), exists, "Checked provider existence");
        exists
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl Resolver for Container {
    fn resolve_erased(&self, type_id: TypeId) -> Option<Instance> {
        self.instances
            .get(&type_id)
            .and_then(|instances| instances.last().cloned())
    }

    fn resolve_all_erased(&self, type_id: TypeId) -> Vec<Instance> {
        self.instances.get(&type_id).cloned().unwrap_or_default()
    }
}
