//! Service registration sink and the read-only application context.

use crate::error::PluginHostError;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct Slot {
    type_name: &'static str,
    value: Box<dyn Any + Send + Sync>,
}

/// Typed registry plugins fill during `configure_services`.
///
/// Holds two kinds of entries, both keyed by Rust type:
/// - singletons (`insert`/`get`), typically `Arc<Service>` or `Arc<dyn Trait>`
/// - ordered collections (`add`/`all`), e.g. every module's seeder
///
/// Values are cloned out, so store cheap handles.
#[derive(Default)]
pub struct ServiceRegistry {
    singletons: HashMap<TypeId, Slot>,
    collections: HashMap<TypeId, Slot>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a singleton, returning the value it replaced.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        let slot = Slot {
            type_name: type_name::<T>(),
            value: Box::new(value),
        };
        self.singletons
            .insert(TypeId::of::<T>(), slot)
            .and_then(|previous| previous.value.downcast::<T>().ok())
            .map(|previous| *previous)
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.singletons
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.value.downcast_ref::<T>())
            .cloned()
    }

    /// Like [`ServiceRegistry::get`], failing with the missing type's name.
    pub fn require<T: Clone + Send + Sync + 'static>(&self) -> Result<T, PluginHostError> {
        self.get::<T>()
            .ok_or(PluginHostError::ServiceNotRegistered(type_name::<T>()))
    }

    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.singletons.contains_key(&TypeId::of::<T>())
    }

    /// Appends to the collection of `T`, preserving registration order.
    pub fn add<T: Clone + Send + Sync + 'static>(&mut self, item: T) {
        let slot = self
            .collections
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Slot {
                type_name: type_name::<T>(),
                value: Box::new(Vec::<T>::new()),
            });
        if let Some(items) = slot.value.downcast_mut::<Vec<T>>() {
            items.push(item);
        }
    }

    /// Every item added for `T`, in registration order.
    pub fn all<T: Clone + Send + Sync + 'static>(&self) -> Vec<T> {
        self.collections
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.value.downcast_ref::<Vec<T>>())
            .cloned()
            .unwrap_or_default()
    }

    /// Type names of registered singletons, sorted (for diagnostics).
    pub fn service_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.singletons.values().map(|s| s.type_name).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut collections: Vec<_> = self.collections.values().map(|s| s.type_name).collect();
        collections.sort_unstable();
        f.debug_struct("ServiceRegistry")
            .field("singletons", &self.service_names())
            .field("collections", &collections)
            .finish()
    }
}

/// What plugins see during activation: the frozen registry plus the
/// startup cancellation signal.
#[derive(Debug, Clone)]
pub struct ApplicationContext {
    services: Arc<ServiceRegistry>,
    cancel: CancellationToken,
}

impl ApplicationContext {
    pub fn new(services: ServiceRegistry, cancel: CancellationToken) -> Self {
        Self {
            services: Arc::new(services),
            cancel,
        }
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.services.get::<T>()
    }

    pub fn require<T: Clone + Send + Sync + 'static>(&self) -> Result<T, PluginHostError> {
        self.services.require::<T>()
    }

    pub fn all<T: Clone + Send + Sync + 'static>(&self) -> Vec<T> {
        self.services.all::<T>()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".into()
        }
    }

    #[test]
    fn insert_and_get_trait_object() {
        let mut registry = ServiceRegistry::new();
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        assert!(registry.insert(greeter).is_none());

        let found = registry.get::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(found.greet(), "hello");
        assert!(registry.contains::<Arc<dyn Greeter>>());
    }

    #[test]
    fn insert_replaces_and_returns_previous() {
        let mut registry = ServiceRegistry::new();
        registry.insert(1u32);
        assert_eq!(registry.insert(2u32), Some(1));
        assert_eq!(registry.get::<u32>(), Some(2));
    }

    #[test]
    fn require_missing_names_the_type() {
        let registry = ServiceRegistry::new();
        let err = registry.require::<Arc<String>>().unwrap_err();
        assert!(matches!(err, PluginHostError::ServiceNotRegistered(name) if name.contains("String")));
    }

    #[test]
    fn collections_preserve_registration_order() {
        let mut registry = ServiceRegistry::new();
        registry.add("first");
        registry.add("second");
        registry.add("third");
        assert_eq!(registry.all::<&'static str>(), vec!["first", "second", "third"]);
        assert!(registry.all::<u8>().is_empty());
    }

    #[test]
    fn singletons_and_collections_are_separate() {
        let mut registry = ServiceRegistry::new();
        registry.insert(7u64);
        registry.add(8u64);
        assert_eq!(registry.get::<u64>(), Some(7));
        assert_eq!(registry.all::<u64>(), vec![8]);
    }

    #[test]
    fn context_exposes_frozen_registry() {
        let mut registry = ServiceRegistry::new();
        registry.insert(Arc::new(String::from("db")));
        let ctx = ApplicationContext::new(registry, CancellationToken::new());
        assert_eq!(ctx.require::<Arc<String>>().unwrap().as_str(), "db");
        assert!(!ctx.cancellation().is_cancelled());
    }
}
