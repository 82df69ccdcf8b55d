//! Named extension points and their factories.
//!
//! # Responsibility
//! - Map each extension-point name to exactly one factory.
//! - Produce instances lazily, on every lookup, outside of any lock.
//!
//! # Invariants
//! - A name is registered at most once and is never overwritten or removed.
//! - Concurrent registrations of the same name: exactly one caller succeeds.
//! - Lookups of unknown names return `None`, never an error.
//! - The registry does not log; callers decide whether an error is fatal.

use once_cell::sync::Lazy;
use std::any::Any;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

mod factory;

pub use factory::{Factory, Instance};
use factory::TypedFactory;

static GLOBAL_REGISTRY: Lazy<ExtensionRegistry> = Lazy::new(ExtensionRegistry::new);

/// Returns the process-wide registry.
///
/// Created empty on first use and kept until the process exits. Tests and
/// embedders that need isolation construct their own [`ExtensionRegistry`].
pub fn global() -> &'static ExtensionRegistry {
    &GLOBAL_REGISTRY
}

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    EmptyName,
    DuplicateRegistration(String),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "extension point name must not be empty"),
            Self::DuplicateRegistration(name) => {
                write!(f, "extension point {name} has already a registered factory")
            }
        }
    }
}

impl Error for RegistryError {}

/// Concurrency-safe registry of extension-point factories.
#[derive(Default)]
pub struct ExtensionRegistry {
    factories: RwLock<HashMap<String, Arc<dyn Factory>>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` for the extension point `name`.
    ///
    /// # Errors
    /// - `EmptyName` when `name` is empty or whitespace-only.
    /// - `DuplicateRegistration` when `name` already has a factory; the
    ///   registry is left unchanged.
    pub fn register(
        &self,
        name: &str,
        factory: impl Factory + 'static,
    ) -> Result<(), RegistryError> {
        self.register_shared(name, Arc::new(factory))
    }

    /// Registers a typed constructor; each lookup boxes a fresh `T`.
    pub fn register_with<F, T>(&self, name: &str, make: F) -> Result<(), RegistryError>
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Any + Send,
    {
        self.register_shared(name, Arc::new(TypedFactory::new(make)))
    }

    /// Registers an already shared factory.
    pub fn register_shared(
        &self,
        name: &str,
        factory: Arc<dyn Factory>,
    ) -> Result<(), RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let mut factories = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if factories.contains_key(name) {
            return Err(RegistryError::DuplicateRegistration(name.to_string()));
        }
        factories.insert(name.to_string(), factory);
        Ok(())
    }

    /// Produces a new instance for `name`, or `None` when nothing is
    /// registered under it.
    ///
    /// The factory runs after the read lock is released, so a slow or
    /// reentrant factory never blocks other lookups. Results are not cached.
    pub fn get(&self, name: &str) -> Option<Instance> {
        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()?;
        Some(factory.produce())
    }

    /// Like [`get`](Self::get), downcast to the capability type `T`.
    ///
    /// Returns `None` when the name is unknown or the instance is not a `T`.
    pub fn get_as<T: Any>(&self, name: &str) -> Option<T> {
        let instance = self.get(name)?;
        instance.downcast::<T>().ok().map(|boxed| *boxed)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Returns registered extension-point names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{global, ExtensionRegistry, Instance, RegistryError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn registers_and_gets_instance() {
        let registry = ExtensionRegistry::new();
        registry
            .register("greeter", || Box::new("hi") as Instance)
            .expect("greeter should register");

        let instance = registry.get("greeter").expect("greeter instance");
        assert_eq!(instance.downcast_ref::<&str>(), Some(&"hi"));
    }

    #[test]
    fn duplicate_registration_keeps_first_factory() {
        let registry = ExtensionRegistry::new();
        registry
            .register_with("greeter", || "hi")
            .expect("first registration should succeed");

        let err = registry
            .register_with("greeter", || "bye")
            .expect_err("duplicate registration must fail");
        assert_eq!(err, RegistryError::DuplicateRegistration("greeter".to_string()));
        assert!(err.to_string().contains("greeter"));
        assert_eq!(registry.get_as::<&str>("greeter"), Some("hi"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_blank_names() {
        let registry = ExtensionRegistry::new();
        assert_eq!(
            registry.register_with("", || 1_u8),
            Err(RegistryError::EmptyName)
        );
        assert_eq!(
            registry.register_with("   ", || 1_u8),
            Err(RegistryError::EmptyName)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_name_is_absent() {
        let registry = ExtensionRegistry::new();
        assert!(registry.get("missing").is_none());
        assert!(registry.get("").is_none());
        assert!(!registry.contains("missing"));
    }

    #[test]
    fn get_invokes_factory_on_every_call() {
        let registry = ExtensionRegistry::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let shared = Arc::clone(&counter);
        registry
            .register_with("counter", move || shared.fetch_add(1, Ordering::SeqCst) + 1)
            .expect("counter should register");

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(registry.get_as::<usize>("counter"), Some(1));
        assert_eq!(registry.get_as::<usize>("counter"), Some(2));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn get_as_returns_none_for_other_types() {
        let registry = ExtensionRegistry::new();
        registry
            .register_with("number", || 7_i64)
            .expect("number should register");
        assert_eq!(registry.get_as::<String>("number"), None);
        assert_eq!(registry.get_as::<i64>("number"), Some(7));
    }

    #[test]
    fn factory_may_reenter_registry() {
        let registry = Arc::new(ExtensionRegistry::new());
        registry
            .register_with("base", || 10_u32)
            .expect("base should register");
        let inner = Arc::clone(&registry);
        registry
            .register_with("derived", move || {
                inner.get_as::<u32>("base").unwrap_or_default() * 2
            })
            .expect("derived should register");

        assert_eq!(registry.get_as::<u32>("derived"), Some(20));
    }

    #[test]
    fn names_are_sorted() {
        let registry = ExtensionRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register_with(name, || ())
                .expect("distinct names should register");
        }
        assert_eq!(registry.names(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn global_registry_is_a_single_instance() {
        assert!(std::ptr::eq(global(), global()));
    }
}
