//! Deferred constructors for extension-point implementations.

use std::any::Any;

/// Opaque instance produced by a factory.
///
/// The concrete type is part of the contract between the consumer and the
/// extension crate; the registry never inspects it.
pub type Instance = Box<dyn Any + Send>;

/// Produces one implementation instance per call.
///
/// Any `Fn() -> Instance` closure is a factory, so extension crates can pass
/// plain closures, function items or their own factory objects.
pub trait Factory: Send + Sync {
    fn produce(&self) -> Instance;
}

impl<F> Factory for F
where
    F: Fn() -> Instance + Send + Sync,
{
    fn produce(&self) -> Instance {
        self()
    }
}

/// Adapts a typed constructor into a [`Factory`].
pub(crate) struct TypedFactory<F> {
    make: F,
}

impl<F> TypedFactory<F> {
    pub(crate) fn new(make: F) -> Self {
        Self { make }
    }
}

impl<F, T> Factory for TypedFactory<F>
where
    F: Fn() -> T + Send + Sync,
    T: Any + Send,
{
    fn produce(&self) -> Instance {
        Box::new((self.make)())
    }
}
