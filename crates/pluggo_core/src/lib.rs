//! In-process extension registry for compile-time composed programs.
//!
//! Extension crates register factories against named extension points;
//! consumers look them up by name and receive a fresh instance per lookup.
//! The `multibuild` tool links extension crates into a main crate through
//! the [`compose!`] hook.

pub mod composition;
pub mod registry;

pub use composition::{assert_namespace, COMPOSED_CFG, COMPOSITION_UNIT_ENV, ENTRY_POINT};
pub use registry::{global, ExtensionRegistry, Factory, Instance, RegistryError};
