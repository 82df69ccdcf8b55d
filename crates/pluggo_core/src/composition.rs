//! Consumer-side hook for units synthesized by `multibuild`.
//!
//! A main crate invokes [`compose!`](crate::compose) once at its root. A
//! regular `cargo build` gets a no-op `pluggo_compose` function. When
//! `multibuild` drives the build it sets `--cfg pluggo_composed` and points
//! [`COMPOSITION_UNIT_ENV`] at the synthesized unit, which is included in
//! place and provides the real `pluggo_compose`, calling every linked
//! extension crate's [`ENTRY_POINT`].
//!
//! Main crates should declare the cfg to keep `unexpected_cfgs` quiet:
//!
//! ```toml
//! [lints.rust]
//! unexpected_cfgs = { level = "warn", check-cfg = ['cfg(pluggo_composed)'] }
//! ```

/// Name of the cfg flag set while building a composed binary.
pub const COMPOSED_CFG: &str = "pluggo_composed";

/// Environment variable holding the absolute path of the synthesized unit.
pub const COMPOSITION_UNIT_ENV: &str = "PLUGGO_COMPOSITION_UNIT";

/// Function every extension crate exposes at its root:
/// `pub fn pluggo_register(registry: &ExtensionRegistry) -> Result<(), RegistryError>`.
pub const ENTRY_POINT: &str = "pluggo_register";

/// Fails compilation when a composition unit is included by the wrong crate.
///
/// Evaluated in const context by the unit's namespace binding, so a mismatch
/// is a compile error rather than a runtime panic.
pub const fn assert_namespace(actual: &str, expected: &str) {
    if !const_str_eq(actual, expected) {
        panic!("composition unit was generated for a different crate");
    }
}

const fn const_str_eq(left: &str, right: &str) -> bool {
    let left = left.as_bytes();
    let right = right.as_bytes();
    if left.len() != right.len() {
        return false;
    }
    let mut index = 0;
    while index < left.len() {
        if left[index] != right[index] {
            return false;
        }
        index += 1;
    }
    true
}

/// Defines `pluggo_compose(&ExtensionRegistry) -> Result<(), RegistryError>`
/// at the call site.
#[macro_export]
macro_rules! compose {
    () => {
        #[cfg(pluggo_composed)]
        mod pluggo_composition {
            #[allow(unused_imports)]
            use $crate::{assert_namespace, ExtensionRegistry, RegistryError};

            include!(env!("PLUGGO_COMPOSITION_UNIT"));
        }

        #[cfg(pluggo_composed)]
        use pluggo_composition::compose as pluggo_compose;

        #[cfg(not(pluggo_composed))]
        fn pluggo_compose(
            _registry: &$crate::ExtensionRegistry,
        ) -> ::std::result::Result<(), $crate::RegistryError> {
            Ok(())
        }
    };
}
