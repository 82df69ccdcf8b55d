//! Demo extension crate providing the `hello` extension point.

use hello_api::{BoxedHello, Hello, HELLO_EXTENSION_POINT};
use pluggo_core::{ExtensionRegistry, RegistryError};

struct HelloPlugin;

impl Hello for HelloPlugin {
    fn greeting(&self) -> String {
        "Hello pluggo".to_string()
    }
}

/// Entry point called by the composition unit.
///
/// Registers only; the instance is built on the first lookup.
pub fn pluggo_register(registry: &ExtensionRegistry) -> Result<(), RegistryError> {
    registry.register_with(HELLO_EXTENSION_POINT, || Box::new(HelloPlugin) as BoxedHello)
}
