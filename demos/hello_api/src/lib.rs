//! Capability contract shared by the hello demo app and its plugins.

/// Extension point the demo app looks up.
pub const HELLO_EXTENSION_POINT: &str = "hello";

/// Capability a `hello` extension provides.
pub trait Hello: Send {
    fn greeting(&self) -> String;
}

/// Instance type registered under [`HELLO_EXTENSION_POINT`].
pub type BoxedHello = Box<dyn Hello>;
