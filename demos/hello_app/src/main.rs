//! Demo consumer: greets through whichever `hello` extension was linked in.

use hello_api::{BoxedHello, HELLO_EXTENSION_POINT};

pluggo_core::compose!();

fn main() {
    let registry = pluggo_core::global();
    if let Err(err) = pluggo_compose(registry) {
        eprintln!("hello_app: extension registration failed: {err}");
        std::process::exit(1);
    }

    match registry.get_as::<BoxedHello>(HELLO_EXTENSION_POINT) {
        Some(hello) => println!("{}", hello.greeting()),
        None => println!("no hello extension linked"),
    }
}
