use pluggo_core::{ExtensionRegistry, Instance, RegistryError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 16;

#[test]
fn same_name_registered_concurrently_succeeds_exactly_once() {
    for _ in 0..50 {
        let registry = ExtensionRegistry::new();
        let barrier = Barrier::new(THREADS);

        let results: Vec<Result<(), RegistryError>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..THREADS)
                .map(|index| {
                    let registry = &registry;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        registry.register_with("contended", move || index)
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("registering thread panicked"))
                .collect()
        });

        let successes = results.iter().filter(|result| result.is_ok()).count();
        assert_eq!(successes, 1);
        for result in results.iter().filter(|result| result.is_err()) {
            assert_eq!(
                result,
                &Err(RegistryError::DuplicateRegistration("contended".to_string()))
            );
        }
        assert_eq!(registry.len(), 1);
    }
}

#[test]
fn distinct_names_registered_concurrently_all_succeed() {
    let registry = ExtensionRegistry::new();
    let barrier = Barrier::new(THREADS);

    thread::scope(|scope| {
        for index in 0..THREADS {
            let registry = &registry;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                registry
                    .register_with(&format!("ep{index}"), move || index)
                    .expect("distinct name should register");
            });
        }
    });

    assert_eq!(registry.len(), THREADS);
    for index in 0..THREADS {
        assert_eq!(registry.get_as::<usize>(&format!("ep{index}")), Some(index));
    }
}

#[test]
fn slow_factory_does_not_block_other_lookups() {
    let registry = Arc::new(ExtensionRegistry::new());
    let entered = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));

    let factory_entered = Arc::clone(&entered);
    let factory_release = Arc::clone(&release);
    registry
        .register("slow", move || {
            factory_entered.wait();
            factory_release.wait();
            Box::new("slow") as Instance
        })
        .expect("slow should register");
    registry
        .register_with("fast", || "fast")
        .expect("fast should register");

    let slow_registry = Arc::clone(&registry);
    let slow = thread::spawn(move || slow_registry.get_as::<&str>("slow"));

    entered.wait();
    // The slow factory is now running; lookups and writes must not wait for it.
    assert_eq!(registry.get_as::<&str>("fast"), Some("fast"));
    registry
        .register_with("late", || 1_u8)
        .expect("late should register while a factory runs");
    release.wait();

    assert_eq!(slow.join().expect("slow lookup panicked"), Some("slow"));
}

#[test]
fn greeter_end_to_end() {
    let registry = ExtensionRegistry::new();
    registry
        .register_with("greeter", || "hi")
        .expect("greeter should register");
    assert_eq!(registry.get_as::<&str>("greeter"), Some("hi"));

    let err = registry
        .register_with("greeter", || "hello")
        .expect_err("second greeter must be rejected");
    assert!(matches!(err, RegistryError::DuplicateRegistration(ref name) if name == "greeter"));
    assert_eq!(registry.get_as::<&str>("greeter"), Some("hi"));
}

#[test]
fn repeated_lookups_observe_fresh_instances() {
    let registry = ExtensionRegistry::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    registry
        .register_with("ticket", move || counter.fetch_add(1, Ordering::SeqCst))
        .expect("ticket should register");

    let observed: Vec<usize> = (0..3)
        .filter_map(|_| registry.get_as::<usize>("ticket"))
        .collect();
    assert_eq!(observed, vec![0, 1, 2]);
    assert!(registry.get("never-registered").is_none());
}
