//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```
//!
//! `RUST_LOG=component_injector=trace` also shows lookups and factory calls.

use component_injector::{Component, Container, Factory, InjectError, TypeKey, upcast};
use std::sync::Arc;

trait Repository: Send + Sync {}

#[derive(Default)]
struct PostgresRepository;

impl Repository for PostgresRepository {}

struct Logger {
    scope: &'static str,
}

#[allow(dead_code)]
struct UserService {
    repository: Arc<dyn Repository>,
    logger: Arc<Logger>,
}

struct Left;
struct Right;

fn main() {
    component_injector::logging::init();

    println!("=== Component Injector Logging Demo ===\n");

    // Bootstrap (logs every phase at INFO, per-component decisions at DEBUG)
    let container = Container::builder()
        .factory(Factory::<Logger>::new(|consumer: &TypeKey| {
            Arc::new(Logger {
                scope: consumer.name(),
            })
        }))
        .component(
            Component::<PostgresRepository>::new()
                .implements::<dyn Repository>(upcast!(dyn Repository))
                .default_constructor(),
        )
        .component(Component::<UserService>::new().inject(
            |(repository, logger): (Arc<dyn Repository>, Arc<Logger>)| UserService { repository, logger },
        ))
        .build()
        .expect("wiring is valid");

    // Lookups (logs: "Looking up bean")
    let users = container.get::<UserService>().expect("UserService is wired");
    println!("  UserService logger scope: {}", users.logger.scope);
    assert!(container.try_get::<i32>().is_none());

    // A failed bootstrap (logs up to the failing phase)
    let err = Container::builder()
        .component(Component::<Left>::new().inject(|_: Arc<Right>| Left))
        .component(Component::<Right>::new().inject(|_: Arc<Left>| Right))
        .build()
        .unwrap_err();
    assert!(matches!(err, InjectError::CyclicDependency { .. }));
    println!("  rejected: {err}");

    println!("\n=== Demo Complete ===");
    println!("Check the log output above to see structured logging in action!");
    println!("\nTip: Use --features logging-json for production (JSON output)");
    println!("     Use --features logging-pretty for development (colorful output)");
}
