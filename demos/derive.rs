//! Example demonstrating #[derive(Component)]
//!
//! Run with:
//!   cargo run --example derive --features derive

use component_injector::{Catalog, Component, Container, External};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// Supplied from outside
struct Database {
    url: String,
}

trait Cache: Send + Sync {
    fn capacity(&self) -> usize;
}

#[derive(Component)]
#[component(implements(dyn Cache))]
struct LruCache {
    // Not injected: Default
    hits: AtomicU64,
}

impl Cache for LruCache {
    fn capacity(&self) -> usize {
        1024
    }
}

#[derive(Component)]
struct UserService {
    #[inject]
    db: Arc<Database>,
    #[inject]
    cache: Arc<dyn Cache>,
    request_count: AtomicU64,
}

impl UserService {
    fn describe(&self) -> String {
        format!(
            "UserService on {} with cache capacity {} (requests: {})",
            self.db.url,
            self.cache.capacity(),
            self.request_count.fetch_add(1, Ordering::Relaxed)
        )
    }
}

// Built per request, never registered
#[derive(Component)]
struct ApiController {
    #[inject]
    users: Arc<UserService>,
}

fn main() {
    println!("=== Component Injector Derive Macro Demo ===\n");

    let catalog = Catalog::new()
        .discover::<UserService>()
        .discover::<LruCache>();

    let container = Container::builder()
        .discover(catalog)
        .bean(External::new(Database {
            url: "postgres://localhost:5432/myapp".into(),
        }))
        .build()
        .expect("wiring is valid");

    let users = container.get::<UserService>().expect("UserService is wired");
    println!("  {}", users.describe());

    let cache = container.get::<LruCache>().expect("LruCache is wired");
    cache.hits.fetch_add(1, Ordering::Relaxed);
    println!("  LruCache hits: {}", cache.hits.load(Ordering::Relaxed));

    // Two controllers, same shared service
    let first = container.new_instance::<ApiController>().expect("controller");
    let second = container.new_instance::<ApiController>().expect("controller");
    println!(
        "  controllers distinct: {}, share UserService: {}",
        !Arc::ptr_eq(&first, &second),
        Arc::ptr_eq(&first.users, &second.users)
    );
    println!("  {}", second.users.describe());

    println!("\n=== Demo Complete ===");
    println!("\n#[derive(Component)] generated a `Discoverable` impl that:");
    println!("  - Turns #[inject] fields into constructor parameters");
    println!("  - Declares the traits from #[component(implements(...))]");
    println!("  - Uses Default::default() for the other fields");
}
