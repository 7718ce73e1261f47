//! A note-taking client wired by the injector
//!
//! Shows the pieces working together:
//! - external beans (an HTTP client, shared application state)
//! - a per-consumer logger factory
//! - services injected through traits
//! - per-screen controllers built on demand through `ContainerRef`
//!
//! Run with:
//!   cargo run --example notes_client

use component_injector::{
    upcast, Catalog, Component, Container, ContainerRef, Discoverable, External, Factory, Result,
    TypeKey,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

// =============================================================================
// External beans
// =============================================================================

struct HttpClient {
    base_url: String,
}

impl HttpClient {
    fn get(&self, path: &str) -> String {
        format!("GET {}{}", self.base_url, path)
    }
}

/// Mutable application state shared by every service
#[derive(Default)]
struct Context {
    user: Mutex<Option<String>>,
    open_space: Mutex<Option<String>>,
}

// =============================================================================
// Logger factory
// =============================================================================

struct Logger {
    scope: &'static str,
}

impl Logger {
    fn info(&self, message: &str) {
        println!("  [{}] {message}", self.scope);
    }
}

fn logger_factory() -> Factory<Logger> {
    Factory::new(|consumer: &TypeKey| {
        let name = consumer.name();
        Arc::new(Logger {
            scope: name.rsplit("::").next().unwrap_or(name),
        })
    })
}

// =============================================================================
// Services
// =============================================================================

trait RestService: Send + Sync {
    fn fetch(&self, path: &str) -> String;
}

struct RestServiceImpl {
    client: Arc<HttpClient>,
    logger: Arc<Logger>,
}

impl RestService for RestServiceImpl {
    fn fetch(&self, path: &str) -> String {
        self.logger.info(&format!("fetching {path}"));
        self.client.get(path)
    }
}

impl Discoverable for RestServiceImpl {
    fn descriptor() -> Component<Self> {
        Component::new()
            .implements::<dyn RestService>(upcast!(dyn RestService))
            .inject(|(client, logger): (Arc<HttpClient>, Arc<Logger>)| RestServiceImpl { client, logger })
    }
}

trait SettingsService: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

struct SettingsServiceImpl {
    values: BTreeMap<&'static str, String>,
}

impl SettingsService for SettingsServiceImpl {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl Discoverable for SettingsServiceImpl {
    fn descriptor() -> Component<Self> {
        Component::new()
            .implements::<dyn SettingsService>(upcast!(dyn SettingsService))
            .niladic(|| SettingsServiceImpl {
                values: BTreeMap::from([("theme", "dark".to_string())]),
            })
    }
}

trait NoteService: Send + Sync {
    fn open_space(&self, space: &str) -> String;
}

struct NoteServiceImpl {
    rest: Arc<dyn RestService>,
    context: Arc<Context>,
}

impl NoteService for NoteServiceImpl {
    fn open_space(&self, space: &str) -> String {
        if let Ok(mut open) = self.context.open_space.lock() {
            *open = Some(space.to_string());
        }
        self.rest.fetch(&format!("/space/{space}"))
    }
}

impl Discoverable for NoteServiceImpl {
    fn descriptor() -> Component<Self> {
        Component::new()
            .implements::<dyn NoteService>(upcast!(dyn NoteService))
            .inject(|(rest, context): (Arc<dyn RestService>, Arc<Context>)| NoteServiceImpl { rest, context })
    }
}

// =============================================================================
// Screens
// =============================================================================

static SCREENS_BUILT: AtomicU32 = AtomicU32::new(0);

/// One controller per displayed screen, never shared
struct SpaceController {
    id: u32,
    notes: Arc<dyn NoteService>,
    logger: Arc<Logger>,
}

impl Discoverable for SpaceController {
    fn descriptor() -> Component<Self> {
        Component::new().inject(|(notes, logger): (Arc<dyn NoteService>, Arc<Logger>)| SpaceController {
            id: SCREENS_BUILT.fetch_add(1, Ordering::SeqCst),
            notes,
            logger,
        })
    }
}

struct UiService {
    container: Arc<ContainerRef>,
    settings: Arc<dyn SettingsService>,
    logger: Arc<Logger>,
}

impl UiService {
    fn show_space(&self, space: &str) -> Result<Arc<SpaceController>> {
        let controller = self.container.new_instance::<SpaceController>()?;
        self.logger.info(&format!(
            "screen #{} for {space} (theme: {})",
            controller.id,
            self.settings.get("theme").unwrap_or_default()
        ));
        controller.logger.info(&controller.notes.open_space(space));
        Ok(controller)
    }
}

impl Discoverable for UiService {
    fn descriptor() -> Component<Self> {
        Component::new().inject(
            |(container, settings, logger): (Arc<ContainerRef>, Arc<dyn SettingsService>, Arc<Logger>)| {
                UiService {
                    container,
                    settings,
                    logger,
                }
            },
        )
    }
}

fn main() -> Result<()> {
    println!("=== Notes Client Demo ===\n");

    let context = Arc::new(Context::default());

    let catalog = Catalog::new()
        .discover::<UiService>()
        .discover::<NoteServiceImpl>()
        .discover::<SettingsServiceImpl>()
        .discover::<RestServiceImpl>();

    let container = Container::builder()
        .discover(catalog)
        .bean(External::new(HttpClient {
            base_url: "http://localhost:8080".into(),
        }))
        .bean(External::from_arc(Arc::clone(&context)))
        .factory(logger_factory())
        .build()?;

    if let Ok(mut user) = context.user.lock() {
        *user = Some("datafox".into());
    }

    let ui = container.get::<UiService>()?;
    let first = ui.show_space("inbox")?;
    let second = ui.show_space("projects")?;

    println!();
    println!("  screens are distinct: {}", !Arc::ptr_eq(&first, &second));
    println!(
        "  screens share NoteService: {}",
        Arc::ptr_eq(&first.notes, &second.notes)
    );
    println!(
        "  open space: {:?}, user: {:?}",
        context.open_space.lock().map(|s| s.clone()).unwrap_or_default(),
        context.user.lock().map(|u| u.clone()).unwrap_or_default()
    );
    println!("  registered keys: {}", container.len());

    println!("\n=== Demo Complete ===");
    Ok(())
}
