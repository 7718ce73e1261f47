//! # Component Injector
//!
//! A small dependency injection container with constructor injection,
//! interface (trait object) resolution, cycle detection and a validated,
//! ordered bootstrap.
//!
//! ## Features
//!
//! - **Validated up front** - conflicting registrations, unusable
//!   constructors, unresolvable parameters and dependency cycles are all
//!   reported before a single component is built
//! - **Trait object resolution** - a component can be injected through any
//!   trait it declares, as long as exactly one registered type implements it
//! - **Ordered bootstrap** - components are built dependencies first
//! - **Per-consumer factories** - a factory learns which type it is
//!   producing a value for
//! - **On-demand construction** - `new_instance` builds unshared objects
//!   from the wired container after bootstrap
//! - **Observable** - optional `tracing` events with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use component_injector::{upcast, Component, Container, External};
//! use std::sync::Arc;
//!
//! trait Repository: Send + Sync {
//!     fn name(&self) -> &'static str;
//! }
//!
//! #[derive(Default)]
//! struct PostgresRepository;
//!
//! impl Repository for PostgresRepository {
//!     fn name(&self) -> &'static str {
//!         "postgres"
//!     }
//! }
//!
//! struct Config {
//!     page_size: usize,
//! }
//!
//! struct UserService {
//!     repository: Arc<dyn Repository>,
//!     config: Arc<Config>,
//! }
//!
//! let container = Container::builder()
//!     .bean(External::new(Config { page_size: 20 }))
//!     .component(
//!         Component::<PostgresRepository>::new()
//!             .implements::<dyn Repository>(upcast!(dyn Repository))
//!             .default_constructor(),
//!     )
//!     .component(Component::<UserService>::new().inject(
//!         |(repository, config): (Arc<dyn Repository>, Arc<Config>)| UserService { repository, config },
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let users = container.get::<UserService>().unwrap();
//! assert_eq!(users.repository.name(), "postgres");
//! assert_eq!(users.config.page_size, 20);
//! ```
//!
//! ## Per-consumer factories
//!
//! ```rust
//! use component_injector::{Component, Container, Factory, TypeKey};
//! use std::sync::Arc;
//!
//! struct Logger {
//!     scope: &'static str,
//! }
//!
//! struct Billing {
//!     logger: Arc<Logger>,
//! }
//!
//! let container = Container::builder()
//!     .factory(Factory::<Logger>::new(|consumer: &TypeKey| {
//!         Arc::new(Logger { scope: consumer.name() })
//!     }))
//!     .component(Component::<Billing>::new().inject(|logger: Arc<Logger>| Billing { logger }))
//!     .build()
//!     .unwrap();
//!
//! let billing = container.get::<Billing>().unwrap();
//! assert!(billing.logger.scope.ends_with("Billing"));
//! ```
//!
//! ## Bootstrap
//!
//! [`InjectorBuilder::build`] runs, in order:
//!
//! 1. conflict detection (a type supplied twice)
//! 2. [hierarchy resolution](hierarchy): which trait objects identify
//!    exactly one registered type
//! 3. [constructor validation](contract)
//! 4. [cycle detection](cycle)
//! 5. [scheduling](schedule): dependencies first
//! 6. instantiation, registering each component under every key that
//!    resolves to it
//!
//! After `build` the container is read-only and freely shareable across
//! threads.

mod bean;
mod catalog;
mod container;
pub mod contract;
pub mod cycle;
mod descriptor;
mod error;
mod factory;
pub mod hierarchy;
mod key;
#[cfg(feature = "logging")]
pub mod logging;
pub mod schedule;
mod storage;

pub use bean::*;
pub use catalog::*;
pub use container::*;
pub use descriptor::*;
pub use error::*;
pub use factory::*;
pub use hierarchy::HierarchyMap;
pub use key::*;

#[cfg(feature = "derive")]
pub use component_injector_derive::Component;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        upcast, Catalog, Component, Container, ContainerRef, Discoverable, External, Factory,
        InjectError, Injectable, Interface, Result, TypeKey,
    };
    pub use std::sync::Arc;
}
