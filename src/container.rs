//! The dependency injection container
//!
//! A [`Container`] is produced once by [`InjectorBuilder::build`], which runs
//! the whole bootstrap pipeline: conflict detection, hierarchy resolution,
//! constructor validation, cycle detection, scheduling and instantiation.
//! Any wiring mistake aborts the build; a partially wired container is never
//! returned.
//!
//! # Concurrency
//!
//! Bootstrap is single-threaded. Once `build` returns, the registry is never
//! written again, so a `Container` (and every clone of it) can be shared
//! across threads and read without synchronization. `new_instance` only reads
//! the registry and allocates a fresh object, so concurrent calls need no
//! locking either.

use crate::bean::Bean;
use crate::catalog::{Catalog, Discoverable};
use crate::contract::{self, ComponentSpec};
use crate::cycle::CycleDetector;
use crate::descriptor::{Component, ComponentDescriptor, External, ExternalBean, Interface};
use crate::error::Source;
use crate::factory::ContextualFactory;
use crate::hierarchy::{self, HierarchyMap};
use crate::key::{Injectable, TypeKey};
use crate::schedule::schedule;
use crate::storage::{Registry, TypeGraph};
use crate::{InjectError, Result};
use ahash::RandomState;
use once_cell::sync::OnceCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};

#[cfg(feature = "logging")]
use tracing::{debug, info, trace};

// =============================================================================
// Builder
// =============================================================================

/// Collects everything the injector needs, then wires it in one go.
///
/// # Examples
///
/// ```rust
/// use component_injector::{Component, Container, External};
/// use std::sync::Arc;
///
/// struct Logger;
///
/// struct Service {
///     logger: Arc<Logger>,
/// }
///
/// let container = Container::builder()
///     .bean(External::new(Logger))
///     .component(Component::<Service>::new().inject(|logger: Arc<Logger>| Service { logger }))
///     .build()
///     .unwrap();
///
/// let service = container.get::<Service>().unwrap();
/// assert!(Arc::ptr_eq(&service.logger, &container.get::<Logger>().unwrap()));
/// ```
#[derive(Default)]
pub struct InjectorBuilder {
    catalog: Catalog,
    beans: Vec<ExternalBean>,
    factories: Vec<ContextualFactory>,
}

impl InjectorBuilder {
    /// Start with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every component and interface of `catalog`.
    pub fn discover(mut self, catalog: Catalog) -> Self {
        self.catalog = self.catalog.merge(catalog);
        self
    }

    /// Add a single component.
    pub fn component(mut self, component: impl Into<ComponentDescriptor>) -> Self {
        self.catalog = self.catalog.component(component);
        self
    }

    /// Declare the supertraits of a trait object.
    pub fn interface<T: ?Sized + Injectable>(mut self, interface: Interface<T>) -> Self {
        self.catalog = self.catalog.interface(interface);
        self
    }

    /// Add a pre-built instance.
    pub fn bean(mut self, bean: impl Into<ExternalBean>) -> Self {
        self.beans.push(bean.into());
        self
    }

    /// Add a pre-built instance with no declared ancestors.
    pub fn instance<T: Injectable>(self, value: T) -> Self {
        self.bean(External::new(value))
    }

    /// Add a per-consumer factory.
    pub fn factory(mut self, factory: impl Into<ContextualFactory>) -> Self {
        self.factories.push(factory.into());
        self
    }

    /// Wire everything and instantiate every component.
    ///
    /// # Errors
    ///
    /// - [`InjectError::BeanConflict`] if a type is supplied twice
    /// - [`InjectError::ConstructorContract`] if a component cannot be built
    /// - [`InjectError::CyclicDependency`] if components depend on each other
    /// - [`InjectError::InstantiationFailure`] if a constructor fails
    pub fn build(self) -> Result<Container> {
        let Self {
            catalog,
            mut beans,
            factories,
        } = self;
        let (components, interfaces) = catalog.into_parts();

        #[cfg(feature = "logging")]
        info!(
            target: "component_injector",
            components = components.len(),
            beans = beans.len(),
            factories = factories.len(),
            "Starting injector bootstrap"
        );

        // The container is available to its own components as a bean
        let cell: Arc<OnceCell<Weak<Registry>>> = Arc::new(OnceCell::new());
        beans.push(External::new(ContainerRef { cell: Arc::clone(&cell) }).into());

        check_conflicts(&components, &beans, &factories)?;

        let mut graph = TypeGraph::default();
        components.iter().for_each(|c| graph.declare(c.type_descriptor()));
        interfaces.iter().for_each(|i| graph.declare(i));
        beans.iter().for_each(|b| graph.declare(&b.ty));
        factories.iter().for_each(|f| graph.declare(&f.ty));

        #[cfg(feature = "logging")]
        info!(target: "component_injector", "Resolving type hierarchy");

        let concrete = components
            .iter()
            .map(ComponentDescriptor::key)
            .chain(beans.iter().map(ExternalBean::key))
            .chain(factories.iter().map(ContextualFactory::key));
        let hierarchy = hierarchy::resolve(concrete, |key: &TypeKey| graph.parents_of(key));

        #[cfg(feature = "logging")]
        info!(target: "component_injector", "Checking constructor contracts");

        let supplied: HashSet<TypeKey, RandomState> = beans
            .iter()
            .map(ExternalBean::key)
            .chain(factories.iter().map(ContextualFactory::key))
            .collect();
        let specs = components
            .iter()
            .map(|component| contract::validate(component, &hierarchy, &supplied))
            .collect::<Result<Vec<ComponentSpec>>>()?;
        let index: HashMap<TypeKey, usize, RandomState> =
            specs.iter().enumerate().map(|(i, spec)| (spec.key(), i)).collect();

        #[cfg(feature = "logging")]
        info!(target: "component_injector", "Checking cyclic dependencies");

        CycleDetector::new(&hierarchy, |key: &TypeKey| {
            index.get(key).and_then(|i| specs[*i].dependencies())
        })
        .check_all(specs.iter().map(ComponentSpec::key))
        .map_err(|cycle| InjectError::CyclicDependency {
            path: cycle.path.iter().map(TypeKey::name).collect(),
        })?;

        #[cfg(feature = "logging")]
        info!(target: "component_injector", "Scheduling component instantiation");

        let keys: Vec<TypeKey> = specs.iter().map(ComponentSpec::key).collect();
        let order = schedule(&keys, &hierarchy, supplied.iter().copied(), |key: &TypeKey| {
            index
                .get(key)
                .and_then(|i| specs[*i].dependencies())
                .map(<[TypeKey]>::to_vec)
        })
        .map_err(|stalled| InjectError::Unschedulable {
            remaining: stalled.remaining.iter().map(TypeKey::name).collect(),
        })?;

        let mut registry = Registry::new(hierarchy);
        for bean in beans {
            registry.insert_external(&graph, bean);
        }
        for factory in factories {
            registry.insert_factory(&graph, factory);
        }

        #[cfg(feature = "logging")]
        info!(target: "component_injector", "Instantiating components");

        for scheduled in order {
            let Some(spec) = index.get(&scheduled.key).map(|i| &specs[*i]) else {
                continue;
            };

            #[cfg(feature = "logging")]
            debug!(
                target: "component_injector",
                component = spec.key().name(),
                priority = scheduled.priority,
                "Instantiating component"
            );

            let bean = registry.instantiate(spec.key(), spec.constructor())?;
            registry.insert_component(&graph, spec.key(), bean);
        }

        let registry = Arc::new(registry);
        // A fresh cell: nothing else can have set it
        let _ = cell.set(Arc::downgrade(&registry));

        #[cfg(feature = "logging")]
        info!(
            target: "component_injector",
            instances = registry.len(),
            "Injector bootstrap complete"
        );

        Ok(Container { registry })
    }
}

/// Fail if any key is supplied by more than one source.
fn check_conflicts(
    components: &[ComponentDescriptor],
    beans: &[ExternalBean],
    factories: &[ContextualFactory],
) -> Result<()> {
    let mut seen: HashMap<TypeKey, Source, RandomState> = HashMap::default();

    let sources = components
        .iter()
        .map(|c| (c.key(), Source::Component))
        .chain(beans.iter().map(|b| (b.key(), Source::Bean)))
        .chain(factories.iter().map(|f| (f.key(), Source::Factory)));

    for (key, source) in sources {
        if let Some(first) = seen.insert(key, source) {
            return Err(InjectError::BeanConflict {
                type_name: key.name(),
                first,
                second: source,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Container
// =============================================================================

/// A fully wired, read-only container.
///
/// Cloning is cheap and every clone shares the same instances.
#[derive(Clone)]
pub struct Container {
    registry: Arc<Registry>,
}

impl Container {
    /// Start configuring a container.
    #[inline]
    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::new()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// The instance registered under `T`, which may be a concrete type or a
    /// trait object that uniquely identifies one.
    ///
    /// Never constructs anything and never invokes factories.
    pub fn get<T: ?Sized + Injectable>(&self) -> Result<Arc<T>> {
        self.try_get::<T>().ok_or_else(InjectError::not_found::<T>)
    }

    /// Like [`get`](Self::get), returning `None` when absent.
    #[inline]
    pub fn try_get<T: ?Sized + Injectable>(&self) -> Option<Arc<T>> {
        #[cfg(feature = "logging")]
        trace!(
            target: "component_injector",
            bean = std::any::type_name::<T>(),
            "Looking up bean"
        );

        self.registry
            .instance(&TypeKey::of::<T>())
            .and_then(|bean| bean.downcast::<T>())
    }

    /// Erased lookup by key.
    #[inline]
    pub fn get_bean(&self, key: &TypeKey) -> Option<Bean> {
        self.registry.instance(key)
    }

    /// Whether an instance is registered under `T`.
    #[inline]
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.registry.instance(&TypeKey::of::<T>()).is_some()
    }

    /// Number of keys with an instance.
    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Whether no instance is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Every key with an instance.
    pub fn registered_types(&self) -> Vec<TypeKey> {
        self.registry.instance_keys().collect()
    }

    /// The resolved hierarchy the container was wired with.
    #[inline]
    pub fn hierarchy(&self) -> &HierarchyMap {
        self.registry.hierarchy()
    }

    /// A weak handle to this container.
    pub fn handle(&self) -> ContainerRef {
        ContainerRef {
            cell: Arc::new(OnceCell::with_value(Arc::downgrade(&self.registry))),
        }
    }

    // =========================================================================
    // On-demand construction
    // =========================================================================

    /// Build a new, unshared `T` from the wired instances and factories.
    ///
    /// Uses the same constructor rules as bootstrap. `T` does not need to be
    /// a registered component, and the container is not modified.
    ///
    /// # Errors
    ///
    /// - [`InjectError::ConstructorContract`] if `T` has no usable constructor
    /// - [`InjectError::MissingDependency`] if a parameter cannot be supplied
    /// - [`InjectError::InstantiationFailure`] if the constructor fails
    pub fn new_instance<T: Discoverable>(&self) -> Result<Arc<T>> {
        self.new_instance_of(T::descriptor())
    }

    /// Like [`new_instance`](Self::new_instance), with an explicit
    /// description of `T`.
    pub fn new_instance_of<T: Injectable>(&self, component: Component<T>) -> Result<Arc<T>> {
        let descriptor = component.into_descriptor();
        let spec = contract::select(&descriptor)?;

        #[cfg(feature = "logging")]
        debug!(
            target: "component_injector",
            component = spec.key().name(),
            "Creating new instance"
        );

        self.registry
            .instantiate(spec.key(), spec.constructor())?
            .downcast::<T>()
            .ok_or_else(InjectError::not_found::<T>)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("instances", &self.registry.len())
            .field("hierarchy", &self.registry.hierarchy().len())
            .finish()
    }
}

// =============================================================================
// Self reference
// =============================================================================

/// Handle to the container, injectable into components.
///
/// Every container registers one of these as an external bean, so a
/// component can take `Arc<ContainerRef>` and create objects on demand
/// after bootstrap. The handle is weak: it does not keep the container
/// alive.
#[derive(Clone)]
pub struct ContainerRef {
    cell: Arc<OnceCell<Weak<Registry>>>,
}

impl ContainerRef {
    /// The container, if bootstrap has finished and it is still alive.
    ///
    /// # Errors
    ///
    /// [`InjectError::ContainerUnavailable`] when called from a constructor
    /// during bootstrap, or after the container has been dropped.
    pub fn container(&self) -> Result<Container> {
        self.cell
            .get()
            .and_then(Weak::upgrade)
            .map(|registry| Container { registry })
            .ok_or(InjectError::ContainerUnavailable)
    }

    /// See [`Container::get`].
    pub fn get<T: ?Sized + Injectable>(&self) -> Result<Arc<T>> {
        self.container()?.get::<T>()
    }

    /// See [`Container::new_instance`].
    pub fn new_instance<T: Discoverable>(&self) -> Result<Arc<T>> {
        self.container()?.new_instance::<T>()
    }

    /// See [`Container::new_instance_of`].
    pub fn new_instance_of<T: Injectable>(&self, component: Component<T>) -> Result<Arc<T>> {
        self.container()?.new_instance_of(component)
    }
}

impl fmt::Debug for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerRef")
            .field("available", &self.container().is_ok())
            .finish()
    }
}
