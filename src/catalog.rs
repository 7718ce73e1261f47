//! Component discovery
//!
//! There is no classpath to scan, so the set of components is an explicit,
//! ordered list. A type opts in by implementing [`Discoverable`] (or deriving
//! `Component`), or is added as a hand-written [`Component`] descriptor.

use crate::descriptor::{Component, ComponentDescriptor, Interface, TypeDescriptor};
use crate::key::{Injectable, TypeKey};

#[cfg(feature = "logging")]
use tracing::trace;

/// A type that describes how the injector should build it.
///
/// # Examples
///
/// ```rust
/// use component_injector::{Catalog, Component, Discoverable};
///
/// #[derive(Default)]
/// struct Clock;
///
/// impl Discoverable for Clock {
///     fn descriptor() -> Component<Self> {
///         Component::new().default_constructor()
///     }
/// }
///
/// let catalog = Catalog::new().discover::<Clock>();
/// assert_eq!(catalog.len(), 1);
/// ```
pub trait Discoverable: Injectable + Sized {
    /// Describe `Self`.
    fn descriptor() -> Component<Self>;
}

/// An ordered set of discovered components and interface declarations.
///
/// Order is kept so that diagnostics and equal-priority instantiation are
/// reproducible.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    components: Vec<ComponentDescriptor>,
    interfaces: Vec<TypeDescriptor>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `T` through its [`Discoverable`] implementation.
    pub fn discover<T: Discoverable>(self) -> Self {
        self.component(T::descriptor())
    }

    /// Add a component description.
    pub fn component(mut self, component: impl Into<ComponentDescriptor>) -> Self {
        let component = component.into();

        #[cfg(feature = "logging")]
        trace!(
            target: "component_injector",
            component = component.key().name(),
            "Component added to catalog"
        );

        self.components.push(component);
        self
    }

    /// Declare the supertraits of a trait object.
    pub fn interface<T: ?Sized + Injectable>(mut self, interface: Interface<T>) -> Self {
        self.interfaces.push(interface.into_descriptor());
        self
    }

    /// Append everything from `other`, keeping order.
    pub fn merge(mut self, other: Catalog) -> Self {
        self.components.extend(other.components);
        self.interfaces.extend(other.interfaces);
        self
    }

    /// Discovered components, in discovery order.
    #[inline]
    pub fn components(&self) -> &[ComponentDescriptor] {
        &self.components
    }

    /// Declared interfaces.
    #[inline]
    pub fn interfaces(&self) -> &[TypeDescriptor] {
        &self.interfaces
    }

    /// Whether `key` was discovered as a component.
    pub fn contains(&self, key: TypeKey) -> bool {
        self.components.iter().any(|c| c.key() == key)
    }

    /// Number of discovered components.
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether nothing was discovered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<ComponentDescriptor>, Vec<TypeDescriptor>) {
        (self.components, self.interfaces)
    }
}
