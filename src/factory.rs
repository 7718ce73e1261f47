//! Per-consumer factories
//!
//! A factory is not a zero-argument supplier: it receives the key of the
//! type being constructed and may specialize its output for that consumer
//! (a logger named after the component that asked for it, for instance).
//! It is invoked once per injected parameter, every time.

use crate::bean::{Bean, Upcast};
use crate::descriptor::TypeDescriptor;
use crate::key::{Injectable, TypeKey};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Type-erased produce function
type ProduceFn = Arc<dyn Fn(&TypeKey) -> Bean + Send + Sync>;

/// Typed builder for a [`ContextualFactory`].
///
/// # Examples
///
/// ```rust
/// use component_injector::{Factory, TypeKey};
/// use std::sync::Arc;
///
/// struct Logger {
///     name: &'static str,
/// }
///
/// let factory = Factory::<Logger>::new(|consumer: &TypeKey| {
///     Arc::new(Logger { name: consumer.name() })
/// });
/// # let _ = factory;
/// ```
pub struct Factory<T: ?Sized> {
    ty: TypeDescriptor,
    produce: ProduceFn,
    _marker: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Injectable> Factory<T> {
    /// Create a factory producing `T` for the given consumer.
    pub fn new<F>(produce: F) -> Self
    where
        F: Fn(&TypeKey) -> Arc<T> + Send + Sync + 'static,
    {
        Self {
            ty: TypeDescriptor::new(TypeKey::of::<T>()),
            produce: Arc::new(move |consumer: &TypeKey| Bean::new(produce(consumer))),
            _marker: PhantomData,
        }
    }

    /// Declare that the produced values can be injected wherever `P` is
    /// requested.
    pub fn implements<P>(mut self, cast: impl Fn(Arc<T>) -> Arc<P> + Send + Sync + 'static) -> Self
    where
        P: ?Sized + Injectable,
    {
        self.ty.push_parent(Upcast::new(cast));
        self
    }
}

/// Erased [`Factory`].
#[derive(Clone)]
pub struct ContextualFactory {
    pub(crate) ty: TypeDescriptor,
    produce: ProduceFn,
}

impl ContextualFactory {
    /// Key of the produced type.
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.ty.key()
    }

    /// Produce a value for `consumer`.
    #[inline]
    pub fn produce(&self, consumer: &TypeKey) -> Bean {
        #[cfg(feature = "logging")]
        trace!(
            target: "component_injector",
            produced = self.ty.key().name(),
            consumer = consumer.name(),
            "Invoking factory"
        );

        (self.produce)(consumer)
    }
}

impl fmt::Debug for ContextualFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextualFactory")
            .field("ty", &self.ty)
            .finish_non_exhaustive()
    }
}

impl<T: ?Sized + Injectable> From<Factory<T>> for ContextualFactory {
    fn from(factory: Factory<T>) -> Self {
        Self {
            ty: factory.ty,
            produce: factory.produce,
        }
    }
}
