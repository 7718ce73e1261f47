//! Static type declarations standing in for runtime reflection
//!
//! A component is described once, by hand or through
//! `#[derive(Component)]`: which ancestors it can be viewed as, and which
//! constructors the injector may call.
//!
//! # Example
//!
//! ```rust
//! use component_injector::{upcast, Component};
//! use std::sync::Arc;
//!
//! trait Repository: Send + Sync {}
//!
//! #[derive(Default)]
//! struct MemoryRepository;
//! impl Repository for MemoryRepository {}
//!
//! struct UserService {
//!     repository: Arc<dyn Repository>,
//! }
//!
//! let repository = Component::<MemoryRepository>::new()
//!     .implements::<dyn Repository>(upcast!(dyn Repository))
//!     .default_constructor();
//!
//! let service = Component::<UserService>::new()
//!     .inject(|repository: Arc<dyn Repository>| UserService { repository });
//! # let _ = (repository, service);
//! ```

use crate::bean::{Bean, Upcast};
use crate::key::{Injectable, TypeKey};
use crate::{InjectError, Result};
use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

// =============================================================================
// Type Descriptor
// =============================================================================

/// A type's identity plus its direct ancestors (one level).
#[derive(Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    parents: Vec<Upcast>,
}

impl TypeDescriptor {
    pub(crate) fn new(key: TypeKey) -> Self {
        Self {
            key,
            parents: Vec::new(),
        }
    }

    /// Key of the described type.
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Directly declared ancestors.
    #[inline]
    pub fn parents(&self) -> &[Upcast] {
        &self.parents
    }

    pub(crate) fn push_parent(&mut self, upcast: Upcast) {
        if !self.parents.iter().any(|p| p.target() == upcast.target()) {
            self.parents.push(upcast);
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field(
                "parents",
                &self.parents.iter().map(Upcast::target).collect::<Vec<_>>(),
            )
            .finish()
    }
}

// =============================================================================
// Dependencies - constructor parameter lists
// =============================================================================

/// A constructor parameter list the injector can fill.
///
/// Implemented for:
/// - `()` - no parameters
/// - `Arc<T>` - a single parameter
/// - `(Arc<A>, Arc<B>, ...)` - tuples of 1 to 12 parameters
///
/// `T` may be a trait object; the injector resolves it through the
/// hierarchy map to the unique concrete type implementing it.
pub trait Dependencies: Sized + 'static {
    /// Parameter keys in declared order.
    fn keys() -> Vec<TypeKey>;

    /// Rebuild the typed parameter list from resolved beans.
    ///
    /// Returns `None` if the count or any type does not match.
    fn from_beans(beans: Vec<Bean>) -> Option<Self>;
}

impl Dependencies for () {
    #[inline]
    fn keys() -> Vec<TypeKey> {
        Vec::new()
    }

    #[inline]
    fn from_beans(beans: Vec<Bean>) -> Option<Self> {
        beans.is_empty().then_some(())
    }
}

impl<A: ?Sized + Injectable> Dependencies for Arc<A> {
    #[inline]
    fn keys() -> Vec<TypeKey> {
        vec![TypeKey::of::<A>()]
    }

    #[inline]
    fn from_beans(beans: Vec<Bean>) -> Option<Self> {
        let [bean] = <[Bean; 1]>::try_from(beans).ok()?;
        bean.downcast::<A>()
    }
}

macro_rules! impl_dependencies_tuple {
    ($($T:ident),+) => {
        impl<$($T: ?Sized + Injectable),+> Dependencies for ($(Arc<$T>,)+) {
            #[inline]
            fn keys() -> Vec<TypeKey> {
                vec![$(TypeKey::of::<$T>()),+]
            }

            #[inline]
            fn from_beans(beans: Vec<Bean>) -> Option<Self> {
                let mut iter = beans.into_iter();
                let deps = ($(iter.next()?.downcast::<$T>()?,)+);
                iter.next().is_none().then_some(deps)
            }
        }
    };
}

impl_dependencies_tuple!(A);
impl_dependencies_tuple!(A, B);
impl_dependencies_tuple!(A, B, C);
impl_dependencies_tuple!(A, B, C, D);
impl_dependencies_tuple!(A, B, C, D, E);
impl_dependencies_tuple!(A, B, C, D, E, F);
impl_dependencies_tuple!(A, B, C, D, E, F, G);
impl_dependencies_tuple!(A, B, C, D, E, F, G, H);
impl_dependencies_tuple!(A, B, C, D, E, F, G, H, I);
impl_dependencies_tuple!(A, B, C, D, E, F, G, H, I, J);
impl_dependencies_tuple!(A, B, C, D, E, F, G, H, I, J, K);
impl_dependencies_tuple!(A, B, C, D, E, F, G, H, I, J, K, L);

// =============================================================================
// Constructor
// =============================================================================

#[derive(Debug, thiserror::Error)]
#[error("resolved arguments do not match the constructor signature")]
struct ArgumentMismatch;

type BuildFn = Arc<dyn Fn(Vec<Bean>) -> Result<Bean> + Send + Sync>;

/// A way to build one instance from resolved parameters.
#[derive(Clone)]
pub struct Constructor {
    params: Vec<TypeKey>,
    build: BuildFn,
}

impl Constructor {
    fn fallible<T, D, E, F>(ctor: F) -> Self
    where
        T: Injectable,
        D: Dependencies,
        E: Error + Send + Sync + 'static,
        F: Fn(D) -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        Self {
            params: D::keys(),
            build: Arc::new(move |beans: Vec<Bean>| {
                let deps = D::from_beans(beans)
                    .ok_or_else(|| InjectError::instantiation_failed::<T, _>(ArgumentMismatch))?;
                ctor(deps)
                    .map(|value| Bean::new(Arc::new(value)))
                    .map_err(InjectError::instantiation_failed::<T, E>)
            }),
        }
    }

    fn infallible<T, D, F>(ctor: F) -> Self
    where
        T: Injectable,
        D: Dependencies,
        F: Fn(D) -> T + Send + Sync + 'static,
    {
        Self::fallible(move |deps: D| Ok::<T, std::convert::Infallible>(ctor(deps)))
    }

    /// Parameter keys in declared order.
    #[inline]
    pub fn params(&self) -> &[TypeKey] {
        &self.params
    }

    pub(crate) fn invoke(&self, args: Vec<Bean>) -> Result<Bean> {
        (self.build)(args)
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("params", &self.params)
            .finish()
    }
}

// =============================================================================
// Component
// =============================================================================

/// Erased description of a component type.
#[derive(Clone, Debug)]
pub struct ComponentDescriptor {
    ty: TypeDescriptor,
    injectable: Vec<Constructor>,
    niladic: Option<Constructor>,
}

impl ComponentDescriptor {
    /// Key of the component type.
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.ty.key()
    }

    /// Identity and declared ancestors.
    #[inline]
    pub fn type_descriptor(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// Constructors marked as injectable.
    #[inline]
    pub fn injectable_constructors(&self) -> &[Constructor] {
        &self.injectable
    }

    /// The zero-argument fallback constructor, if any.
    #[inline]
    pub fn niladic_constructor(&self) -> Option<&Constructor> {
        self.niladic.as_ref()
    }
}

/// Typed builder for a [`ComponentDescriptor`].
///
/// A usable component declares exactly one injectable constructor
/// ([`inject`](Self::inject) / [`try_inject`](Self::try_inject)) or none and a
/// niladic one ([`niladic`](Self::niladic) /
/// [`default_constructor`](Self::default_constructor)). Declaring more than
/// one injectable constructor is accepted here and rejected when the
/// injector validates the component.
pub struct Component<T> {
    descriptor: ComponentDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Injectable> Component<T> {
    /// Start describing `T`.
    pub fn new() -> Self {
        Self {
            descriptor: ComponentDescriptor {
                ty: TypeDescriptor::new(TypeKey::of::<T>()),
                injectable: Vec::new(),
                niladic: None,
            },
            _marker: PhantomData,
        }
    }

    /// Declare that `T` can be injected wherever `P` is requested.
    ///
    /// Use [`upcast!`](crate::upcast) for the cast. `P` must be spelled
    /// exactly as consumers request it (see [`TypeKey::of`]): a component
    /// declared as `dyn Repository` does not satisfy a parameter of type
    /// `Arc<dyn Repository + Send + Sync>`.
    ///
    /// ```rust
    /// use component_injector::{upcast, Component, Container, ContractViolation, InjectError};
    /// use std::sync::Arc;
    ///
    /// trait Repository: Send + Sync {}
    ///
    /// #[derive(Default)]
    /// struct MemoryRepository;
    /// impl Repository for MemoryRepository {}
    ///
    /// struct Service;
    ///
    /// let err = Container::builder()
    ///     .component(
    ///         Component::<MemoryRepository>::new()
    ///             .implements::<dyn Repository>(upcast!(dyn Repository))
    ///             .default_constructor(),
    ///     )
    ///     .component(Component::<Service>::new().inject(|_: Arc<dyn Repository + Send + Sync>| Service))
    ///     .build()
    ///     .unwrap_err();
    ///
    /// assert!(matches!(
    ///     err,
    ///     InjectError::ConstructorContract {
    ///         violation: ContractViolation::UnresolvableDependency { .. },
    ///         ..
    ///     }
    /// ));
    /// ```
    pub fn implements<P>(mut self, cast: impl Fn(Arc<T>) -> Arc<P> + Send + Sync + 'static) -> Self
    where
        P: ?Sized + Injectable,
    {
        self.descriptor.ty.push_parent(Upcast::new(cast));
        self
    }

    /// Add an injectable constructor.
    pub fn inject<D, F>(mut self, ctor: F) -> Self
    where
        D: Dependencies,
        F: Fn(D) -> T + Send + Sync + 'static,
    {
        self.descriptor.injectable.push(Constructor::infallible(ctor));
        self
    }

    /// Add an injectable constructor that may fail.
    ///
    /// A failure aborts the build with
    /// [`InjectError::InstantiationFailure`].
    pub fn try_inject<D, E, F>(mut self, ctor: F) -> Self
    where
        D: Dependencies,
        E: Error + Send + Sync + 'static,
        F: Fn(D) -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        self.descriptor.injectable.push(Constructor::fallible(ctor));
        self
    }

    /// Set the zero-argument constructor.
    pub fn niladic<F>(mut self, ctor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.descriptor.niladic = Some(Constructor::infallible(move |(): ()| ctor()));
        self
    }

    /// Use `T::default()` as the zero-argument constructor.
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.niladic(T::default)
    }

    /// Key of `T`.
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.descriptor.key()
    }

    /// Erase the type parameter.
    #[inline]
    pub fn into_descriptor(self) -> ComponentDescriptor {
        self.descriptor
    }
}

impl<T: Injectable> Default for Component<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Injectable> From<Component<T>> for ComponentDescriptor {
    fn from(component: Component<T>) -> Self {
        component.into_descriptor()
    }
}

// =============================================================================
// Interface
// =============================================================================

/// Declares the supertraits of a trait object key.
///
/// Only needed when a component is requested through a supertrait it does
/// not declare directly.
///
/// ```rust
/// use component_injector::{upcast, Interface};
///
/// trait Named: Send + Sync {}
/// trait Greeter: Named {}
///
/// let greeter = Interface::<dyn Greeter>::new().extends::<dyn Named>(upcast!(dyn Named));
/// # let _ = greeter;
/// ```
pub struct Interface<T: ?Sized> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn(Arc<T>)>,
}

impl<T: ?Sized + Injectable> Interface<T> {
    /// Start describing the abstract type `T`.
    pub fn new() -> Self {
        Self {
            descriptor: TypeDescriptor::new(TypeKey::of::<T>()),
            _marker: PhantomData,
        }
    }

    /// Declare `P` as a direct ancestor of `T`.
    pub fn extends<P>(mut self, cast: impl Fn(Arc<T>) -> Arc<P> + Send + Sync + 'static) -> Self
    where
        P: ?Sized + Injectable,
    {
        self.descriptor.push_parent(Upcast::new(cast));
        self
    }

    /// Erase the type parameter.
    #[inline]
    pub fn into_descriptor(self) -> TypeDescriptor {
        self.descriptor
    }
}

impl<T: ?Sized + Injectable> Default for Interface<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Injectable> From<Interface<T>> for TypeDescriptor {
    fn from(interface: Interface<T>) -> Self {
        interface.into_descriptor()
    }
}

// =============================================================================
// External beans
// =============================================================================

/// A pre-built instance handed to the injector.
pub struct External<T: ?Sized> {
    instance: Arc<T>,
    ty: TypeDescriptor,
}

impl<T: Injectable> External<T> {
    /// Wrap a value.
    pub fn new(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }
}

impl<T: ?Sized + Injectable> External<T> {
    /// Share an existing `Arc`; the container keeps the same allocation.
    pub fn from_arc(instance: Arc<T>) -> Self {
        Self {
            instance,
            ty: TypeDescriptor::new(TypeKey::of::<T>()),
        }
    }

    /// Declare that the instance can be injected wherever `P` is requested.
    pub fn implements<P>(mut self, cast: impl Fn(Arc<T>) -> Arc<P> + Send + Sync + 'static) -> Self
    where
        P: ?Sized + Injectable,
    {
        self.ty.push_parent(Upcast::new(cast));
        self
    }
}

/// Erased [`External`].
#[derive(Clone, Debug)]
pub struct ExternalBean {
    pub(crate) ty: TypeDescriptor,
    pub(crate) bean: Bean,
}

impl ExternalBean {
    /// Key of the instance's type.
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.ty.key()
    }
}

impl<T: ?Sized + Injectable> From<External<T>> for ExternalBean {
    fn from(external: External<T>) -> Self {
        Self {
            ty: external.ty,
            bean: Bean::new(external.instance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Store: Send + Sync {
        fn label(&self) -> String;
    }

    #[derive(Default)]
    struct Disk;

    impl Store for Disk {
        fn label(&self) -> String {
            "disk".into()
        }
    }

    struct Service {
        store: Arc<dyn Store>,
        count: Arc<u32>,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_dependencies_keys_in_declared_order() {
        assert!(<()>::keys().is_empty());
        assert_eq!(
            <(Arc<dyn Store>, Arc<u32>)>::keys(),
            vec![TypeKey::of::<dyn Store>(), TypeKey::of::<u32>()]
        );
    }

    #[test]
    fn test_dependencies_from_beans_checks_shape() {
        let store: Arc<dyn Store> = Arc::new(Disk);
        let beans = vec![Bean::new(store), Bean::new(Arc::new(7_u32))];
        let (store, count) = <(Arc<dyn Store>, Arc<u32>)>::from_beans(beans.clone()).unwrap();
        assert_eq!(store.label(), "disk");
        assert_eq!(*count, 7);

        // Wrong arity and swapped types both fail
        assert!(<(Arc<dyn Store>,)>::from_beans(beans.clone()).is_none());
        let swapped = vec![beans[1].clone(), beans[0].clone()];
        assert!(<(Arc<dyn Store>, Arc<u32>)>::from_beans(swapped).is_none());
        assert!(<()>::from_beans(beans).is_none());
    }

    #[test]
    fn test_component_constructor_invocation() {
        let component = Component::<Service>::new()
            .inject(|(store, count): (Arc<dyn Store>, Arc<u32>)| Service { store, count });
        let descriptor = component.into_descriptor();
        assert_eq!(descriptor.injectable_constructors().len(), 1);
        assert!(descriptor.niladic_constructor().is_none());

        let ctor = &descriptor.injectable_constructors()[0];
        let store: Arc<dyn Store> = Arc::new(Disk);
        let bean = ctor
            .invoke(vec![Bean::new(store), Bean::new(Arc::new(3_u32))])
            .unwrap();
        let service = bean.downcast::<Service>().unwrap();
        assert_eq!(service.store.label(), "disk");
        assert_eq!(*service.count, 3);
    }

    #[test]
    fn test_try_inject_failure_is_instantiation_failure() {
        let descriptor = Component::<Disk>::new()
            .try_inject(|(): ()| Err::<Disk, _>(Boom))
            .into_descriptor();
        let err = descriptor.injectable_constructors()[0]
            .invoke(Vec::new())
            .unwrap_err();
        assert!(matches!(err, InjectError::InstantiationFailure { .. }));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_duplicate_ancestor_declared_once() {
        let descriptor = Component::<Disk>::new()
            .implements::<dyn Store>(|this| -> Arc<dyn Store> { this })
            .implements::<dyn Store>(|this| -> Arc<dyn Store> { this })
            .default_constructor()
            .into_descriptor();
        assert_eq!(descriptor.type_descriptor().parents().len(), 1);
        assert!(descriptor.niladic_constructor().is_some());
    }
}
