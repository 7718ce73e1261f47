//! Type-erased instances and ancestor casts
//!
//! Every value the injector hands out is an `Arc<T>`. To store instances of
//! unrelated (and possibly unsized) types in one map, a [`Bean`] boxes the
//! `Arc<T>` itself behind `Arc<dyn Any + Send + Sync>`. The same object can
//! therefore be registered under its concrete key and under each trait
//! object key it resolves to, each entry holding a differently typed `Arc`
//! that points at the same allocation.

use crate::key::{Injectable, TypeKey};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A shared instance with its static type erased.
#[derive(Clone)]
pub struct Bean {
    /// Holds an `Arc<T>` where `T` is the type named by `key`
    value: Arc<dyn Any + Send + Sync>,
    /// Address of the underlying object, stable across upcasts
    addr: usize,
    key: TypeKey,
}

impl Bean {
    /// Erase an `Arc<T>`.
    #[inline]
    pub fn new<T: ?Sized + Injectable>(instance: Arc<T>) -> Self {
        let addr = Arc::as_ptr(&instance) as *const () as usize;
        Self {
            value: Arc::new(instance) as Arc<dyn Any + Send + Sync>,
            addr,
            key: TypeKey::of::<T>(),
        }
    }

    /// Recover the typed `Arc<T>` if this bean holds one.
    #[inline]
    pub fn downcast<T: ?Sized + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// Key of the type this bean is currently viewed as.
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// Whether both beans point at the same object, whatever view they hold.
    #[inline]
    pub fn same_object(&self, other: &Bean) -> bool {
        self.addr == other.addr
    }
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bean")
            .field("key", &self.key)
            .field("addr", &format_args!("{:#x}", self.addr))
            .finish()
    }
}

/// Erased ancestor cast: `Arc<Child>` in, `Arc<Parent>` out.
type CastFn = Arc<dyn Fn(&Bean) -> Option<Bean> + Send + Sync>;

/// One declared ancestor of a type (a trait it implements, or a supertrait).
#[derive(Clone)]
pub struct Upcast {
    target: TypeKey,
    cast: CastFn,
}

impl Upcast {
    /// Declare that `S` can be viewed as `P` through `cast`.
    pub fn new<S, P, F>(cast: F) -> Self
    where
        S: ?Sized + Injectable,
        P: ?Sized + Injectable,
        F: Fn(Arc<S>) -> Arc<P> + Send + Sync + 'static,
    {
        Self {
            target: TypeKey::of::<P>(),
            cast: Arc::new(move |bean: &Bean| bean.downcast::<S>().map(|arc| Bean::new(cast(arc)))),
        }
    }

    /// Key of the ancestor type.
    #[inline]
    pub fn target(&self) -> TypeKey {
        self.target
    }

    #[inline]
    pub(crate) fn apply(&self, bean: &Bean) -> Option<Bean> {
        (self.cast)(bean)
    }
}

impl fmt::Debug for Upcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Upcast").field(&self.target).finish()
    }
}

/// Chain of casts from a concrete type up to one of its ancestors.
#[derive(Clone, Default)]
pub(crate) struct CastPath {
    steps: Vec<Upcast>,
}

impl CastPath {
    pub(crate) fn then(&self, step: Upcast) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    pub(crate) fn apply(&self, bean: Bean) -> Option<Bean> {
        self.steps.iter().try_fold(bean, |current, step| step.apply(&current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    trait Greeter: Named {
        fn greet(&self) -> String {
            format!("hello from {}", self.name())
        }
    }

    struct English;

    impl Named for English {
        fn name(&self) -> &str {
            "english"
        }
    }

    impl Greeter for English {}

    #[test]
    fn test_bean_roundtrip_sized() {
        let bean = Bean::new(Arc::new(English));
        let english = bean.downcast::<English>().unwrap();
        assert_eq!(english.name(), "english");
        assert!(bean.downcast::<String>().is_none());
        assert_eq!(bean.key(), TypeKey::of::<English>());
    }

    #[test]
    fn test_upcast_keeps_identity() {
        let concrete = Bean::new(Arc::new(English));
        let to_greeter = Upcast::new::<English, dyn Greeter, _>(|this| -> Arc<dyn Greeter> { this });
        let to_named = Upcast::new::<dyn Greeter, dyn Named, _>(|this| -> Arc<dyn Named> { this });

        let greeter = to_greeter.apply(&concrete).unwrap();
        assert_eq!(greeter.key(), TypeKey::of::<dyn Greeter>());
        assert!(greeter.same_object(&concrete));
        assert_eq!(greeter.downcast::<dyn Greeter>().unwrap().greet(), "hello from english");

        let path = CastPath::default().then(to_greeter).then(to_named);
        let named = path.apply(concrete.clone()).unwrap();
        assert!(named.same_object(&concrete));
        assert_eq!(named.downcast::<dyn Named>().unwrap().name(), "english");
    }

    #[test]
    fn test_upcast_rejects_wrong_source() {
        let to_greeter = Upcast::new::<English, dyn Greeter, _>(|this| -> Arc<dyn Greeter> { this });
        let other = Bean::new(Arc::new(42_u32));
        assert!(to_greeter.apply(&other).is_none());
    }
}
