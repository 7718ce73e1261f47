//! Type identity used as the key of every map in the injector
//!
//! Rust has no runtime reflection, so a type is identified by its `TypeId`
//! and described to the injector through an explicit declaration
//! (see [`Component`](crate::Component), [`Interface`](crate::Interface)).
//! Trait objects (`dyn Trait`) play the role of interfaces and superclasses.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Opaque identifier of a sized type or a trait object.
///
/// Equality and hashing only consider the `TypeId`; the name is carried for
/// diagnostics.
///
/// # Examples
///
/// ```rust
/// use component_injector::TypeKey;
///
/// trait Greeter: Send + Sync {}
/// struct English;
///
/// assert_ne!(TypeKey::of::<English>(), TypeKey::of::<dyn Greeter>());
/// assert_eq!(TypeKey::of::<English>(), TypeKey::of::<English>());
/// ```
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of `T`, which may be unsized (`dyn Trait`).
    ///
    /// Auto-trait bounds are part of a trait object's type, so
    /// `dyn Repository` and `dyn Repository + Send + Sync` are different
    /// keys. Declare and inject a trait object in the same spelling; the
    /// usual one is a trait with `Send + Sync` supertraits, written as plain
    /// `dyn Repository`.
    ///
    /// ```rust
    /// use component_injector::TypeKey;
    ///
    /// trait Repository: Send + Sync {}
    ///
    /// assert_ne!(
    ///     TypeKey::of::<dyn Repository>(),
    ///     TypeKey::of::<dyn Repository + Send + Sync>()
    /// );
    /// ```
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The underlying `TypeId`.
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human-readable type name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Marker for types the injector can hold.
///
/// Automatically implemented for every `Send + Sync + 'static` type,
/// including trait objects whose trait requires `Send + Sync`.
pub trait Injectable: Send + Sync + 'static {}

impl<T: ?Sized + Send + Sync + 'static> Injectable for T {}

/// Build the cast closure for an ancestor declaration.
///
/// Expands to `|this| -> Arc<$target> { this }`, which lets the compiler
/// perform the unsizing coercion (`Arc<Concrete>` to `Arc<dyn Trait>`) or the
/// trait upcast (`Arc<dyn Sub>` to `Arc<dyn Super>`).
///
/// # Examples
///
/// ```rust
/// use component_injector::{upcast, Component};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let component = Component::<English>::new()
///     .implements::<dyn Greeter>(upcast!(dyn Greeter))
///     .default_constructor();
/// # let _ = component;
/// ```
#[macro_export]
macro_rules! upcast {
    ($target:ty) => {
        |this| -> ::std::sync::Arc<$target> { this }
    };
}
