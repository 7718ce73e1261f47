//! Constructor contract checks
//!
//! A component is usable when it has exactly one way to be built: a single
//! injectable constructor, or no injectable constructor and a niladic one.
//! During bootstrap every injectable parameter must also resolve to a known
//! type. All of this is checked before anything is instantiated.

use crate::descriptor::{ComponentDescriptor, Constructor};
use crate::error::ContractViolation;
use crate::hierarchy::HierarchyMap;
use crate::key::TypeKey;
use crate::{InjectError, Result};
use ahash::RandomState;
use std::collections::HashSet;

#[cfg(feature = "logging")]
use tracing::debug;

/// A validated component: its key and the constructor the injector will use.
#[derive(Debug, Clone)]
pub struct ComponentSpec {
    key: TypeKey,
    constructor: Constructor,
    injectable: bool,
}

impl ComponentSpec {
    /// Key of the component.
    #[inline]
    pub fn key(&self) -> TypeKey {
        self.key
    }

    /// The selected constructor.
    #[inline]
    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    /// Parameters of the injectable constructor, or `None` when the
    /// component is built through its niladic constructor.
    #[inline]
    pub fn dependencies(&self) -> Option<&[TypeKey]> {
        self.injectable.then(|| self.constructor.params())
    }
}

/// Pick the constructor to use, without looking at parameter resolvability.
pub fn select(component: &ComponentDescriptor) -> Result<ComponentSpec> {
    let key = component.key();

    match component.injectable_constructors() {
        [] => component
            .niladic_constructor()
            .map(|constructor| ComponentSpec {
                key,
                constructor: constructor.clone(),
                injectable: false,
            })
            .ok_or_else(|| InjectError::contract(key.name(), ContractViolation::NoUsableConstructor)),
        [constructor] => Ok(ComponentSpec {
            key,
            constructor: constructor.clone(),
            injectable: true,
        }),
        many => Err(InjectError::contract(
            key.name(),
            ContractViolation::MultipleInjectConstructors { count: many.len() },
        )),
    }
}

/// Validate a discovered component against the resolved hierarchy.
///
/// A parameter is resolvable when its key is in `hierarchy` or is the own
/// key of an external bean or factory (`supplied`). Every unresolvable
/// parameter is reported, not just the first.
pub fn validate(
    component: &ComponentDescriptor,
    hierarchy: &HierarchyMap,
    supplied: &HashSet<TypeKey, RandomState>,
) -> Result<ComponentSpec> {
    #[cfg(feature = "logging")]
    debug!(
        target: "component_injector",
        component = component.key().name(),
        "Checking constructor contract"
    );

    let spec = select(component)?;

    if let Some(params) = spec.dependencies() {
        let unresolvable: Vec<&'static str> = params
            .iter()
            .filter(|param| !hierarchy.contains(param) && !supplied.contains(param))
            .map(TypeKey::name)
            .collect();

        if !unresolvable.is_empty() {
            return Err(InjectError::contract(
                spec.key.name(),
                ContractViolation::UnresolvableDependency {
                    params: unresolvable,
                },
            ));
        }
    }

    Ok(spec)
}
