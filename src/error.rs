//! Error types for the injector
//!
//! Bootstrap errors are wiring mistakes, not transient failures: they abort
//! `build` and no partially wired container is ever returned.

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Where a registered type came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// A discovered component built by the injector
    Component,
    /// A pre-built external instance
    Bean,
    /// A per-consumer factory
    Factory,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Component => "component",
            Self::Bean => "external bean",
            Self::Factory => "factory",
        })
    }
}

/// Why a type's constructors cannot be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// More than one constructor is marked injectable
    #[error("{count} constructors are marked injectable, at most one is allowed")]
    MultipleInjectConstructors { count: usize },

    /// No injectable constructor and no niladic fallback
    #[error("no injectable constructor and no niladic constructor")]
    NoUsableConstructor,

    /// Injectable constructor parameters that resolve to nothing
    #[error("injectable constructor has unresolvable dependencies: {}", .params.join(", "))]
    UnresolvableDependency { params: Vec<&'static str> },
}

/// Errors that can occur while wiring or using the container
#[derive(Error, Debug, Clone)]
pub enum InjectError {
    /// The same type is supplied by two sources
    #[error("{type_name} is supplied both as {first} and as {second}")]
    BeanConflict {
        type_name: &'static str,
        first: Source,
        second: Source,
    },

    /// A type's constructors do not satisfy the injection contract
    #[error("invalid constructor for {type_name}: {violation}")]
    ConstructorContract {
        type_name: &'static str,
        violation: ContractViolation,
    },

    /// A component transitively depends on itself
    #[error("cyclic dependency detected: {}", .path.join(" -> "))]
    CyclicDependency { path: Vec<&'static str> },

    /// The constructor itself failed
    #[error("failed to instantiate {type_name}: {source}")]
    InstantiationFailure {
        type_name: &'static str,
        #[source]
        source: Arc<dyn StdError + Send + Sync>,
    },

    /// An ad-hoc instance needs dependencies the container does not hold
    #[error("cannot build {type_name}, missing dependencies: {}", .missing.join(", "))]
    MissingDependency {
        type_name: &'static str,
        missing: Vec<&'static str>,
    },

    /// No instance or factory is registered under the requested type
    #[error("no bean registered for {type_name}")]
    NotFound { type_name: &'static str },

    /// Scheduling made no progress over a full pass
    #[error("cannot order components for instantiation: {}", .remaining.join(", "))]
    Unschedulable { remaining: Vec<&'static str> },

    /// A container handle was used before bootstrap finished or after the
    /// container was dropped
    #[error("container is not available")]
    ContainerUnavailable,
}

impl InjectError {
    /// Create a NotFound error for a type
    #[inline]
    pub fn not_found<T: ?Sized + 'static>() -> Self {
        Self::NotFound {
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Create a ConstructorContract error for a type
    #[inline]
    pub fn contract(type_name: &'static str, violation: ContractViolation) -> Self {
        Self::ConstructorContract {
            type_name,
            violation,
        }
    }

    /// Wrap a constructor failure
    #[inline]
    pub fn instantiation_failed<T: ?Sized + 'static, E: StdError + Send + Sync + 'static>(
        source: E,
    ) -> Self {
        Self::InstantiationFailure {
            type_name: std::any::type_name::<T>(),
            source: Arc::new(source),
        }
    }

    /// Whether this error was raised while validating the wiring, before any
    /// component was constructed.
    pub fn is_wiring_error(&self) -> bool {
        matches!(
            self,
            Self::BeanConflict { .. }
                | Self::ConstructorContract { .. }
                | Self::CyclicDependency { .. }
                | Self::Unschedulable { .. }
        )
    }
}

/// Result type alias for injector operations
pub type Result<T> = std::result::Result<T, InjectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("disk full")]
    struct DiskFull;

    #[test]
    fn test_cycle_message_shows_path() {
        let err = InjectError::CyclicDependency {
            path: vec!["X", "Y", "X"],
        };
        assert_eq!(err.to_string(), "cyclic dependency detected: X -> Y -> X");
        assert!(err.is_wiring_error());
    }

    #[test]
    fn test_unresolvable_lists_every_param() {
        let err = InjectError::contract(
            "Service",
            ContractViolation::UnresolvableDependency {
                params: vec!["Db", "Cache"],
            },
        );
        assert!(err.to_string().ends_with("Db, Cache"));
    }

    #[test]
    fn test_instantiation_failure_keeps_source() {
        let err = InjectError::instantiation_failed::<u32, _>(DiskFull);
        assert!(!err.is_wiring_error());
        assert_eq!(err.source().map(|s| s.to_string()), Some("disk full".into()));

        let cloned = err.clone();
        assert!(cloned.to_string().contains("disk full"));
    }
}
