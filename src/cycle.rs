//! Cyclic dependency detection
//!
//! Depth-first walk over injectable constructor parameters, each parameter
//! resolved through the hierarchy map to its concrete type. The path holds
//! only the current branch, so diamonds are not mistaken for cycles.

use crate::hierarchy::HierarchyMap;
use ahash::RandomState;
use std::collections::HashSet;
use std::hash::Hash;

#[cfg(feature = "logging")]
use tracing::debug;

/// A detected cycle, in visitation order, starting and ending with the same
/// type (`[X, Y, X]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle<K> {
    pub path: Vec<K>,
}

/// Walks the dependency graph implied by injectable constructors.
///
/// `dependencies(key)` returns the parameters of `key`'s injectable
/// constructor, or `None` when `key` has none (niladic components, external
/// beans, factories). Types proven acyclic are remembered across calls.
pub struct CycleDetector<'h, K, D> {
    hierarchy: &'h HierarchyMap<K>,
    dependencies: D,
    cleared: HashSet<K, RandomState>,
}

struct Frame<'a, K> {
    key: K,
    params: &'a [K],
    next: usize,
}

impl<'h, 'a, K, D> CycleDetector<'h, K, D>
where
    K: Copy + Eq + Hash + std::fmt::Debug + 'a,
    D: Fn(&K) -> Option<&'a [K]>,
{
    /// Create a detector over `hierarchy`.
    pub fn new(hierarchy: &'h HierarchyMap<K>, dependencies: D) -> Self {
        Self {
            hierarchy,
            dependencies,
            cleared: HashSet::default(),
        }
    }

    /// Fail if `component` transitively depends on itself, or on any type
    /// that does.
    pub fn check(&mut self, component: K) -> Result<(), Cycle<K>> {
        #[cfg(feature = "logging")]
        debug!(target: "component_injector", component = ?component, "Checking cyclic dependencies");

        let start = self.hierarchy.concrete_of(&component).unwrap_or(component);
        if self.cleared.contains(&start) {
            return Ok(());
        }
        let Some(params) = (self.dependencies)(&start) else {
            return Ok(());
        };

        let mut stack = vec![Frame {
            key: start,
            params,
            next: 0,
        }];
        let mut on_path: HashSet<K, RandomState> = HashSet::default();
        on_path.insert(start);

        while let Some(frame) = stack.last_mut() {
            let Some(&param) = frame.params.get(frame.next) else {
                // Every branch below this type is acyclic
                self.cleared.insert(frame.key);
                on_path.remove(&frame.key);
                stack.pop();
                continue;
            };
            frame.next += 1;

            // Parameters that do not resolve are leaves here; the contract
            // check reports them.
            let Some(dependency) = self.hierarchy.concrete_of(&param) else {
                continue;
            };

            if on_path.contains(&dependency) {
                let position = stack.iter().position(|f| f.key == dependency).unwrap_or(0);
                let mut path: Vec<K> = stack[position..].iter().map(|f| f.key).collect();
                path.push(dependency);
                return Err(Cycle { path });
            }

            if self.cleared.contains(&dependency) {
                continue;
            }

            if let Some(params) = (self.dependencies)(&dependency) {
                on_path.insert(dependency);
                stack.push(Frame {
                    key: dependency,
                    params,
                    next: 0,
                });
            }
        }

        Ok(())
    }

    /// Check every component, stopping at the first cycle.
    pub fn check_all(&mut self, components: impl IntoIterator<Item = K>) -> Result<(), Cycle<K>> {
        components.into_iter().try_for_each(|component| self.check(component))
    }
}
