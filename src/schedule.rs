//! Instantiation ordering
//!
//! Components are given a priority: 0 when they need nothing from the
//! container, otherwise one more than the highest priority among their
//! constructor dependencies. Instantiating in ascending priority guarantees
//! every dependency is built before the component that needs it.

use crate::hierarchy::HierarchyMap;
use ahash::RandomState;
use std::collections::HashMap;
use std::hash::Hash;

#[cfg(feature = "logging")]
use tracing::{debug, info};

/// A component and the priority it was scheduled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduled<K> {
    pub key: K,
    pub priority: usize,
}

/// Scheduling stopped making progress; `remaining` could not be ordered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stalled<K> {
    pub remaining: Vec<K>,
}

/// Order `components` for instantiation.
///
/// `ready` holds the keys that are resolvable without construction (external
/// beans and factories), which start at priority 0. `dependencies(key)`
/// returns the parameters of `key`'s injectable constructor, or `None` for
/// niladic components. Components of equal priority keep their input order.
pub fn schedule<K, D>(
    components: &[K],
    hierarchy: &HierarchyMap<K>,
    ready: impl IntoIterator<Item = K>,
    dependencies: D,
) -> Result<Vec<Scheduled<K>>, Stalled<K>>
where
    K: Copy + Eq + Hash + std::fmt::Debug,
    D: Fn(&K) -> Option<Vec<K>>,
{
    let mut priority: HashMap<K, usize, RandomState> = ready.into_iter().map(|key| (key, 0)).collect();

    let lookup = |priority: &HashMap<K, usize, RandomState>, param: &K| {
        priority.get(param).copied().or_else(|| {
            hierarchy
                .concrete_of(param)
                .and_then(|concrete| priority.get(&concrete).copied())
        })
    };

    let mut unscheduled: Vec<K> = components.to_vec();

    while !unscheduled.is_empty() {
        let before = unscheduled.len();

        unscheduled.retain(|component| {
            let params = dependencies(component).unwrap_or_default();

            let mut highest: Option<usize> = None;
            for param in &params {
                match lookup(&priority, param) {
                    Some(p) => highest = Some(highest.map_or(p, |h| h.max(p))),
                    // Not yet resolvable, retry on the next pass
                    None => return true,
                }
            }

            let assigned = highest.map_or(0, |h| h + 1);

            #[cfg(feature = "logging")]
            debug!(
                target: "component_injector",
                component = ?component,
                priority = assigned,
                dependencies = params.len(),
                "Component scheduled"
            );

            priority.insert(*component, assigned);
            false
        });

        if unscheduled.len() == before {
            return Err(Stalled {
                remaining: unscheduled,
            });
        }
    }

    let mut order: Vec<Scheduled<K>> = components
        .iter()
        .map(|key| Scheduled {
            key: *key,
            priority: priority.get(key).copied().unwrap_or_default(),
        })
        .collect();
    order.sort_by_key(|scheduled| scheduled.priority);

    #[cfg(feature = "logging")]
    info!(
        target: "component_injector",
        components = order.len(),
        max_priority = order.last().map_or(0, |s| s.priority),
        "All components have been prioritized"
    );

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::resolve;

    fn identity(keys: &[u32]) -> HierarchyMap<u32> {
        resolve(keys.iter().copied(), |_: &u32| Vec::new())
    }

    fn run(
        components: &[u32],
        map: &HierarchyMap<u32>,
        ready: &[u32],
        deps: &HashMap<u32, Vec<u32>>,
    ) -> Result<Vec<Scheduled<u32>>, Stalled<u32>> {
        schedule(components, map, ready.iter().copied(), |k: &u32| deps.get(k).cloned())
    }

    #[test]
    fn test_chain_priorities() {
        // A = 1 (niladic), B = 2 (A), C = 3 (B, A), listed out of order
        let map = identity(&[1, 2, 3]);
        let deps: HashMap<u32, Vec<u32>> = [(2, vec![1]), (3, vec![2, 1])].into_iter().collect();
        let order = run(&[3, 2, 1], &map, &[], &deps).unwrap();

        assert_eq!(
            order,
            vec![
                Scheduled { key: 1, priority: 0 },
                Scheduled { key: 2, priority: 1 },
                Scheduled { key: 3, priority: 2 },
            ]
        );
    }

    #[test]
    fn test_ready_keys_start_at_zero() {
        // 1 depends on external 50 and factory 60
        let map = identity(&[1, 50, 60]);
        let deps: HashMap<u32, Vec<u32>> = [(1, vec![50, 60])].into_iter().collect();
        let order = run(&[1], &map, &[50, 60], &deps).unwrap();
        assert_eq!(order, vec![Scheduled { key: 1, priority: 1 }]);
    }

    #[test]
    fn test_dependency_through_ancestor_key() {
        // 2 depends on trait 10, implemented only by 1
        let map = resolve([1u32, 2], |k: &u32| if *k == 1 { vec![10] } else { vec![] });
        let deps: HashMap<u32, Vec<u32>> = [(1, vec![]), (2, vec![10])].into_iter().collect();
        let order = run(&[2, 1], &map, &[], &deps).unwrap();
        assert_eq!(order.iter().map(|s| s.key).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_empty_injectable_constructor_is_priority_zero() {
        let map = identity(&[1]);
        let deps: HashMap<u32, Vec<u32>> = [(1, vec![])].into_iter().collect();
        assert_eq!(run(&[1], &map, &[], &deps).unwrap()[0].priority, 0);
    }

    #[test]
    fn test_equal_priorities_keep_input_order() {
        let map = identity(&[5, 3, 9, 1]);
        let order = run(&[5, 3, 9, 1], &map, &[], &HashMap::new()).unwrap();
        assert_eq!(order.iter().map(|s| s.key).collect::<Vec<_>>(), vec![5, 3, 9, 1]);
    }

    #[test]
    fn test_dependencies_come_first_in_layered_graph() {
        // Each node k depends on all of k / 2, k / 3 (when nonzero and different)
        let keys: Vec<u32> = (1..=40).collect();
        let map = identity(&keys);
        let deps: HashMap<u32, Vec<u32>> = keys
            .iter()
            .map(|k| {
                let mut d: Vec<u32> = [k / 2, k / 3].into_iter().filter(|d| *d != 0 && d != k).collect();
                d.dedup();
                (*k, d)
            })
            .collect();
        let mut reversed = keys.clone();
        reversed.reverse();

        let order = run(&reversed, &map, &[], &deps).unwrap();
        let position: HashMap<u32, usize> = order.iter().enumerate().map(|(i, s)| (s.key, i)).collect();
        for (k, ds) in &deps {
            for d in ds {
                assert!(position[d] < position[k], "{d} must come before {k}");
            }
        }
    }

    #[test]
    fn test_cycle_stalls_instead_of_looping() {
        let map = identity(&[1, 2, 3]);
        let deps: HashMap<u32, Vec<u32>> = [(1, vec![2]), (2, vec![1])].into_iter().collect();
        let stalled = run(&[1, 2, 3], &map, &[], &deps).unwrap_err();
        assert_eq!(stalled.remaining, vec![1, 2]);
    }

    #[test]
    fn test_unresolvable_param_stalls() {
        let map = identity(&[1]);
        let deps: HashMap<u32, Vec<u32>> = [(1, vec![77])].into_iter().collect();
        assert_eq!(run(&[1], &map, &[], &deps).unwrap_err().remaining, vec![1]);
    }
}
