//! Type hierarchy resolution
//!
//! Maps every ancestor of a registered type (the traits it implements, their
//! supertraits, and the type itself) to that registered type, as long as the
//! ancestor identifies exactly one registered type. An ancestor reached from
//! two registered types is a collision: it is dropped from the map together
//! with all of its own ancestors, and stays excluded for the rest of the run.
//!
//! The result does not depend on the order in which types are processed: a
//! key ends up in the map iff exactly one registered type reaches it.

use crate::key::TypeKey;
use ahash::RandomState;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[cfg(feature = "logging")]
use tracing::{debug, info, trace};

/// Ancestor key to the unique registered (concrete) type it identifies.
#[derive(Debug, Clone)]
pub struct HierarchyMap<K = TypeKey> {
    entries: HashMap<K, K, RandomState>,
}

impl<K: Copy + Eq + Hash> HierarchyMap<K> {
    /// The concrete type `key` resolves to, if it is unambiguous.
    #[inline]
    pub fn concrete_of(&self, key: &K) -> Option<K> {
        self.entries.get(key).copied()
    }

    /// Whether `key` resolves to some concrete type.
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Every key that resolves to `concrete`, including `concrete` itself
    /// when it is not a collision.
    pub fn keys_of<'a>(&'a self, concrete: &'a K) -> impl Iterator<Item = K> + 'a {
        self.entries
            .iter()
            .filter(move |(_, value)| *value == concrete)
            .map(|(key, _)| *key)
    }

    /// Iterate over all `(ancestor, concrete)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (K, K)> + '_ {
        self.entries.iter().map(|(key, value)| (*key, *value))
    }

    /// Number of resolvable keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no key resolves.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash> PartialEq for HierarchyMap<K> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Eq + Hash> Eq for HierarchyMap<K> {}

impl<K: Copy + Eq + Hash> FromIterator<(K, K)> for HierarchyMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, K)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Builds a [`HierarchyMap`] from registered types and a parent lookup.
///
/// `parents(key)` returns the direct ancestors of `key`; keys nobody declared
/// simply have none.
pub struct HierarchyResolver<K, P> {
    parents: P,
    map: HashMap<K, K, RandomState>,
    collisions: HashSet<K, RandomState>,
}

impl<K, P, I> HierarchyResolver<K, P>
where
    K: Copy + Eq + Hash + std::fmt::Debug,
    P: Fn(&K) -> I,
    I: IntoIterator<Item = K>,
{
    /// Create a resolver over the given parent relation.
    pub fn new(parents: P) -> Self {
        Self {
            parents,
            map: HashMap::default(),
            collisions: HashSet::default(),
        }
    }

    /// Resolve the hierarchy of `types`.
    ///
    /// Each type is walked on its own and then merged; collisions found
    /// while walking later types retroactively remove earlier entries.
    pub fn resolve(mut self, types: impl IntoIterator<Item = K>) -> HierarchyMap<K> {
        for concrete in types {
            #[cfg(feature = "logging")]
            debug!(
                target: "component_injector",
                component = ?concrete,
                "Resolving type hierarchy"
            );

            let reached = self.walk(concrete);
            for (key, owner) in reached {
                // A later branch of the same walk may have collided above an
                // entry recorded earlier in that walk.
                if !self.collisions.contains(&key) {
                    self.map.insert(key, owner);
                }
            }
        }

        #[cfg(feature = "logging")]
        info!(
            target: "component_injector",
            resolved = self.map.len(),
            collisions = self.collisions.len(),
            "Type hierarchy resolved"
        );

        HierarchyMap { entries: self.map }
    }

    /// Collect every ancestor of `concrete` that is not already claimed by
    /// another type, marking the claimed ones as collisions.
    fn walk(&mut self, concrete: K) -> HashMap<K, K, RandomState> {
        let mut reached: HashMap<K, K, RandomState> = HashMap::default();
        let mut pending = vec![concrete];

        while let Some(current) = pending.pop() {
            if self.collisions.contains(&current) {
                #[cfg(feature = "logging")]
                trace!(target: "component_injector", ancestor = ?current, "Ancestor already a collision");
                continue;
            }

            if self.map.get(&current).is_some_and(|owner| *owner != concrete) {
                self.mark_collision(current);
                continue;
            }

            if reached.insert(current, concrete).is_some() {
                continue;
            }

            pending.extend((self.parents)(&current));
        }

        reached
    }

    /// Mark `key` and all of its ancestors as collisions.
    fn mark_collision(&mut self, key: K) {
        let mut pending = vec![key];

        while let Some(current) = pending.pop() {
            if !self.collisions.insert(current) {
                continue;
            }

            #[cfg(feature = "logging")]
            debug!(target: "component_injector", ancestor = ?current, "Marking ancestor as collision");

            self.map.remove(&current);
            pending.extend((self.parents)(&current));
        }
    }
}

/// Resolve the hierarchy of `types` given a parent lookup.
///
/// # Examples
///
/// ```rust
/// use component_injector::hierarchy::resolve;
/// use std::collections::HashMap;
///
/// // 1 and 2 are concrete; both implement 10, only 1 implements 11
/// let parents: HashMap<u32, Vec<u32>> =
///     [(1, vec![10, 11]), (2, vec![10])].into_iter().collect();
///
/// let map = resolve([1, 2], |key: &u32| parents.get(key).cloned().unwrap_or_default());
/// assert_eq!(map.concrete_of(&11), Some(1));
/// assert_eq!(map.concrete_of(&10), None);
/// ```
pub fn resolve<K, P, I>(types: impl IntoIterator<Item = K>, parents: P) -> HierarchyMap<K>
where
    K: Copy + Eq + Hash + std::fmt::Debug,
    P: Fn(&K) -> I,
    I: IntoIterator<Item = K>,
{
    HierarchyResolver::new(parents).resolve(types)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(u32, &[u32])]) -> HashMap<u32, Vec<u32>> {
        edges.iter().map(|(k, v)| (*k, v.to_vec())).collect()
    }

    fn run(types: &[u32], parents: &HashMap<u32, Vec<u32>>) -> HierarchyMap<u32> {
        resolve(types.iter().copied(), |k: &u32| {
            parents.get(k).cloned().unwrap_or_default()
        })
    }

    /// All orderings of a small slice.
    fn permutations(items: &[u32]) -> Vec<Vec<u32>> {
        if items.len() <= 1 {
            return vec![items.to_vec()];
        }
        let mut out = Vec::new();
        for i in 0..items.len() {
            let mut rest = items.to_vec();
            let head = rest.remove(i);
            for mut tail in permutations(&rest) {
                tail.insert(0, head);
                out.push(tail);
            }
        }
        out
    }

    #[test]
    fn test_unique_ancestors_resolve_to_concrete() {
        // 1 -> 10 -> 100
        let parents = graph(&[(1, &[10]), (10, &[100])]);
        let map = run(&[1], &parents);

        assert_eq!(map.len(), 3);
        for key in [1, 10, 100] {
            assert_eq!(map.concrete_of(&key), Some(1));
        }
        let mut keys: Vec<u32> = map.keys_of(&1).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec![1, 10, 100]);
    }

    #[test]
    fn test_shared_ancestor_collides_with_its_ancestors() {
        // 1 -> 10 -> 100, 2 -> 10, 2 -> 20
        let parents = graph(&[(1, &[10]), (2, &[10, 20]), (10, &[100])]);
        let map = run(&[1, 2], &parents);

        assert_eq!(map.concrete_of(&1), Some(1));
        assert_eq!(map.concrete_of(&2), Some(2));
        assert_eq!(map.concrete_of(&20), Some(2));
        assert!(!map.contains(&10));
        assert!(!map.contains(&100));
    }

    #[test]
    fn test_third_type_removes_previously_unique_ancestor() {
        // 10 is unique with {1}, collides once 3 also reaches it
        let parents = graph(&[(1, &[10]), (2, &[20]), (3, &[10])]);
        assert_eq!(run(&[1, 2], &parents).concrete_of(&10), Some(1));
        assert!(!run(&[1, 2, 3], &parents).contains(&10));
    }

    #[test]
    fn test_diamond_within_one_type_is_not_a_collision() {
        // 1 -> {10, 11} -> 100
        let parents = graph(&[(1, &[10, 11]), (10, &[100]), (11, &[100])]);
        let map = run(&[1], &parents);
        assert_eq!(map.concrete_of(&100), Some(1));
    }

    #[test]
    fn test_concrete_type_reached_by_another_collides() {
        // 2 declares 1 as an ancestor, so key 1 is ambiguous
        let parents = graph(&[(2, &[1])]);
        let map = run(&[1, 2], &parents);
        assert!(!map.contains(&1));
        assert_eq!(map.concrete_of(&2), Some(2));
    }

    #[test]
    fn test_processing_order_does_not_matter() {
        // Mixed: collision below a unique branch, diamonds, shared roots
        let parents = graph(&[
            (1, &[10, 11]),
            (2, &[11, 12]),
            (3, &[13]),
            (4, &[12, 14]),
            (10, &[100]),
            (11, &[100, 101]),
            (12, &[102]),
            (13, &[101, 103]),
            (14, &[104]),
            (100, &[999]),
            (101, &[999]),
        ]);

        let reference = run(&[1, 2, 3, 4], &parents);
        for order in permutations(&[1, 2, 3, 4]) {
            assert_eq!(run(&order, &parents), reference, "order {order:?}");
        }

        // Only 10 (via 1), 103 (via 3), 14/104 (via 4) are unique ancestors
        assert_eq!(reference.concrete_of(&10), Some(1));
        assert_eq!(reference.concrete_of(&103), Some(3));
        assert_eq!(reference.concrete_of(&104), Some(4));
        for shared in [11, 12, 100, 101, 102, 999] {
            assert!(!reference.contains(&shared), "{shared} should collide");
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let parents = graph(&[(1, &[10]), (2, &[10, 20]), (20, &[200])]);
        assert_eq!(run(&[1, 2], &parents), run(&[1, 2], &parents));
    }

    #[test]
    fn test_matches_unique_reachability() {
        // Property: key present iff exactly one registered type reaches it
        let parents = graph(&[
            (1, &[10, 20]),
            (2, &[20, 30]),
            (3, &[30, 40]),
            (10, &[50]),
            (40, &[50]),
        ]);
        let types = [1, 2, 3];
        let map = run(&types, &parents);

        let reach = |start: u32| {
            let mut seen = HashSet::new();
            let mut stack = vec![start];
            while let Some(k) = stack.pop() {
                if seen.insert(k) {
                    stack.extend(parents.get(&k).cloned().unwrap_or_default());
                }
            }
            seen
        };
        let reached: Vec<HashSet<u32>> = types.iter().map(|t| reach(*t)).collect();
        for key in [1, 2, 3, 10, 20, 30, 40, 50] {
            let owners: Vec<u32> = types
                .iter()
                .zip(&reached)
                .filter(|(_, r)| r.contains(&key))
                .map(|(t, _)| *t)
                .collect();
            match owners.as_slice() {
                [only] => assert_eq!(map.concrete_of(&key), Some(*only), "key {key}"),
                _ => assert!(!map.contains(&key), "key {key}"),
            }
        }
    }
}
