#![no_main]

//! Fuzz target for hierarchy resolution
//!
//! Builds an arbitrary parent relation over small keys (cycles and
//! self-edges included) and checks that a key resolves iff exactly one
//! registered type reaches it, whatever the registration order.

use arbitrary::Arbitrary;
use component_injector::hierarchy;
use libfuzzer_sys::fuzz_target;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Arbitrary)]
struct Input {
    /// (child, parent) edges
    edges: Vec<(u8, u8)>,
    /// Registered types, duplicates allowed
    types: Vec<u8>,
}

fn reachable(start: u8, parents: &HashMap<u8, Vec<u8>>) -> HashSet<u8> {
    let mut seen = HashSet::new();
    let mut pending = vec![start];
    while let Some(key) = pending.pop() {
        if seen.insert(key) {
            pending.extend(parents.get(&key).into_iter().flatten().copied());
        }
    }
    seen
}

fuzz_target!(|input: Input| {
    let mut parents: HashMap<u8, Vec<u8>> = HashMap::new();
    for (child, parent) in input.edges.iter().take(256) {
        parents.entry(*child).or_default().push(*parent);
    }
    let types: Vec<u8> = input.types.iter().take(64).copied().collect();
    let lookup = |key: &u8| parents.get(key).cloned().unwrap_or_default();

    let forward = hierarchy::resolve(types.iter().copied(), lookup);
    let backward = hierarchy::resolve(types.iter().rev().copied(), lookup);
    assert!(forward == backward, "resolution depends on registration order");

    // Reference answer: who reaches each key
    let distinct: HashSet<u8> = types.iter().copied().collect();
    let mut owners: HashMap<u8, HashSet<u8>> = HashMap::new();
    for concrete in &distinct {
        for key in reachable(*concrete, &parents) {
            owners.entry(key).or_default().insert(*concrete);
        }
    }

    for (key, reached_by) in &owners {
        let expected = (reached_by.len() == 1).then(|| *reached_by.iter().next().unwrap());
        assert_eq!(forward.concrete_of(key), expected, "key {key}");
    }
    assert_eq!(
        forward.len(),
        owners.values().filter(|reached_by| reached_by.len() == 1).count()
    );
});
