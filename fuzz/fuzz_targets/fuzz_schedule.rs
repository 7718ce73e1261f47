#![no_main]

//! Fuzz target for cycle detection and scheduling
//!
//! Builds an arbitrary dependency graph. When the cycle detector accepts it,
//! the scheduler must order every component strictly after the components
//! it depends on. When it rejects it, the reported path must be a real
//! cycle.

use arbitrary::Arbitrary;
use component_injector::cycle::CycleDetector;
use component_injector::hierarchy;
use component_injector::schedule::schedule;
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;

#[derive(Debug, Arbitrary)]
struct Input {
    /// Component count, capped below
    size: u8,
    /// (dependent, dependency) edges, taken modulo the component count
    edges: Vec<(u8, u8)>,
}

fuzz_target!(|input: Input| {
    let size = u32::from(input.size % 48) + 1;
    let components: Vec<u32> = (0..size).collect();

    let mut graph: HashMap<u32, Vec<u32>> = HashMap::new();
    for (from, to) in input.edges.iter().take(256) {
        let (from, to) = (u32::from(*from) % size, u32::from(*to) % size);
        graph.entry(from).or_default().push(to);
    }

    let map = hierarchy::resolve(components.iter().copied(), |_: &u32| Vec::new());

    let mut detector = CycleDetector::new(&map, |key: &u32| graph.get(key).map(Vec::as_slice));
    match detector.check_all(components.iter().copied()) {
        Err(cycle) => {
            let path = cycle.path;
            assert!(path.len() >= 2);
            assert_eq!(path.first(), path.last());
            for pair in path.windows(2) {
                assert!(graph.get(&pair[0]).is_some_and(|deps| deps.contains(&pair[1])));
            }
            // Scheduling the same graph can never finish
            assert!(schedule(&components, &map, [], |key: &u32| graph.get(key).cloned()).is_err());
        }
        Ok(()) => {
            let order = schedule(&components, &map, [], |key: &u32| graph.get(key).cloned())
                .expect("acyclic graphs always schedule");
            assert_eq!(order.len(), components.len());

            let position: HashMap<u32, usize> =
                order.iter().enumerate().map(|(i, s)| (s.key, i)).collect();
            let priority: HashMap<u32, usize> = order.iter().map(|s| (s.key, s.priority)).collect();

            for (dependent, deps) in &graph {
                for dep in deps {
                    assert!(position[dep] < position[dependent]);
                    assert!(priority[dep] < priority[dependent]);
                }
            }
        }
    }
});
