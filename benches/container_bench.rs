//! Benchmarks for the injector

use component_injector::{
    cycle::CycleDetector, hierarchy, schedule::schedule, upcast, Catalog, Component, Container,
    External, Factory, TypeKey,
};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::collections::HashMap;
use std::hint::black_box;
use std::sync::Arc;

#[allow(dead_code)]
struct Config {
    url: String,
}

trait Repository: Send + Sync {
    fn id(&self) -> u32;
}

#[derive(Default)]
struct MemoryRepository;

impl Repository for MemoryRepository {
    fn id(&self) -> u32 {
        7
    }
}

#[allow(dead_code)]
struct Logger {
    scope: &'static str,
}

#[allow(dead_code)]
struct ServiceA {
    repository: Arc<dyn Repository>,
    config: Arc<Config>,
}

#[allow(dead_code)]
struct ServiceB {
    a: Arc<ServiceA>,
    logger: Arc<Logger>,
}

#[allow(dead_code)]
struct ServiceC {
    a: Arc<ServiceA>,
    b: Arc<ServiceB>,
    repository: Arc<dyn Repository>,
}

fn catalog() -> Catalog {
    Catalog::new()
        .component(Component::<ServiceC>::new().inject(
            |(a, b, repository): (Arc<ServiceA>, Arc<ServiceB>, Arc<dyn Repository>)| ServiceC { a, b, repository },
        ))
        .component(
            Component::<ServiceB>::new().inject(|(a, logger): (Arc<ServiceA>, Arc<Logger>)| ServiceB { a, logger }),
        )
        .component(Component::<ServiceA>::new().inject(
            |(repository, config): (Arc<dyn Repository>, Arc<Config>)| ServiceA { repository, config },
        ))
        .component(
            Component::<MemoryRepository>::new()
                .implements::<dyn Repository>(upcast!(dyn Repository))
                .default_constructor(),
        )
}

fn wired() -> Container {
    Container::builder()
        .discover(catalog())
        .bean(External::new(Config {
            url: "memory://".into(),
        }))
        .factory(Factory::<Logger>::new(|consumer: &TypeKey| {
            Arc::new(Logger {
                scope: consumer.name(),
            })
        }))
        .build()
        .expect("benchmark wiring is valid")
}

fn bench_bootstrap(c: &mut Criterion) {
    let mut group = c.benchmark_group("bootstrap");

    group.bench_function("empty", |b| {
        b.iter(|| black_box(Container::builder().build().expect("empty build")))
    });

    group.bench_function("four_components", |b| b.iter(|| black_box(wired())));

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");
    group.throughput(Throughput::Elements(1));

    let container = wired();

    group.bench_function("get_concrete", |b| {
        b.iter(|| black_box(container.get::<ServiceC>()))
    });

    group.bench_function("get_trait_object", |b| {
        b.iter(|| black_box(container.get::<dyn Repository>().map(|r| r.id())))
    });

    group.bench_function("try_get_not_found", |b| {
        b.iter(|| black_box(container.try_get::<u64>()))
    });

    group.bench_function("contains_check", |b| {
        b.iter(|| black_box(container.contains::<ServiceB>()))
    });

    group.finish();
}

fn bench_new_instance(c: &mut Criterion) {
    let mut group = c.benchmark_group("new_instance");
    group.throughput(Throughput::Elements(1));

    let container = wired();

    group.bench_function("three_params_with_factory", |b| {
        b.iter(|| {
            black_box(container.new_instance_of(
                Component::<ServiceB>::new()
                    .inject(|(a, logger): (Arc<ServiceA>, Arc<Logger>)| ServiceB { a, logger }),
            ))
        })
    });

    group.finish();
}

fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    let container = Arc::new(wired());

    group.bench_function("concurrent_reads_4", |b| {
        b.iter(|| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let container = Arc::clone(&container);
                    thread::spawn(move || {
                        for _ in 0..100 {
                            black_box(container.get::<dyn Repository>().ok());
                        }
                    })
                })
                .collect();
            for handle in handles {
                let _ = handle.join();
            }
        })
    });

    group.finish();
}

// Layered graph: every key in layer n depends on two keys of layer n - 1.
fn layered(layers: u32, width: u32) -> HashMap<u32, Vec<u32>> {
    let mut graph = HashMap::new();
    for layer in 0..layers {
        for slot in 0..width {
            let key = layer * width + slot;
            let deps = if layer == 0 {
                Vec::new()
            } else {
                let below = (layer - 1) * width;
                vec![below + slot, below + (slot + 1) % width]
            };
            graph.insert(key, deps);
        }
    }
    graph
}

fn bench_algorithms(c: &mut Criterion) {
    let mut group = c.benchmark_group("algorithms");

    for size in [10u32, 100] {
        let graph = layered(size, 10);
        let mut keys: Vec<u32> = graph.keys().copied().collect();
        keys.sort_unstable();
        let map = hierarchy::resolve(keys.iter().copied(), |_: &u32| Vec::new());

        group.throughput(Throughput::Elements(keys.len() as u64));

        group.bench_with_input(BenchmarkId::new("cycle_check", keys.len()), &keys, |b, keys| {
            b.iter(|| {
                let mut detector = CycleDetector::new(&map, |key: &u32| graph.get(key).map(Vec::as_slice));
                black_box(detector.check_all(keys.iter().copied()))
            })
        });

        group.bench_with_input(BenchmarkId::new("schedule", keys.len()), &keys, |b, keys| {
            b.iter(|| {
                black_box(schedule(keys, &map, [], |key: &u32| {
                    graph.get(key).filter(|deps| !deps.is_empty()).cloned()
                }))
            })
        });
    }

    group.bench_function("hierarchy_resolve_1000", |b| {
        // 1000 concrete keys, each with its own parent and a shared one
        b.iter(|| {
            black_box(hierarchy::resolve(0u32..1000, |key: &u32| {
                if *key < 1000 {
                    vec![key + 1000, 5000]
                } else {
                    Vec::new()
                }
            }))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_bootstrap,
    bench_resolution,
    bench_new_instance,
    bench_concurrent,
    bench_algorithms,
);

criterion_main!(benches);
