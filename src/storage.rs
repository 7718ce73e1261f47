//! Instance and factory registry
//!
//! Filled once during bootstrap, read-only afterwards. There is no locking:
//! the registry is only ever mutated through `&mut self` before it is shared
//! behind an `Arc`, and every later access is a plain read.

use crate::bean::{Bean, CastPath, Upcast};
use crate::descriptor::{Constructor, ExternalBean, TypeDescriptor};
use crate::factory::ContextualFactory;
use crate::hierarchy::HierarchyMap;
use crate::key::TypeKey;
use crate::{InjectError, Result};
use ahash::RandomState;
use std::collections::{HashMap, VecDeque};

#[cfg(feature = "logging")]
use tracing::{debug, trace};

// =============================================================================
// Type Graph
// =============================================================================

/// Direct ancestor edges of every declared type.
#[derive(Default)]
pub(crate) struct TypeGraph {
    parents: HashMap<TypeKey, Vec<Upcast>, RandomState>,
}

impl TypeGraph {
    /// Record the ancestors of `ty`, merging with earlier declarations.
    pub(crate) fn declare(&mut self, ty: &TypeDescriptor) {
        let entry = self.parents.entry(ty.key()).or_default();
        for upcast in ty.parents() {
            if !entry.iter().any(|p| p.target() == upcast.target()) {
                entry.push(upcast.clone());
            }
        }
    }

    /// Direct ancestor keys of `key`.
    pub(crate) fn parents_of(&self, key: &TypeKey) -> Vec<TypeKey> {
        self.parents
            .get(key)
            .map(|edges| edges.iter().map(Upcast::target).collect())
            .unwrap_or_default()
    }

    /// A cast path from `concrete` to each of its ancestors (and the empty
    /// path to itself). Shortest paths are kept.
    pub(crate) fn paths_from(&self, concrete: TypeKey) -> HashMap<TypeKey, CastPath, RandomState> {
        let mut paths: HashMap<TypeKey, CastPath, RandomState> = HashMap::default();
        paths.insert(concrete, CastPath::default());

        let mut queue = VecDeque::from([concrete]);
        while let Some(current) = queue.pop_front() {
            let Some(edges) = self.parents.get(&current) else {
                continue;
            };
            let Some(base) = paths.get(&current).cloned() else {
                continue;
            };
            for edge in edges {
                if !paths.contains_key(&edge.target()) {
                    paths.insert(edge.target(), base.then(edge.clone()));
                    queue.push_back(edge.target());
                }
            }
        }

        paths
    }
}

// =============================================================================
// Registry
// =============================================================================

/// A factory registered under one of its keys, with the cast from the
/// produced type to that key.
#[derive(Clone)]
struct FactorySlot {
    factory: ContextualFactory,
    path: CastPath,
}

/// Built instances and factories, keyed by every type they can be requested
/// as.
pub(crate) struct Registry {
    instances: HashMap<TypeKey, Bean, RandomState>,
    factories: HashMap<TypeKey, FactorySlot, RandomState>,
    hierarchy: HierarchyMap,
}

impl Registry {
    pub(crate) fn new(hierarchy: HierarchyMap) -> Self {
        Self {
            instances: HashMap::default(),
            factories: HashMap::default(),
            hierarchy,
        }
    }

    /// Register an external bean under its own key and every hierarchy key
    /// that resolves to it.
    pub(crate) fn insert_external(&mut self, graph: &TypeGraph, external: ExternalBean) {
        let key = external.key();

        #[cfg(feature = "logging")]
        debug!(target: "component_injector", bean = key.name(), "Registering external bean");

        self.instances.insert(key, external.bean.clone());
        self.insert_views(graph, key, external.bean);
    }

    /// Register a factory under its own key and every hierarchy key that
    /// resolves to it.
    pub(crate) fn insert_factory(&mut self, graph: &TypeGraph, factory: ContextualFactory) {
        let key = factory.key();

        #[cfg(feature = "logging")]
        debug!(target: "component_injector", factory = key.name(), "Registering factory");

        let paths = graph.paths_from(key);
        let targets: Vec<TypeKey> = self
            .hierarchy
            .keys_of(&key)
            .chain(std::iter::once(key))
            .collect();

        for target in targets {
            if let Some(path) = paths.get(&target) {
                self.factories.insert(
                    target,
                    FactorySlot {
                        factory: factory.clone(),
                        path: path.clone(),
                    },
                );
            }
        }
    }

    /// Register a freshly built component under every hierarchy key that
    /// resolves to it. All entries share the same object.
    pub(crate) fn insert_component(&mut self, graph: &TypeGraph, key: TypeKey, bean: Bean) {
        self.insert_views(graph, key, bean);
    }

    fn insert_views(&mut self, graph: &TypeGraph, concrete: TypeKey, bean: Bean) {
        let paths = graph.paths_from(concrete);
        let targets: Vec<TypeKey> = self.hierarchy.keys_of(&concrete).collect();

        for target in targets {
            let Some(view) = paths.get(&target).and_then(|path| path.apply(bean.clone())) else {
                continue;
            };

            #[cfg(feature = "logging")]
            trace!(
                target: "component_injector",
                concrete = concrete.name(),
                view = target.name(),
                "Registering instance view"
            );

            self.instances.insert(target, view);
        }
    }

    /// Built instance registered under `key`. Never invokes factories.
    #[inline]
    pub(crate) fn instance(&self, key: &TypeKey) -> Option<Bean> {
        self.instances.get(key).cloned()
    }

    /// Whether `key` can be supplied as a dependency.
    #[inline]
    pub(crate) fn provides(&self, key: &TypeKey) -> bool {
        self.instances.contains_key(key) || self.factories.contains_key(key)
    }

    /// Supply `key` to `consumer`: the shared instance if there is one,
    /// otherwise a value produced by the factory for this consumer.
    pub(crate) fn resolve(&self, key: &TypeKey, consumer: &TypeKey) -> Option<Bean> {
        if let Some(bean) = self.instances.get(key) {
            return Some(bean.clone());
        }

        let slot = self.factories.get(key)?;
        slot.path.apply(slot.factory.produce(consumer))
    }

    /// Run `constructor` for `consumer`, resolving every parameter.
    ///
    /// Fails with `MissingDependency` listing every parameter that cannot
    /// be supplied.
    pub(crate) fn instantiate(&self, consumer: TypeKey, constructor: &Constructor) -> Result<Bean> {
        let missing: Vec<&'static str> = constructor
            .params()
            .iter()
            .filter(|param| !self.provides(param))
            .map(TypeKey::name)
            .collect();

        if !missing.is_empty() {
            return Err(InjectError::MissingDependency {
                type_name: consumer.name(),
                missing,
            });
        }

        let mut args = Vec::with_capacity(constructor.params().len());
        for param in constructor.params() {
            let bean = self
                .resolve(param, &consumer)
                .ok_or(InjectError::NotFound { type_name: param.name() })?;
            args.push(bean);
        }

        constructor.invoke(args)
    }

    /// Keys with a built instance.
    pub(crate) fn instance_keys(&self) -> impl Iterator<Item = TypeKey> + '_ {
        self.instances.keys().copied()
    }

    /// Number of keys with a built instance.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub(crate) fn hierarchy(&self) -> &HierarchyMap {
        &self.hierarchy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::External;
    use crate::factory::Factory;
    use crate::hierarchy::resolve;
    use crate::upcast;
    use std::sync::Arc;

    trait Named: Send + Sync {
        fn name(&self) -> String;
    }

    trait Greeter: Named {}

    struct English;

    impl Named for English {
        fn name(&self) -> String {
            "english".into()
        }
    }

    impl Greeter for English {}

    struct Tag(&'static str);

    impl Named for Tag {
        fn name(&self) -> String {
            self.0.into()
        }
    }

    fn graph(descriptors: &[&TypeDescriptor]) -> TypeGraph {
        let mut graph = TypeGraph::default();
        for ty in descriptors {
            graph.declare(ty);
        }
        graph
    }

    fn hierarchy_of(graph: &TypeGraph, types: &[TypeKey]) -> HierarchyMap {
        resolve(types.iter().copied(), |k: &TypeKey| graph.parents_of(k))
    }

    #[test]
    fn test_paths_follow_supertraits() {
        let external: ExternalBean = External::new(English)
            .implements::<dyn Greeter>(upcast!(dyn Greeter))
            .into();
        let greeter = crate::Interface::<dyn Greeter>::new()
            .extends::<dyn Named>(upcast!(dyn Named))
            .into_descriptor();
        let graph = graph(&[&external.ty, &greeter]);

        let paths = graph.paths_from(TypeKey::of::<English>());
        assert_eq!(paths.len(), 3);
        let named = paths[&TypeKey::of::<dyn Named>()]
            .apply(external.bean.clone())
            .and_then(|b| b.downcast::<dyn Named>())
            .unwrap();
        assert_eq!(named.name(), "english");
    }

    #[test]
    fn test_external_registered_under_every_view() {
        let external: ExternalBean = External::new(English)
            .implements::<dyn Greeter>(upcast!(dyn Greeter))
            .implements::<dyn Named>(upcast!(dyn Named))
            .into();
        let graph = graph(&[&external.ty]);
        let hierarchy = hierarchy_of(&graph, &[TypeKey::of::<English>()]);

        let mut registry = Registry::new(hierarchy);
        let original = external.bean.clone();
        registry.insert_external(&graph, external);

        for key in [
            TypeKey::of::<English>(),
            TypeKey::of::<dyn Greeter>(),
            TypeKey::of::<dyn Named>(),
        ] {
            let bean = registry.instance(&key).unwrap();
            assert!(bean.same_object(&original), "{key}");
            assert_eq!(bean.key(), key);
        }
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_external_keeps_own_key_when_collided() {
        // Both beans claim dyn Named, so only the own keys survive
        let a: ExternalBean = External::new(English).implements::<dyn Named>(upcast!(dyn Named)).into();
        let b: ExternalBean = External::new(Tag("b")).implements::<dyn Named>(upcast!(dyn Named)).into();
        let graph = graph(&[&a.ty, &b.ty]);
        let hierarchy = hierarchy_of(&graph, &[a.key(), b.key()]);

        let mut registry = Registry::new(hierarchy);
        registry.insert_external(&graph, a);
        registry.insert_external(&graph, b);

        assert!(registry.instance(&TypeKey::of::<English>()).is_some());
        assert!(registry.instance(&TypeKey::of::<Tag>()).is_some());
        assert!(registry.instance(&TypeKey::of::<dyn Named>()).is_none());
    }

    #[test]
    fn test_factory_resolved_per_consumer() {
        let factory: ContextualFactory =
            Factory::<Tag>::new(|consumer: &TypeKey| Arc::new(Tag(consumer.name()))).into();
        let graph = graph(&[&factory.ty]);
        let hierarchy = hierarchy_of(&graph, &[factory.key()]);

        let mut registry = Registry::new(hierarchy);
        registry.insert_factory(&graph, factory);

        let key = TypeKey::of::<Tag>();
        assert!(registry.provides(&key));
        assert!(registry.instance(&key).is_none());

        let tag = registry
            .resolve(&key, &TypeKey::of::<English>())
            .and_then(|b| b.downcast::<Tag>())
            .unwrap();
        assert!(tag.0.ends_with("English"));
    }

    #[test]
    fn test_instantiate_reports_all_missing() {
        let registry = Registry::new(HierarchyMap::from_iter(std::iter::empty()));
        let descriptor = crate::Component::<English>::new()
            .inject(|_: (Arc<Tag>, Arc<dyn Named>)| English)
            .into_descriptor();

        let err = registry
            .instantiate(descriptor.key(), &descriptor.injectable_constructors()[0])
            .unwrap_err();
        match err {
            InjectError::MissingDependency { missing, .. } => assert_eq!(missing.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
