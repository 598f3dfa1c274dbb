//! Component caching.
//!
//! A [`KeyGenerator`] turns a component graph into a [`ComponentKey`], or refuses to when the
//! component should not be cached. A [`ComponentCache`] maps keys to results. Both sides accept a
//! missing key and then do nothing, so a driver can use the same code path for every scheme.
use std::cell::Cell;

use rustc_hash::FxHashMap;

use crate::config::{CachingConfig, CachingSchemeKind};
use crate::graph::IncidenceGraph;
use crate::stats::{Operation, Statistics};

mod cara;
mod key;
mod schemes;

pub use cara::{CaraScheme, VarSignature};
pub use key::{ComponentKey, Relabeling};
pub use schemes::{BasicScheme, HybridScheme, NoneScheme, StandardScheme};

/// A key together with the relabeling it was computed under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedKey {
    pub key: ComponentKey,
    /// Maps between the component's variables and the canonical ones the key describes. `None`
    /// means the key describes the variables as they are.
    pub relabeling: Option<Relabeling>,
}

impl GeneratedKey {
    pub fn plain(key: ComponentKey) -> GeneratedKey {
        GeneratedKey {
            key,
            relabeling: None,
        }
    }
}

/// Computes cache keys for components.
pub trait KeyGenerator {
    /// The key of the graph's current state, `None` if it should not be cached.
    fn generate_key(&self, graph: &IncidenceGraph) -> Option<GeneratedKey>;
}

/// One of the key schemes, selected by configuration.
#[derive(Copy, Clone, Debug)]
pub enum CachingScheme {
    None(NoneScheme),
    Basic(BasicScheme),
    Standard(StandardScheme),
    Hybrid(HybridScheme),
    Cara(CaraScheme),
}

impl CachingScheme {
    pub fn new(config: &CachingConfig) -> CachingScheme {
        let max_clauses = config.max_cached_clauses;
        match config.scheme {
            CachingSchemeKind::None => CachingScheme::None(NoneScheme),
            CachingSchemeKind::Basic => CachingScheme::Basic(BasicScheme { max_clauses }),
            CachingSchemeKind::Standard => CachingScheme::Standard(StandardScheme { max_clauses }),
            CachingSchemeKind::Hybrid => CachingScheme::Hybrid(HybridScheme { max_clauses }),
            CachingSchemeKind::Cara => CachingScheme::Cara(CaraScheme {
                threshold: config.cara_threshold,
                max_clauses,
            }),
        }
    }

    pub fn kind(&self) -> CachingSchemeKind {
        match self {
            CachingScheme::None(_) => CachingSchemeKind::None,
            CachingScheme::Basic(_) => CachingSchemeKind::Basic,
            CachingScheme::Standard(_) => CachingSchemeKind::Standard,
            CachingScheme::Hybrid(_) => CachingSchemeKind::Hybrid,
            CachingScheme::Cara(_) => CachingSchemeKind::Cara,
        }
    }
}

impl Default for CachingScheme {
    fn default() -> CachingScheme {
        CachingScheme::new(&CachingConfig::default())
    }
}

impl KeyGenerator for CachingScheme {
    fn generate_key(&self, graph: &IncidenceGraph) -> Option<GeneratedKey> {
        let stats = graph.statistics();
        let _timer = stats.time(Operation::GenerateKey);
        let generated = match self {
            CachingScheme::None(scheme) => scheme.generate_key(graph),
            CachingScheme::Basic(scheme) => scheme.generate_key(graph),
            CachingScheme::Standard(scheme) => scheme.generate_key(graph),
            CachingScheme::Hybrid(scheme) => scheme.generate_key(graph),
            CachingScheme::Cara(scheme) => scheme.generate_key(graph),
        };
        stats.count(Operation::GenerateKey, generated.is_some() as usize);
        generated
    }
}

/// Results of already solved components.
pub struct ComponentCache<V> {
    entries: FxHashMap<ComponentKey, V>,
    hits: Cell<u64>,
    misses: Cell<u64>,
    stats: Statistics,
}

impl<V> Default for ComponentCache<V> {
    fn default() -> ComponentCache<V> {
        ComponentCache::new(Statistics::disabled())
    }
}

impl<V> ComponentCache<V> {
    pub fn new(stats: Statistics) -> ComponentCache<V> {
        ComponentCache {
            entries: FxHashMap::default(),
            hits: Cell::new(0),
            misses: Cell::new(0),
            stats,
        }
    }

    /// Store a result. Replaces an earlier result for the same key.
    pub fn add(&mut self, key: Option<&ComponentKey>, value: V) {
        if let Some(&key) = key {
            self.entries.insert(key, value);
        }
    }

    /// Look up a result. A missing key counts as neither hit nor miss.
    pub fn get(&self, key: Option<&ComponentKey>) -> Option<&V> {
        let key = key?;
        let _timer = self.stats.time(Operation::CacheLookup);
        let value = self.entries.get(key);
        match value {
            Some(_) => {
                log::trace!("cache hit for {:?}", key);
                self.hits.set(self.hits.get() + 1);
                self.stats.count(Operation::CacheLookup, 1);
            }
            None => {
                log::trace!("cache miss for {:?}", key);
                self.misses.set(self.misses.get() + 1)
            }
        }
        value
    }

    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hit_count(&self) -> u64 {
        self.hits.get()
    }

    pub fn miss_count(&self) -> u64 {
        self.misses.get()
    }

    /// Remove all entries. The hit and miss counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use kcgraph_formula::cnf_formula;

    use crate::config::GraphConfig;

    #[test]
    fn missing_keys_are_ignored() {
        let mut cache = ComponentCache::default();
        cache.add(None, 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get(None), None);
        assert_eq!(cache.hit_count() + cache.miss_count(), 0);
    }

    #[test]
    fn lookups_are_counted() {
        let stats = Statistics::enabled();
        let graph = IncidenceGraph::from_formula(
            &cnf_formula![
                1, 2;
                -1, 3;
            ],
            GraphConfig::default(),
            stats.clone(),
        )
        .unwrap();

        let scheme = CachingScheme::new(&CachingConfig {
            scheme: CachingSchemeKind::Basic,
            ..CachingConfig::default()
        });
        assert_eq!(scheme.kind(), CachingSchemeKind::Basic);
        let key = scheme.generate_key(&graph).map(|generated| generated.key);
        assert!(key.is_some());

        let mut cache = ComponentCache::new(stats.clone());
        assert_eq!(cache.get(key.as_ref()), None);
        cache.add(key.as_ref(), "result");
        assert_eq!(cache.get(key.as_ref()), Some(&"result"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hit_count(), 1);
        assert_eq!(cache.miss_count(), 1);

        let report = stats.report().unwrap();
        assert_eq!(report.get(Operation::CacheLookup).calls, 2);
        assert_eq!(report.get(Operation::CacheLookup).results, 1);
        assert_eq!(report.get(Operation::GenerateKey).calls, 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.hit_count(), 1);
    }

    #[test]
    fn none_scheme_disables_caching() {
        let graph = IncidenceGraph::from_formula(
            &cnf_formula![
                1, 2;
            ],
            GraphConfig::default(),
            Statistics::disabled(),
        )
        .unwrap();
        let scheme = CachingScheme::new(&CachingConfig {
            scheme: CachingSchemeKind::None,
            ..CachingConfig::default()
        });
        assert_eq!(scheme.generate_key(&graph), None);
    }
}
