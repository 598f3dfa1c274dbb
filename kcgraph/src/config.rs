//! Graph and caching configuration.
use serde::{Deserialize, Serialize};

/// Configurable behavior of an incidence graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Re-check the length index and the occurrence lists after every backed up mutation.
    /// (Default: false)
    pub check_invariants: bool,
}

impl Default for GraphConfig {
    fn default() -> GraphConfig {
        GraphConfig {
            check_invariants: false,
        }
    }
}

/// The component caching schemes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachingSchemeKind {
    /// Never cache.
    None,
    /// Variables and literal content of the clauses.
    Basic,
    /// Literal content of the distinct clauses.
    Standard,
    /// Variables and clause ids.
    Hybrid,
    /// Canonical relabeling by variable signatures.
    Cara,
}

/// Configurable parameters of component caching.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachingConfig {
    /// Key generation scheme. (Default: cara)
    pub scheme: CachingSchemeKind,

    /// Components with fewer variables get a basic key instead of a canonical one. (Default: 8)
    pub cara_threshold: usize,

    /// Components with more clauses are not cached. (Default: no limit)
    pub max_cached_clauses: Option<usize>,
}

impl Default for CachingConfig {
    fn default() -> CachingConfig {
        CachingConfig {
            scheme: CachingSchemeKind::Cara,
            cara_threshold: 8,
            max_cached_clauses: None,
        }
    }
}
