//! Cache keys and relabelings.
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::Hasher;

use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};

use crate::lit::{Lit, Var};

/// Digest identifying a component.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentKey(u128);

impl ComponentKey {
    pub fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Debug for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Scheme tags keeping the word streams of different schemes apart.
#[derive(Copy, Clone)]
#[repr(u64)]
pub enum SchemeTag {
    Standard = 1,
    Basic = 2,
    Hybrid = 3,
    Cara = 4,
}

/// Builds a [`ComponentKey`] from a stream of words.
///
/// Two independent 64-bit hashes of the same stream form the key. Variable length parts of the
/// stream are written with a length prefix, so different structures never produce the same
/// stream.
pub struct KeyWriter {
    fx: FxHasher,
    sip: DefaultHasher,
}

impl KeyWriter {
    pub fn new(tag: SchemeTag) -> KeyWriter {
        let mut writer = KeyWriter {
            fx: FxHasher::default(),
            sip: DefaultHasher::new(),
        };
        writer.word(tag as u64);
        writer
    }

    pub fn word(&mut self, word: u64) {
        self.fx.write_u64(word);
        self.sip.write_u64(word);
    }

    pub fn count(&mut self, count: usize) {
        self.word(count as u64);
    }

    pub fn lits(&mut self, lits: &[Lit]) {
        self.count(lits.len());
        for lit in lits {
            self.word(lit.code() as u64);
        }
    }

    pub fn vars(&mut self, vars: &[Var]) {
        self.count(vars.len());
        for var in vars {
            self.word(var.index() as u64);
        }
    }

    pub fn finish(self) -> ComponentKey {
        ComponentKey((u128::from(self.fx.finish()) << 64) | u128::from(self.sip.finish()))
    }
}

/// Bijection between the variables of a component and canonical variables `0..n`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Relabeling {
    forward: FxHashMap<Var, Var>,
    inverse: Vec<Var>,
}

impl Relabeling {
    /// The relabeling sending `order[i]` to the variable of index `i`.
    pub fn from_order(order: Vec<Var>) -> Relabeling {
        let forward = order
            .iter()
            .enumerate()
            .map(|(index, &var)| (var, Var::from_index(index)))
            .collect();
        Relabeling {
            forward,
            inverse: order,
        }
    }

    pub fn len(&self) -> usize {
        self.inverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inverse.is_empty()
    }

    /// Canonical variable of an original variable.
    pub fn canonical(&self, var: Var) -> Option<Var> {
        self.forward.get(&var).cloned()
    }

    /// Original variable of a canonical variable.
    pub fn original(&self, canonical: Var) -> Option<Var> {
        self.inverse.get(canonical.index()).cloned()
    }

    pub fn canonical_lit(&self, lit: Lit) -> Option<Lit> {
        self.canonical(lit.var())
            .map(|var| var.lit(lit.is_positive()))
    }

    pub fn original_lit(&self, lit: Lit) -> Option<Lit> {
        self.original(lit.var())
            .map(|var| var.lit(lit.is_positive()))
    }

    /// Original variables ordered by their canonical index.
    pub fn inverse(&self) -> &[Var] {
        &self.inverse
    }
}
