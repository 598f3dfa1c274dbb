//! Occurrence lists of literals.
use rustc_hash::FxHashSet;

use crate::lit::{Lit, Var};
use crate::store::ClauseId;

/// Per-literal clause sets.
///
/// The static polarity lists record the sign of every edge when the edge is created and are not
/// touched when edges are removed by assignments, so the sign of a removed edge can still be
/// looked up. The live lists hold exactly the current edges.
#[derive(Default)]
pub struct Occurrences {
    /// Indexed by literal code.
    static_polarity: Vec<FxHashSet<ClauseId>>,
    /// Indexed by literal code.
    live: Vec<FxHashSet<ClauseId>>,
    /// Returned for literals beyond the allocated range.
    empty: FxHashSet<ClauseId>,
}

/// Changes to the static polarity lists made by [`Occurrences::record_static`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StaticChange {
    /// The edge was not listed under its literal before.
    pub inserted: bool,
    /// The edge was listed under the opposite literal before.
    pub displaced: bool,
}

impl Occurrences {
    /// Grow the lists to cover the given number of variables.
    pub fn ensure_var_count(&mut self, count: usize) {
        if self.live.len() < count * 2 {
            self.static_polarity.resize_with(count * 2, FxHashSet::default);
            self.live.resize_with(count * 2, FxHashSet::default);
        }
    }

    /// Record the polarity of a new edge.
    pub fn record_static(&mut self, lit: Lit, clause: ClauseId) -> StaticChange {
        self.ensure_var_count(lit.index() + 1);
        let displaced = self.static_polarity[(!lit).code()].remove(&clause);
        let inserted = self.static_polarity[lit.code()].insert(clause);
        StaticChange {
            inserted,
            displaced,
        }
    }

    /// Revert a [`StaticChange`].
    pub fn revert_static(&mut self, lit: Lit, clause: ClauseId, change: StaticChange) {
        if change.inserted {
            self.static_polarity[lit.code()].remove(&clause);
        }
        if change.displaced {
            self.static_polarity[(!lit).code()].insert(clause);
        }
    }

    /// Polarity of the edge between `var` and `clause` as recorded on creation.
    pub fn edge_polarity(&self, var: Var, clause: ClauseId) -> Option<bool> {
        let listed = |lit: Lit| {
            self.static_polarity
                .get(lit.code())
                .map_or(false, |clauses| clauses.contains(&clause))
        };
        match (listed(var.positive()), listed(var.negative())) {
            (true, false) => Some(true),
            (false, true) => Some(false),
            _ => None,
        }
    }

    /// Clauses the literal was ever attached to, including removed edges.
    pub fn static_clauses(&self, lit: Lit) -> &FxHashSet<ClauseId> {
        self.static_polarity.get(lit.code()).unwrap_or(&self.empty)
    }

    pub fn insert_live(&mut self, lit: Lit, clause: ClauseId) -> bool {
        self.ensure_var_count(lit.index() + 1);
        self.live[lit.code()].insert(clause)
    }

    pub fn remove_live(&mut self, lit: Lit, clause: ClauseId) -> bool {
        match self.live.get_mut(lit.code()) {
            Some(clauses) => clauses.remove(&clause),
            None => false,
        }
    }

    /// Live clauses containing the literal.
    pub fn live(&self, lit: Lit) -> &FxHashSet<ClauseId> {
        self.live.get(lit.code()).unwrap_or(&self.empty)
    }

    /// Live clauses containing the literal, in increasing order.
    pub fn live_sorted(&self, lit: Lit) -> Vec<ClauseId> {
        let mut clauses: Vec<ClauseId> = self.live(lit).iter().cloned().collect();
        clauses.sort_unstable();
        clauses
    }

    /// Live clauses containing the variable in either polarity.
    pub fn clauses_of(&self, var: Var) -> impl Iterator<Item = ClauseId> + '_ {
        self.live(var.positive())
            .iter()
            .chain(self.live(var.negative()).iter())
            .cloned()
    }

    /// Number of live edges of a variable.
    pub fn degree(&self, var: Var) -> usize {
        self.live(var.positive()).len() + self.live(var.negative()).len()
    }
}
