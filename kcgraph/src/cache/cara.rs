//! Keys invariant under variable renaming.
//!
//! Variables are ordered by a signature of their occurrences and renamed to their rank. Clauses are
//! rewritten under that renaming before hashing, so components that differ only in variable names
//! get the same key as long as the signatures order their variables the same way. Variables with
//! equal occurrence statistics are ordered by name, which makes the key approximate: some renamed
//! copies of a component get different keys. Different keys never come from the same component.
use ordered_float::OrderedFloat;

use crate::graph::IncidenceGraph;
use crate::lit::{Lit, Var};

use super::key::{KeyWriter, Relabeling, SchemeTag};
use super::schemes::{within_limit, BasicScheme};
use super::{GeneratedKey, KeyGenerator};

/// Occurrence statistics of a variable, ordered for canonical labeling.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct VarSignature {
    pub positive_count: usize,
    pub negative_count: usize,
    pub positive_mean_len: OrderedFloat<f64>,
    pub negative_mean_len: OrderedFloat<f64>,
    pub var: Var,
}

impl VarSignature {
    pub fn of(graph: &IncidenceGraph, var: Var) -> VarSignature {
        let mean_len = |lit: Lit| {
            let count = graph.literal_number_of_occurrences(lit);
            if count == 0 {
                OrderedFloat(0.0)
            } else {
                OrderedFloat(graph.literal_sum_lengths_clauses(lit) as f64 / count as f64)
            }
        };
        VarSignature {
            positive_count: graph.literal_number_of_occurrences(var.positive()),
            negative_count: graph.literal_number_of_occurrences(var.negative()),
            positive_mean_len: mean_len(var.positive()),
            negative_mean_len: mean_len(var.negative()),
            var,
        }
    }
}

/// Canonical relabeling by variable signatures.
///
/// Components with fewer than `threshold` variables get a [`BasicScheme`] key without relabeling.
#[derive(Copy, Clone, Debug)]
pub struct CaraScheme {
    pub threshold: usize,
    pub max_clauses: Option<usize>,
}

impl Default for CaraScheme {
    fn default() -> CaraScheme {
        CaraScheme {
            threshold: 8,
            max_clauses: None,
        }
    }
}

impl CaraScheme {
    /// The relabeling that orders the variables of a graph by signature.
    pub fn relabeling(graph: &IncidenceGraph) -> Relabeling {
        let mut signatures: Vec<VarSignature> = graph
            .variables()
            .map(|var| VarSignature::of(graph, var))
            .collect();
        signatures.sort_unstable();
        Relabeling::from_order(signatures.into_iter().map(|sig| sig.var).collect())
    }
}

impl KeyGenerator for CaraScheme {
    fn generate_key(&self, graph: &IncidenceGraph) -> Option<GeneratedKey> {
        if !within_limit(graph, self.max_clauses) {
            return None;
        }
        if graph.variable_count() < self.threshold {
            let basic = BasicScheme {
                max_clauses: self.max_clauses,
            };
            return basic.generate_key(graph);
        }

        let relabeling = CaraScheme::relabeling(graph);

        let mut clauses = vec![];
        for id in graph.clauses() {
            let mut clause = graph
                .sorted_clause(id)
                .ok()?
                .iter()
                .map(|&lit| relabeling.canonical_lit(lit))
                .collect::<Option<Vec<Lit>>>()?;
            clause.sort_unstable();
            clauses.push(clause);
        }
        clauses.sort_unstable();

        let mut writer = KeyWriter::new(SchemeTag::Cara);
        writer.count(relabeling.len());
        writer.count(clauses.len());
        for clause in clauses.iter() {
            writer.lits(clause);
        }

        Some(GeneratedKey {
            key: writer.finish(),
            relabeling: Some(relabeling),
        })
    }
}
