//! Hash-based key schemes.
use crate::graph::IncidenceGraph;
use crate::lit::{Lit, Var};

use super::key::{KeyWriter, SchemeTag};
use super::{GeneratedKey, KeyGenerator};

/// Whether a graph is small enough to be cached.
pub(super) fn within_limit(graph: &IncidenceGraph, max_clauses: Option<usize>) -> bool {
    max_clauses.map_or(true, |max| graph.clause_count() <= max)
}

/// Sorted literal lists of all live clauses, in sorted order.
pub(super) fn sorted_clauses(graph: &IncidenceGraph) -> Option<Vec<Vec<Lit>>> {
    let mut clauses = graph
        .clauses()
        .map(|id| graph.sorted_clause(id).map(<[Lit]>::to_vec).ok())
        .collect::<Option<Vec<_>>>()?;
    clauses.sort_unstable();
    Some(clauses)
}

/// Never produces a key.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoneScheme;

impl KeyGenerator for NoneScheme {
    fn generate_key(&self, _graph: &IncidenceGraph) -> Option<GeneratedKey> {
        None
    }
}

/// Hashes the distinct clauses.
///
/// Components with the same clauses collide even if one has extra variables without edges.
#[derive(Copy, Clone, Debug, Default)]
pub struct StandardScheme {
    pub max_clauses: Option<usize>,
}

impl KeyGenerator for StandardScheme {
    fn generate_key(&self, graph: &IncidenceGraph) -> Option<GeneratedKey> {
        if !within_limit(graph, self.max_clauses) {
            return None;
        }
        let mut clauses = sorted_clauses(graph)?;
        clauses.dedup();

        let mut writer = KeyWriter::new(SchemeTag::Standard);
        writer.count(clauses.len());
        for clause in clauses.iter() {
            writer.lits(clause);
        }
        Some(GeneratedKey::plain(writer.finish()))
    }
}

/// Hashes the variables and the clauses.
#[derive(Copy, Clone, Debug, Default)]
pub struct BasicScheme {
    pub max_clauses: Option<usize>,
}

impl KeyGenerator for BasicScheme {
    fn generate_key(&self, graph: &IncidenceGraph) -> Option<GeneratedKey> {
        if !within_limit(graph, self.max_clauses) {
            return None;
        }
        let variables: Vec<Var> = graph.variables().collect();
        let clauses = sorted_clauses(graph)?;

        let mut writer = KeyWriter::new(SchemeTag::Basic);
        writer.vars(&variables);
        writer.count(clauses.len());
        for clause in clauses.iter() {
            writer.lits(clause);
        }
        Some(GeneratedKey::plain(writer.finish()))
    }
}

/// Hashes the variables and the clause ids.
///
/// Relies on clause ids being stable, which holds for component graphs split off from one
/// formula.
#[derive(Copy, Clone, Debug, Default)]
pub struct HybridScheme {
    pub max_clauses: Option<usize>,
}

impl KeyGenerator for HybridScheme {
    fn generate_key(&self, graph: &IncidenceGraph) -> Option<GeneratedKey> {
        if !within_limit(graph, self.max_clauses) {
            return None;
        }
        let variables: Vec<Var> = graph.variables().collect();

        let mut writer = KeyWriter::new(SchemeTag::Hybrid);
        writer.vars(&variables);
        writer.count(graph.clause_count());
        for id in graph.clauses() {
            writer.word(id.index() as u64);
        }
        Some(GeneratedKey::plain(writer.finish()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use kcgraph_formula::{cnf_formula, lit};

    use crate::cache::ComponentKey;
    use crate::cnf::CnfFormula;
    use crate::config::GraphConfig;
    use crate::stats::Statistics;
    use crate::store::ClauseId;

    fn graph(formula: &CnfFormula) -> IncidenceGraph {
        IncidenceGraph::from_formula(formula, GraphConfig::default(), Statistics::disabled())
            .unwrap()
    }

    fn key(scheme: &impl KeyGenerator, graph: &IncidenceGraph) -> ComponentKey {
        scheme.generate_key(graph).unwrap().key
    }

    #[test]
    fn standard_ignores_duplicate_clauses() {
        let a = graph(&cnf_formula![
            1, 2;
            -2, 3;
        ]);
        let b = graph(&cnf_formula![
            -2, 3;
            1, 2;
            2, 1;
        ]);
        let scheme = StandardScheme::default();
        assert_eq!(key(&scheme, &a), key(&scheme, &b));
        assert_ne!(key(&BasicScheme::default(), &a), key(&BasicScheme::default(), &b));
    }

    #[test]
    fn basic_sees_isolated_variables() {
        let a = graph(&cnf_formula![
            1, 2;
        ]);
        let mut b = graph(&cnf_formula![
            1, 2;
        ]);
        b.add_variable(lit!(5).var()).unwrap();

        assert_eq!(
            key(&StandardScheme::default(), &a),
            key(&StandardScheme::default(), &b)
        );
        assert_ne!(key(&BasicScheme::default(), &a), key(&BasicScheme::default(), &b));
    }

    #[test]
    fn hybrid_ignores_polarity() {
        let a = graph(&cnf_formula![
            1, 2;
            -2, 3;
        ]);
        let mut b = graph(&cnf_formula![
            1, 2;
            2, 3;
        ]);
        assert_eq!(
            key(&HybridScheme::default(), &a),
            key(&HybridScheme::default(), &b)
        );
        assert_ne!(key(&BasicScheme::default(), &a), key(&BasicScheme::default(), &b));

        b.remove_edge(lit!(3), ClauseId::from_index(1)).unwrap();
        b.add_edge(lit!(-3), ClauseId::from_index(1)).unwrap();
        assert_eq!(
            key(&HybridScheme::default(), &a),
            key(&HybridScheme::default(), &b)
        );
    }

    #[test]
    fn large_components_get_no_key() {
        let a = graph(&cnf_formula![
            1, 2;
            -2, 3;
        ]);
        assert!(NoneScheme.generate_key(&a).is_none());
        let scheme = BasicScheme {
            max_clauses: Some(1),
        };
        assert!(scheme.generate_key(&a).is_none());
        let scheme = BasicScheme {
            max_clauses: Some(2),
        };
        assert!(scheme.generate_key(&a).is_some());
    }
}
