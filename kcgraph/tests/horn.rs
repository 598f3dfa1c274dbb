//! Renamable-Horn answers checked against exhaustive search.

use proptest::prelude::*;

use kcgraph::config::GraphConfig;
use kcgraph::horn::is_horn_after_renaming;
use kcgraph::stats::Statistics;
use kcgraph::{CnfFormula, IncidenceGraph, Lit, Var};
use kcgraph_formula::cnf::strategy;
use kcgraph_formula::test::renamable_horn_formula;
use kcgraph_formula::{cnf_formula, lit};

fn graph(formula: &CnfFormula) -> IncidenceGraph {
    let mut graph =
        IncidenceGraph::from_formula(formula, GraphConfig::default(), Statistics::disabled())
            .unwrap();
    graph.init_renamable_horn().unwrap();
    graph
}

/// Try every subset of the variables.
fn brute_force_renamable(formula: &CnfFormula) -> bool {
    let vars: Vec<Var> = formula.vars().collect();
    (0..1u32 << vars.len()).any(|mask| {
        let renamed: Vec<Var> = vars
            .iter()
            .enumerate()
            .filter(|&(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, &var)| var)
            .collect();
        is_horn_after_renaming(formula.iter(), &renamed)
    })
}

#[test]
fn assignments_can_make_a_formula_renamable() {
    let mut graph = graph(&cnf_formula![
        1, 2, 3;
        -1, -2, -3;
        2, 3, 4;
    ]);
    assert_eq!(graph.is_renamable_horn_formula().unwrap(), None);

    graph.remove_literal(lit!(-2), None).unwrap();
    let renamed = graph.is_renamable_horn_formula().unwrap().unwrap();
    assert!(is_horn_after_renaming(graph.to_formula().iter(), &renamed));

    graph.restore_backup_literal(lit!(-2)).unwrap();
    assert_eq!(graph.is_renamable_horn_formula().unwrap(), None);
}

#[test]
fn components_share_the_recognizer() {
    let mut graph = graph(&cnf_formula![
        1, 2, 3;
        -1, -2, -3;
        4, 5;
    ]);
    graph.remove_literal(lit!(1), None).unwrap();

    let children = graph.create_incidence_graphs_for_components().unwrap();
    assert_eq!(children.len(), 2);
    for child in children.iter() {
        assert!(child.horn_initialized());
        let renamed = child.is_renamable_horn_formula().unwrap().unwrap();
        assert!(is_horn_after_renaming(child.to_formula().iter(), &renamed));
        assert!(renamed.iter().all(|&var| child.contains_variable(var)));
    }
}

proptest! {
    #[test]
    fn recognizer_matches_exhaustive_search(
        formula in strategy::cnf_formula(1..7usize, 0..12, 1..4),
    ) {
        let graph = graph(&formula);
        let renamed = graph.is_renamable_horn_formula().unwrap();

        prop_assert_eq!(renamed.is_some(), brute_force_renamable(&formula));
        if let Some(renamed) = renamed {
            prop_assert!(is_horn_after_renaming(formula.iter(), &renamed));
        }
    }

    #[test]
    fn recognizer_follows_assignments(
        formula in strategy::cnf_formula(2..7usize, 0..12, 1..4),
        picks in proptest::collection::vec((0..7usize, proptest::bool::ANY), 0..3),
    ) {
        let mut graph = graph(&formula);

        let mut removed: Vec<Lit> = vec![];
        for (index, polarity) in picks {
            let lit = Lit::from_index(index, polarity);
            if graph.contains_variable(lit.var()) {
                graph.remove_literal(lit, None).unwrap();
                removed.push(lit);
            }
        }

        let live = graph.to_formula();
        let renamed = graph.is_renamable_horn_formula().unwrap();
        prop_assert_eq!(renamed.is_some(), brute_force_renamable(&live));
        if let Some(renamed) = renamed {
            prop_assert!(is_horn_after_renaming(live.iter(), &renamed));
        }

        while let Some(lit) = removed.pop() {
            graph.restore_backup_literal(lit).unwrap();
        }
        prop_assert_eq!(
            graph.is_renamable_horn_formula().unwrap().is_some(),
            brute_force_renamable(&formula)
        );
    }

    #[test]
    fn generated_horn_formulas_are_recognized(
        formula in renamable_horn_formula(1..20usize, 0..30usize, 4),
    ) {
        let graph = graph(&formula);
        let renamed = graph.is_renamable_horn_formula().unwrap();
        prop_assert!(renamed.is_some());
        if let Some(renamed) = renamed {
            prop_assert!(is_horn_after_renaming(formula.iter(), &renamed));
        }
    }
}
