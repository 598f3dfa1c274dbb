//! Cache key properties.

use proptest::prelude::*;

use rand::SeedableRng;

use kcgraph::cache::{
    BasicScheme, CachingScheme, CaraScheme, ComponentCache, HybridScheme, KeyGenerator,
    StandardScheme,
};
use kcgraph::config::{CachingConfig, CachingSchemeKind, GraphConfig};
use kcgraph::stats::{Operation, Statistics};
use kcgraph::{ClauseId, CnfFormula, IncidenceGraph, Lit};
use kcgraph_formula::cnf::strategy::cnf_formula;
use kcgraph_formula::test::permute_formula;

fn graph(formula: &CnfFormula) -> IncidenceGraph {
    IncidenceGraph::from_formula(formula, GraphConfig::default(), Statistics::disabled()).unwrap()
}

fn schemes() -> Vec<Box<dyn KeyGenerator>> {
    vec![
        Box::new(StandardScheme::default()),
        Box::new(BasicScheme::default()),
        Box::new(HybridScheme::default()),
        Box::new(CaraScheme {
            threshold: 0,
            max_clauses: None,
        }),
    ]
}

#[test]
fn driver_loop_reuses_component_results() {
    let stats = Statistics::enabled();
    let formula = kcgraph_formula::cnf_formula![
        1, 2;
        -2, 3;
        4, 5;
        -5, 6;
    ];
    let mut graph =
        IncidenceGraph::from_formula(&formula, GraphConfig::default(), stats.clone()).unwrap();
    let scheme = CachingScheme::new(&CachingConfig {
        scheme: CachingSchemeKind::Cara,
        cara_threshold: 0,
        max_cached_clauses: None,
    });
    let mut cache = ComponentCache::new(stats.clone());

    // Both components are chains of two binary clauses with the same shape.
    for child in graph.create_incidence_graphs_for_components().unwrap() {
        let key = scheme.generate_key(&child).map(|generated| generated.key);
        if cache.get(key.as_ref()).is_none() {
            cache.add(key.as_ref(), child.variable_count());
        }
    }
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.hit_count(), 1);
    assert_eq!(cache.miss_count(), 1);

    graph.remove_literal(kcgraph_formula::lit!(-2), None).unwrap();
    let children = graph.create_incidence_graphs_for_components().unwrap();
    assert_eq!(children.len(), 2);
    graph.restore_backup_literal(kcgraph_formula::lit!(-2)).unwrap();

    let report = stats.report().unwrap();
    assert_eq!(report.get(Operation::CacheLookup).calls, 2);
    assert_eq!(report.get(Operation::GenerateKey).calls, 2);
    assert_eq!(report.get(Operation::RemoveLiteral).calls, 1);
    assert_eq!(report.get(Operation::RestoreLiteral).calls, 1);
}

proptest! {
    #[test]
    fn keys_are_deterministic(formula in cnf_formula(1..10usize, 0..20, 0..5)) {
        let a = graph(&formula);
        let b = graph(&formula);
        for scheme in schemes() {
            let key_a = scheme.generate_key(&a).map(|generated| generated.key);
            prop_assert!(key_a.is_some());
            prop_assert_eq!(key_a, scheme.generate_key(&a).map(|generated| generated.key));
            prop_assert_eq!(key_a, scheme.generate_key(&b).map(|generated| generated.key));
        }
    }

    #[test]
    fn keys_survive_backtracking(
        formula in cnf_formula(1..10usize, 1..20, 1..5),
        index in 0..10usize,
        polarity in proptest::bool::ANY,
    ) {
        let mut graph = graph(&formula);
        let lit = Lit::from_index(index, polarity);
        prop_assume!(graph.contains_variable(lit.var()));

        let before: Vec<_> = schemes()
            .iter()
            .map(|scheme| scheme.generate_key(&graph))
            .collect();
        graph.remove_literal(lit, None).unwrap();
        graph.restore_backup_literal(lit).unwrap();
        let after: Vec<_> = schemes()
            .iter()
            .map(|scheme| scheme.generate_key(&graph))
            .collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn edge_edits_change_literal_keys(
        formula in cnf_formula(2..10usize, 1..20, 1..5),
    ) {
        let mut graph = graph(&formula);
        let id = ClauseId::from_index(0);
        let lit = graph.sorted_clause(id).unwrap()[0];

        let basic = BasicScheme::default();
        let basic_before = basic.generate_key(&graph).unwrap().key;

        graph.remove_edge(lit, id).unwrap();
        graph.add_edge(!lit, id).unwrap();

        prop_assert_ne!(basic.generate_key(&graph).unwrap().key, basic_before);
    }

    #[test]
    fn basic_keys_see_renaming(
        formula in cnf_formula(2..10usize, 1..20, 1..5),
        seed in proptest::num::u64::ANY,
    ) {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let (permuted, _) = permute_formula(&formula, &mut rng);

        let original = graph(&formula);
        let renamed = graph(&permuted);

        let clauses = |graph: &IncidenceGraph| {
            let mut clauses: Vec<Vec<Lit>> = graph
                .clauses()
                .map(|id| graph.sorted_clause(id).unwrap().to_vec())
                .collect();
            clauses.sort_unstable();
            clauses
        };
        let vars = |graph: &IncidenceGraph| graph.variables().collect::<Vec<_>>();
        prop_assume!(
            clauses(&original) != clauses(&renamed) || vars(&original) != vars(&renamed)
        );

        prop_assert_ne!(
            BasicScheme::default().generate_key(&original).unwrap().key,
            BasicScheme::default().generate_key(&renamed).unwrap().key
        );
    }
}
