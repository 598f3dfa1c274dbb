use proptest::{prelude::*, *};

use crate::cnf::CnfFormula;
use crate::config::GraphConfig;
use crate::graph::IncidenceGraph;
use crate::lit::Lit;
use crate::stats::Statistics;

/// Enable log output for a test, controlled by `RUST_LOG`.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A graph that re-checks its invariants after every mutation.
pub fn checked_graph(formula: &CnfFormula) -> IncidenceGraph {
    IncidenceGraph::from_formula(
        formula,
        GraphConfig {
            check_invariants: true,
        },
        Statistics::enabled(),
    )
    .unwrap()
}

/// Literals over the variables of a formula, picked by index.
pub fn formula_lits(
    formula: &CnfFormula,
    count: impl Into<collection::SizeRange>,
) -> impl Strategy<Value = Vec<Lit>> {
    let vars = formula.var_count().max(1);
    collection::vec((0..vars, bool::ANY), count).prop_map(|picks| {
        picks
            .into_iter()
            .map(|(index, polarity)| Lit::from_index(index, polarity))
            .collect()
    })
}
