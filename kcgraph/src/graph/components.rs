//! Connected components.
use partial_ref::{partial, PartialRef};

use crate::context::{GraphContext, OccurrencesP, StoreP};
use crate::lit::Var;

/// Variable sets of the connected components.
///
/// Each set is sorted and the sets are ordered by their smallest variable. Variables without
/// edges form singleton components. Clauses without literals belong to no component.
pub fn connected_components(ctx: partial!(GraphContext, OccurrencesP, StoreP)) -> Vec<Vec<Var>> {
    let store = ctx.part(StoreP);
    let occurrences = ctx.part(OccurrencesP);

    let mut var_seen = vec![false; store.var_slots()];
    let mut clause_seen = vec![false; store.clause_slots()];
    let mut stack = vec![];
    let mut components = vec![];

    for root in store.variables() {
        if var_seen[root.index()] {
            continue;
        }
        var_seen[root.index()] = true;
        stack.push(root);

        let mut component = vec![];
        while let Some(var) = stack.pop() {
            component.push(var);
            for clause in occurrences.clauses_of(var) {
                if clause_seen[clause.index()] {
                    continue;
                }
                clause_seen[clause.index()] = true;
                for lit in store.clause(clause).into_iter().flatten() {
                    let next = lit.var();
                    if !var_seen[next.index()] {
                        var_seen[next.index()] = true;
                        stack.push(next);
                    }
                }
            }
        }

        component.sort_unstable();
        components.push(component);
    }

    components
}
