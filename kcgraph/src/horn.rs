//! Renamable-Horn recognition.
//!
//! A clause set is renamable Horn if negating the variables of some set `R` everywhere leaves at
//! most one positive literal per clause. With a variable `r_v` standing for `v ∈ R`, the literal
//! `l` of `v` is positive after renaming iff `p(l)` holds, where `p(l) = ¬r_v` for positive and
//! `p(l) = r_v` for negative `l`. Requiring at most one true `p(l)` per clause is a set of binary
//! clauses, so recognition reduces to 2-SAT.
//!
//! The encoding is built once for the clauses of a graph. Each clause gets a guard variable that
//! switches its binary clauses off, so the same encoding answers queries for every subformula
//! reachable by removing literals and clauses.
use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::lit::{Lit, Var};
use crate::store::{ClauseId, ClauseStore};

mod two_sat;

pub use two_sat::{GuardedBinaryClauses, Propagation, PropagationOracle};

/// The guard and the literals of an encoded clause.
struct EncodedClause {
    guard: Var,
    lits: FxHashSet<Lit>,
}

/// Recognizer for renamable-Horn subformulas of a fixed clause set.
pub struct HornRecognizer {
    /// Number of variables of the encoded clause set. Rename variables share their index.
    original_var_count: usize,
    clauses: Vec<Option<EncodedClause>>,
    oracle: GuardedBinaryClauses,
}

/// The literal `r_v` or `¬r_v` that is true iff `lit` is positive after renaming.
fn renamed_positive(lit: Lit) -> Lit {
    Lit::from_var(lit.var(), lit.is_negative())
}

impl HornRecognizer {
    /// Encode the live clauses of a store.
    pub fn new(store: &ClauseStore) -> Result<HornRecognizer> {
        let original_var_count = store.var_slots();
        let mut next_var = original_var_count;
        let mut fresh = || {
            let var = Var::from_index(next_var);
            next_var += 1;
            var
        };

        let mut clauses: Vec<Option<EncodedClause>> = vec![];
        let mut binary: Vec<([Lit; 2], Var)> = vec![];
        let mut guards = vec![];

        for id in store.clauses() {
            let lits = store.sorted_clause(id)?;
            let guard = fresh();
            guards.push(guard);

            // Sequential counter: s_i holds if one of the first i literals is positive.
            let positive: Vec<Lit> = lits.iter().cloned().map(renamed_positive).collect();
            if let Some((&last, rest)) = positive.split_last() {
                let mut previous: Option<Lit> = None;
                for &x in rest.iter() {
                    let s = fresh().positive();
                    binary.push(([!x, s], guard));
                    if let Some(previous) = previous {
                        binary.push(([!previous, s], guard));
                        binary.push(([!x, !previous], guard));
                    }
                    previous = Some(s);
                }
                if let Some(previous) = previous {
                    binary.push(([!last, !previous], guard));
                }
            }

            if clauses.len() <= id.index() {
                clauses.resize_with(id.index() + 1, || None);
            }
            clauses[id.index()] = Some(EncodedClause {
                guard,
                lits: lits.iter().cloned().collect(),
            });
        }

        let mut oracle = GuardedBinaryClauses::default();
        oracle.set_var_count(next_var);
        for guard in guards {
            oracle.add_guard(guard);
        }
        for (lits, guard) in binary {
            oracle.add_clause(lits, Some(guard));
        }

        Ok(HornRecognizer {
            original_var_count,
            clauses,
            oracle,
        })
    }

    /// Number of variables of the encoding.
    pub fn var_count(&self) -> usize {
        self.oracle.var_count()
    }

    /// Number of binary clauses of the encoding.
    pub fn clause_count(&self) -> usize {
        self.oracle.count()
    }

    /// Assumptions describing the live part of `store` after assigning `assigned`.
    ///
    /// Every live clause must be encoded with a superset of its current literals.
    fn assumptions(
        &self,
        store: &ClauseStore,
        assigned: impl Iterator<Item = Lit>,
    ) -> Result<Vec<Lit>> {
        let mut assumptions = vec![];
        for (index, clause) in self.clauses.iter().enumerate() {
            if let Some(clause) = clause {
                let live = store.contains_clause(ClauseId::from_index(index));
                assumptions.push(clause.guard.lit(!live));
            }
        }

        for id in store.clauses() {
            let clause = self
                .clauses
                .get(id.index())
                .and_then(Option::as_ref)
                .ok_or_else(|| corrupt!("clause {} is not part of the Horn encoding", id))?;
            if let Some(lit) = store.clause(id)?.iter().find(|lit| !clause.lits.contains(lit)) {
                return Err(corrupt!(
                    "literal {} of clause {} is not part of the Horn encoding",
                    lit,
                    id
                ));
            }
        }

        // The removed literal !t of a shortened clause must not count as positive.
        assumptions.extend(
            assigned
                .filter(|lit| lit.index() < self.original_var_count)
                .map(|lit| !renamed_positive(!lit)),
        );
        Ok(assumptions)
    }

    /// Live variables of `store` to rename, `None` if the live clauses are not renamable Horn.
    pub fn renaming(
        &self,
        store: &ClauseStore,
        assigned: impl Iterator<Item = Lit>,
    ) -> Result<Option<Vec<Var>>> {
        let assumptions = self.assumptions(store, assigned)?;
        let model = match self.oracle.find_model(&assumptions) {
            Some(model) => model,
            None => {
                log::trace!("subformula is not renamable Horn");
                return Ok(None);
            }
        };

        let mut renamed: Vec<Var> = model
            .into_iter()
            .filter(|lit| lit.is_positive() && lit.index() < self.original_var_count)
            .map(|lit| lit.var())
            .filter(|&var| store.contains_variable(var))
            .collect();
        renamed.sort_unstable();
        Ok(Some(renamed))
    }

    /// Unit propagate the constraints of the live part of `store`.
    pub fn propagate(
        &self,
        store: &ClauseStore,
        assigned: impl Iterator<Item = Lit>,
    ) -> Result<Propagation> {
        let assumptions = self.assumptions(store, assigned)?;
        Ok(self.oracle.propagate(&assumptions))
    }
}

/// Whether every clause has at most one positive literal after negating the `renamed` variables.
pub fn is_horn_after_renaming<'a>(
    clauses: impl IntoIterator<Item = &'a [Lit]>,
    renamed: &[Var],
) -> bool {
    clauses.into_iter().all(|clause| {
        clause
            .iter()
            .filter(|lit| lit.is_positive() != renamed.contains(&lit.var()))
            .count()
            <= 1
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use kcgraph_formula::{lit, lits};

    use crate::error::GraphError;

    fn store(clauses: &[&[Lit]]) -> ClauseStore {
        let mut store = ClauseStore::default();
        for (index, clause) in clauses.iter().enumerate() {
            for lit in clause.iter() {
                if !store.contains_variable(lit.var()) {
                    store.add_variable(lit.var()).unwrap();
                }
            }
            store
                .add_clause(ClauseId::from_index(index), clause.iter().cloned())
                .unwrap();
        }
        store
    }

    #[test]
    fn renaming_makes_clauses_horn() {
        let clauses: &[&[Lit]] = &[&lits![1, 2], &lits![-1, 3], &lits![2, 3, -4]];
        let store = store(clauses);
        let recognizer = HornRecognizer::new(&store).unwrap();

        let renamed = recognizer.renaming(&store, None.into_iter()).unwrap().unwrap();
        assert!(is_horn_after_renaming(clauses.iter().cloned(), &renamed));
    }

    #[test]
    fn three_positive_pairs_are_not_renamable() {
        let clauses: &[&[Lit]] = &[&lits![1, 2, 3], &lits![-1, -2, -3]];
        let store = store(clauses);
        let recognizer = HornRecognizer::new(&store).unwrap();
        assert_eq!(recognizer.renaming(&store, None.into_iter()).unwrap(), None);
    }

    #[test]
    fn removed_clauses_are_switched_off() {
        let clauses: &[&[Lit]] = &[&lits![1, 2, 3], &lits![-1, -2, -3]];
        let mut store = store(clauses);
        let recognizer = HornRecognizer::new(&store).unwrap();

        store.remove_clause(ClauseId::from_index(1)).unwrap();
        let renamed = recognizer.renaming(&store, None.into_iter()).unwrap().unwrap();
        assert!(is_horn_after_renaming(Some(&lits![1, 2, 3][..]), &renamed));
    }

    #[test]
    fn assigned_literals_leave_the_clauses() {
        let clauses: &[&[Lit]] = &[&lits![1, 2, 3], &lits![-1, -2, -3]];
        let mut store = store(clauses);
        let recognizer = HornRecognizer::new(&store).unwrap();

        // Assigning 1 satisfies the first clause and shortens the second.
        store.remove_clause(ClauseId::from_index(0)).unwrap();
        store.remove_lit(ClauseId::from_index(1), lit!(-1)).unwrap();
        store.remove_variable(lit!(1).var()).unwrap();

        let renamed = recognizer
            .renaming(&store, Some(lit!(1)).into_iter())
            .unwrap()
            .unwrap();
        assert!(is_horn_after_renaming(Some(&lits![-2, -3][..]), &renamed));
        assert!(renamed.iter().all(|&var| store.contains_variable(var)));
    }

    #[test]
    fn propagation_under_assignments() {
        let store = store(&[&lits![-1, -2, 3]]);
        let recognizer = HornRecognizer::new(&store).unwrap();

        // Removing 3 from the clause pins r_3, which shares the index of variable 3.
        let propagation = recognizer
            .propagate(&store, Some(lit!(-3)).into_iter())
            .unwrap();
        assert!(propagation.consistent);
        assert!(propagation.implied.contains(&lit!(3)));
        assert!(!propagation.implied.contains(&lit!(-1)));
    }

    #[test]
    fn unknown_live_clauses_are_reported() {
        let mut store = store(&[&lits![1, 2]]);
        let recognizer = HornRecognizer::new(&store).unwrap();
        store
            .add_clause(ClauseId::from_index(1), lits![-1, -2].iter().cloned())
            .unwrap();
        assert!(matches!(
            recognizer.renaming(&store, None.into_iter()),
            Err(GraphError::CorruptState(_))
        ));
    }
}
