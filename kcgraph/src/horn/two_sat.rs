//! Guarded binary clauses and their propagation.
use crate::lit::{Lit, Var};

/// Result of propagating a set of assumptions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Propagation {
    /// False if the assumptions contradict each other or the clauses.
    pub consistent: bool,
    /// Literals made true, assumptions included, in assignment order.
    pub implied: Vec<Lit>,
}

/// Propagation over a fixed clause set under assumptions.
pub trait PropagationOracle {
    /// Unit propagate the assumptions.
    fn propagate(&self, assumptions: &[Lit]) -> Propagation;

    /// Extend the assumptions to a total assignment satisfying the clauses.
    ///
    /// Returns the true literals of the model, `None` if there is none.
    fn find_model(&self, assumptions: &[Lit]) -> Option<Vec<Lit>>;
}

/// Binary clauses that can be switched off by a guard variable.
///
/// A clause guarded by `g` is active only while `g` is assigned false. Guard variables must not
/// occur in any clause. Guards that are not assumed stay unassigned, which switches their clauses
/// off.
#[derive(Default)]
pub struct GuardedBinaryClauses {
    /// Implications of each literal, indexed by literal code.
    by_lit: Vec<Vec<(Lit, Option<Var>)>>,
    is_guard: Vec<bool>,
    count: usize,
}

impl GuardedBinaryClauses {
    /// Update structures for a new variable count.
    pub fn set_var_count(&mut self, count: usize) {
        self.by_lit.resize(count * 2, vec![]);
        self.is_guard.resize(count, false);
    }

    pub fn var_count(&self) -> usize {
        self.is_guard.len()
    }

    /// Number of binary clauses.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Mark a variable as guard.
    pub fn add_guard(&mut self, guard: Var) {
        self.is_guard[guard.index()] = true;
    }

    /// Add the clause `lits[0] ∨ lits[1]`, active when `guard` is false.
    pub fn add_clause(&mut self, lits: [Lit; 2], guard: Option<Var>) {
        debug_assert!(lits.iter().all(|lit| !self.is_guard[lit.index()]));
        for i in 0..2 {
            self.by_lit[(!lits[i]).code()].push((lits[i ^ 1], guard));
        }
        self.count += 1;
    }

    /// Implications of a given literal together with their guards.
    pub fn implied(&self, lit: Lit) -> &[(Lit, Option<Var>)] {
        &self.by_lit[lit.code()]
    }

    /// Propagate everything enqueued on the trail. Returns false on a conflict.
    fn propagate_trail(&self, search: &mut Search) -> bool {
        while let Some(lit) = search.queue_head() {
            search.pop_queue();
            for &(implied, guard) in self.implied(lit) {
                if let Some(guard) = guard {
                    if search.lit_value(guard.positive()) != Some(false) {
                        continue;
                    }
                }
                match search.lit_value(implied) {
                    Some(true) => (),
                    Some(false) => return false,
                    None => search.enqueue(implied),
                }
            }
        }
        true
    }

    /// Enqueue and propagate the assumptions.
    fn assume(&self, search: &mut Search, assumptions: &[Lit]) -> bool {
        for &lit in assumptions.iter() {
            if lit.index() >= self.var_count() {
                continue;
            }
            match search.lit_value(lit) {
                Some(true) => (),
                Some(false) => return false,
                None => search.enqueue(lit),
            }
        }
        self.propagate_trail(search)
    }
}

impl PropagationOracle for GuardedBinaryClauses {
    fn propagate(&self, assumptions: &[Lit]) -> Propagation {
        let mut search = Search::new(self.var_count());
        let consistent = self.assume(&mut search, assumptions);
        Propagation {
            consistent,
            implied: search.trail,
        }
    }

    /// Decides the remaining variables negatively in index order. A decision that leads to a
    /// conflict is flipped, a conflict after flipping means there is no model. This is complete
    /// for binary clauses, as propagation without conflict leaves every active clause satisfied or
    /// untouched.
    fn find_model(&self, assumptions: &[Lit]) -> Option<Vec<Lit>> {
        let mut search = Search::new(self.var_count());
        if !self.assume(&mut search, assumptions) {
            return None;
        }

        for index in 0..self.var_count() {
            if self.is_guard[index] || search.assignment[index].is_some() {
                continue;
            }
            let decision = Var::from_index(index).negative();

            let level = search.trail.len();
            search.enqueue(decision);
            if self.propagate_trail(&mut search) {
                continue;
            }

            search.backtrack(level);
            search.enqueue(!decision);
            if !self.propagate_trail(&mut search) {
                return None;
            }
        }

        Some(search.trail)
    }
}

/// Partial assignment with its trail.
struct Search {
    assignment: Vec<Option<bool>>,
    trail: Vec<Lit>,
    queue_head_pos: usize,
}

impl Search {
    fn new(var_count: usize) -> Search {
        Search {
            assignment: vec![None; var_count],
            trail: vec![],
            queue_head_pos: 0,
        }
    }

    fn lit_value(&self, lit: Lit) -> Option<bool> {
        self.assignment[lit.index()].map(|b| b ^ lit.is_negative())
    }

    fn enqueue(&mut self, lit: Lit) {
        debug_assert!(self.lit_value(lit).is_none());
        self.assignment[lit.index()] = Some(lit.is_positive());
        self.trail.push(lit);
    }

    fn queue_head(&self) -> Option<Lit> {
        self.trail.get(self.queue_head_pos).cloned()
    }

    fn pop_queue(&mut self) {
        self.queue_head_pos += 1;
    }

    /// Unassign everything after the first `len` trail entries.
    fn backtrack(&mut self, len: usize) {
        for &lit in self.trail[len..].iter() {
            self.assignment[lit.index()] = None;
        }
        self.trail.truncate(len);
        self.queue_head_pos = len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use kcgraph_formula::{lit, var};

    fn clauses(var_count: usize, binary: &[([Lit; 2], Option<Var>)]) -> GuardedBinaryClauses {
        let mut clauses = GuardedBinaryClauses::default();
        clauses.set_var_count(var_count);
        for &(lits, guard) in binary.iter() {
            if let Some(guard) = guard {
                clauses.add_guard(guard);
            }
            clauses.add_clause(lits, guard);
        }
        clauses
    }

    fn satisfies(model: &[Lit], binary: &[([Lit; 2], Option<Var>)], assumptions: &[Lit]) -> bool {
        let active = |guard: Option<Var>| guard.map_or(true, |g| model.contains(&g.negative()));
        assumptions.iter().all(|lit| model.contains(lit))
            && binary
                .iter()
                .filter(|(_, guard)| active(*guard))
                .all(|(lits, _)| lits.iter().any(|lit| model.contains(lit)))
    }

    #[test]
    fn propagation_follows_implications() {
        let binary = [([lit!(-1), lit!(2)], None), ([lit!(-2), lit!(3)], None)];
        let clauses = clauses(3, &binary);

        let result = clauses.propagate(&[lit!(1)]);
        assert!(result.consistent);
        assert_eq!(result.implied, vec![lit!(1), lit!(2), lit!(3)]);

        let result = clauses.propagate(&[lit!(1), lit!(-3)]);
        assert!(!result.consistent);
    }

    #[test]
    fn guards_switch_clauses_off() {
        let binary = [([lit!(-1), lit!(2)], Some(var!(3)))];
        let clauses = clauses(3, &binary);

        assert_eq!(clauses.propagate(&[lit!(1)]).implied, vec![lit!(1)]);
        assert_eq!(
            clauses.propagate(&[lit!(-3), lit!(1)]).implied,
            vec![lit!(-3), lit!(1), lit!(2)]
        );
        assert!(!clauses.propagate(&[lit!(-3), lit!(1), lit!(-2)]).consistent);
        assert!(clauses.propagate(&[lit!(3), lit!(1), lit!(-2)]).consistent);
    }

    #[test]
    fn model_search_flips_failed_decisions() {
        // x1 must be true: (x1 ∨ x2) ∧ (x1 ∨ ¬x2)
        let binary = [([lit!(1), lit!(2)], None), ([lit!(1), lit!(-2)], None)];
        let clauses = clauses(2, &binary);

        let model = clauses.find_model(&[]).unwrap();
        assert!(model.contains(&lit!(1)));
        assert!(satisfies(&model, &binary, &[]));
        assert_eq!(model.len(), 2);
    }

    #[test]
    fn unsatisfiable_clauses_have_no_model() {
        let binary = [
            ([lit!(1), lit!(2)], None),
            ([lit!(1), lit!(-2)], None),
            ([lit!(-1), lit!(2)], None),
            ([lit!(-1), lit!(-2)], None),
        ];
        let clauses = clauses(2, &binary);
        assert_eq!(clauses.find_model(&[]), None);
        assert_eq!(clauses.find_model(&[lit!(1)]), None);
    }

    #[test]
    fn contradicting_assumptions_have_no_model() {
        let clauses = clauses(1, &[]);
        assert_eq!(clauses.find_model(&[lit!(1), lit!(-1)]), None);
        assert_eq!(clauses.find_model(&[lit!(1)]), Some(vec![lit!(1)]));
    }
}
