//! CNF formulas.
use std::cmp::max;
use std::fmt;
use std::iter::Extend;
use std::ops::Range;

use crate::lit::{Lit, Var};

/// A formula in conjunctive normal form.
///
/// All literals live in one shared buffer, clauses are ranges into it.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct CnfFormula {
    var_count: usize,
    literals: Vec<Lit>,
    clause_ranges: Vec<Range<usize>>,
}

impl CnfFormula {
    pub fn new() -> CnfFormula {
        CnfFormula::default()
    }

    /// One more than the largest variable index used, or set via [`CnfFormula::set_var_count`].
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Raises the variable count. Smaller values are ignored.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_count = max(self.var_count, count)
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.clause_ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clause_ranges.is_empty()
    }

    /// Appends a clause.
    pub fn add_clause<L>(&mut self, literals: impl IntoIterator<Item = L>)
    where
        Vec<Lit>: Extend<L>,
    {
        let begin = self.literals.len();
        self.literals.extend(literals);
        let end = self.literals.len();

        if let Some(highest) = self.literals[begin..end].iter().map(|lit| lit.index()).max() {
            self.var_count = max(self.var_count, highest + 1);
        }

        self.clause_ranges.push(begin..end);
    }

    /// The `index`-th clause.
    pub fn clause(&self, index: usize) -> &[Lit] {
        &self.literals[self.clause_ranges[index].clone()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> {
        let literals = &self.literals;
        self.clause_ranges
            .iter()
            .map(move |range| &literals[range.clone()])
    }

    /// Variables `0..var_count`, used or not.
    pub fn vars(&self) -> impl Iterator<Item = Var> {
        (0..self.var_count).map(Var::from_index)
    }
}

impl<F, I, L> From<F> for CnfFormula
where
    F: IntoIterator<Item = I>,
    I: IntoIterator<Item = L>,
    Vec<Lit>: Extend<L>,
{
    fn from(formula: F) -> CnfFormula {
        let mut cnf_formula = CnfFormula::new();
        for clause in formula {
            cnf_formula.add_clause(clause);
        }
        cnf_formula
    }
}

impl fmt::Debug for CnfFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} vars ", self.var_count)?;
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;

    use proptest::{collection::SizeRange, prelude::*, *};

    use crate::lit::strategy::lit;

    /// Clauses over `0..vars` where no variable occurs twice in a clause.
    pub fn vec_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = Vec<Vec<Lit>>> {
        let clauses = clauses.into();
        let clause_len = clause_len.into();

        vars.prop_ind_flat_map(move |vars| {
            collection::vec(
                collection::vec(lit(0..vars), clause_len.clone()).prop_map(|mut clause| {
                    clause.sort_by_key(|lit| lit.var());
                    clause.dedup_by_key(|lit| lit.var());
                    clause
                }),
                clauses.clone(),
            )
        })
    }

    pub fn cnf_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = CnfFormula> {
        vec_formula(vars, clauses, clause_len).prop_map(CnfFormula::from)
    }
}

#[cfg(test)]
mod tests {
    use super::{strategy::*, *};

    use proptest::*;

    #[test]
    fn clauses_and_var_count() {
        let formula = cnf_formula![
            1, -2;
            -1, 2, 7;
            ;
            3;
        ];

        assert_eq!(formula.len(), 4);
        assert_eq!(formula.var_count(), 7);
        assert_eq!(formula.clause(1), &lits![-1, 2, 7][..]);
        assert!(formula.clause(2).is_empty());
    }

    proptest! {
        #[test]
        fn clauses_have_distinct_vars(input in cnf_formula(1..50usize, 0..100, 0..8)) {
            for clause in input.iter() {
                let mut vars: Vec<Var> = clause.iter().map(|lit| lit.var()).collect();
                vars.dedup();
                prop_assert_eq!(vars.len(), clause.len());
                for lit in clause {
                    prop_assert!(lit.index() < input.var_count());
                }
            }
        }
    }
}
