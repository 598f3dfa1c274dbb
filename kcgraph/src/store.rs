//! Live variables and clauses.
use std::cell::OnceCell;
use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::lit::{Lit, Var};

/// Identifier of a clause.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ClauseId(u32);

impl ClauseId {
    #[inline]
    pub fn from_index(index: usize) -> ClauseId {
        debug_assert!(index <= u32::max_value() as usize);
        ClauseId(index as u32)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl fmt::Display for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Literal content of a clause.
pub type LitSet = FxHashSet<Lit>;

struct ClauseSlot {
    lits: LitSet,
    /// Sorted copy of `lits`, dropped whenever `lits` changes.
    sorted: OnceCell<Box<[Lit]>>,
}

impl ClauseSlot {
    fn new() -> ClauseSlot {
        ClauseSlot {
            lits: LitSet::default(),
            sorted: OnceCell::new(),
        }
    }
}

/// Bookkeeping of live variables and clauses.
///
/// Variables and clauses are slots in vectors indexed by their ids. Every clause is listed in the
/// length bucket matching the size of its literal set. The two are only changed together.
#[derive(Default)]
pub struct ClauseStore {
    variables: Vec<bool>,
    variable_count: usize,
    clauses: Vec<Option<ClauseSlot>>,
    clause_count: usize,
    /// Clauses by number of literals.
    by_len: Vec<FxHashSet<ClauseId>>,
}

impl ClauseStore {
    /// Number of variable slots, one more than the largest variable index ever added.
    pub fn var_slots(&self) -> usize {
        self.variables.len()
    }

    /// Number of clause slots, one more than the largest clause id ever added.
    pub fn clause_slots(&self) -> usize {
        self.clauses.len()
    }

    pub fn variable_count(&self) -> usize {
        self.variable_count
    }

    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    pub fn contains_variable(&self, var: Var) -> bool {
        self.variables.get(var.index()).cloned().unwrap_or(false)
    }

    pub fn contains_clause(&self, id: ClauseId) -> bool {
        matches!(self.clauses.get(id.index()), Some(Some(_)))
    }

    /// Live variables in increasing order.
    pub fn variables(&self) -> impl Iterator<Item = Var> + '_ {
        self.variables
            .iter()
            .enumerate()
            .filter(|&(_, &live)| live)
            .map(|(index, _)| Var::from_index(index))
    }

    /// Live clause ids in increasing order.
    pub fn clauses(&self) -> impl Iterator<Item = ClauseId> + '_ {
        self.clauses
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| ClauseId::from_index(index))
    }

    pub fn add_variable(&mut self, var: Var) -> Result<()> {
        if self.contains_variable(var) {
            return Err(GraphError::VariableAlreadyExists(var));
        }
        if self.variables.len() <= var.index() {
            self.variables.resize(var.index() + 1, false);
        }
        self.variables[var.index()] = true;
        self.variable_count += 1;
        Ok(())
    }

    pub fn remove_variable(&mut self, var: Var) -> Result<()> {
        if !self.contains_variable(var) {
            return Err(GraphError::VariableNotFound(var));
        }
        self.variables[var.index()] = false;
        self.variable_count -= 1;
        Ok(())
    }

    /// Adds a clause without literals.
    pub fn add_clause_id(&mut self, id: ClauseId) -> Result<()> {
        if self.contains_clause(id) {
            return Err(GraphError::ClauseAlreadyExists(id));
        }
        if self.clauses.len() <= id.index() {
            self.clauses.resize_with(id.index() + 1, || None);
        }
        self.clauses[id.index()] = Some(ClauseSlot::new());
        self.clause_count += 1;
        self.bucket_mut(0).insert(id);
        Ok(())
    }

    /// Adds a clause with the given literals. Repeated literals are stored once.
    pub fn add_clause(&mut self, id: ClauseId, lits: impl IntoIterator<Item = Lit>) -> Result<()> {
        self.add_clause_id(id)?;
        for lit in lits {
            self.insert_lit(id, lit)?;
        }
        Ok(())
    }

    /// Removes a clause, returning its literals.
    pub fn remove_clause(&mut self, id: ClauseId) -> Result<LitSet> {
        let len = self.clause_len(id)?;
        if !self.bucket_mut(len).remove(&id) {
            return Err(corrupt!("clause {} missing from length bucket {}", id, len));
        }
        let slot = self.clauses[id.index()]
            .take()
            .ok_or(GraphError::ClauseNotFound(id))?;
        self.clause_count -= 1;
        Ok(slot.lits)
    }

    /// Adds a literal to a clause. Returns false if it was present already.
    pub fn insert_lit(&mut self, id: ClauseId, lit: Lit) -> Result<bool> {
        let slot = self.slot_mut(id)?;
        if !slot.lits.insert(lit) {
            return Ok(false);
        }
        slot.sorted = OnceCell::new();
        let new_len = slot.lits.len();
        self.relocate(id, new_len - 1, new_len)?;
        Ok(true)
    }

    /// Removes a literal from a clause. Returns false if it was absent.
    pub fn remove_lit(&mut self, id: ClauseId, lit: Lit) -> Result<bool> {
        let slot = self.slot_mut(id)?;
        let old_len = slot.lits.len();
        if !slot.lits.remove(&lit) {
            return Ok(false);
        }
        slot.sorted = OnceCell::new();
        let new_len = old_len
            .checked_sub(1)
            .ok_or_else(|| corrupt!("length of clause {} dropped below zero", id))?;
        self.relocate(id, old_len, new_len)?;
        Ok(true)
    }

    /// Literals of a live clause.
    pub fn clause(&self, id: ClauseId) -> Result<&LitSet> {
        Ok(&self.slot(id)?.lits)
    }

    /// Literals of a live clause in increasing order.
    pub fn sorted_clause(&self, id: ClauseId) -> Result<&[Lit]> {
        let slot = self.slot(id)?;
        let sorted = slot.sorted.get_or_init(|| {
            let mut lits: Vec<Lit> = slot.lits.iter().cloned().collect();
            lits.sort_unstable();
            lits.into_boxed_slice()
        });
        Ok(&sorted[..])
    }

    pub fn clause_len(&self, id: ClauseId) -> Result<usize> {
        Ok(self.slot(id)?.lits.len())
    }

    /// Clauses of the given length, unordered.
    pub fn clauses_with_len(&self, len: usize) -> impl Iterator<Item = ClauseId> + '_ {
        self.by_len.get(len).into_iter().flat_map(|bucket| bucket.iter().cloned())
    }

    pub fn number_of_clauses_with_len(&self, len: usize) -> usize {
        self.by_len.get(len).map_or(0, |bucket| bucket.len())
    }

    /// Largest length bucket that may be non-empty.
    pub fn max_len(&self) -> usize {
        self.by_len.len().saturating_sub(1)
    }

    /// Clauses without literals, in increasing order.
    pub fn empty_clauses(&self) -> Vec<ClauseId> {
        self.sorted_bucket(0)
    }

    /// Clauses with exactly one literal, in increasing order.
    pub fn unit_clauses(&self) -> Vec<ClauseId> {
        self.sorted_bucket(1)
    }

    /// Check that each live clause sits in exactly the bucket of its length.
    pub fn check_len_index(&self) -> Result<()> {
        let mut indexed = 0;
        for (len, bucket) in self.by_len.iter().enumerate() {
            for &id in bucket {
                let actual = self.clause_len(id).map_err(|_| {
                    corrupt!("length bucket {} lists removed clause {}", len, id)
                })?;
                if actual != len {
                    return Err(corrupt!(
                        "clause {} has {} literals but sits in length bucket {}",
                        id,
                        actual,
                        len
                    ));
                }
            }
            indexed += bucket.len();
        }
        if indexed != self.clause_count {
            return Err(corrupt!(
                "length index lists {} clauses, {} are live",
                indexed,
                self.clause_count
            ));
        }
        Ok(())
    }

    fn sorted_bucket(&self, len: usize) -> Vec<ClauseId> {
        let mut ids: Vec<ClauseId> = self.clauses_with_len(len).collect();
        ids.sort_unstable();
        ids
    }

    fn slot(&self, id: ClauseId) -> Result<&ClauseSlot> {
        match self.clauses.get(id.index()) {
            Some(Some(slot)) => Ok(slot),
            _ => Err(GraphError::ClauseNotFound(id)),
        }
    }

    fn slot_mut(&mut self, id: ClauseId) -> Result<&mut ClauseSlot> {
        match self.clauses.get_mut(id.index()) {
            Some(Some(slot)) => Ok(slot),
            _ => Err(GraphError::ClauseNotFound(id)),
        }
    }

    fn bucket_mut(&mut self, len: usize) -> &mut FxHashSet<ClauseId> {
        if self.by_len.len() <= len {
            self.by_len.resize_with(len + 1, FxHashSet::default);
        }
        &mut self.by_len[len]
    }

    fn relocate(&mut self, id: ClauseId, from: usize, to: usize) -> Result<()> {
        if !self.bucket_mut(from).remove(&id) {
            return Err(corrupt!("clause {} missing from length bucket {}", id, from));
        }
        self.bucket_mut(to).insert(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use kcgraph_formula::{lit, lits, var};

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut store = ClauseStore::default();
        store.add_variable(var!(3)).unwrap();
        assert_eq!(
            store.add_variable(var!(3)),
            Err(GraphError::VariableAlreadyExists(var!(3)))
        );

        let id = ClauseId::from_index(2);
        store.add_clause(id, lits![1, -2].iter().cloned()).unwrap();
        assert_eq!(
            store.add_clause_id(id),
            Err(GraphError::ClauseAlreadyExists(id))
        );
        assert_eq!(store.clause_count(), 1);
    }

    #[test]
    fn length_index_follows_edits() {
        let mut store = ClauseStore::default();
        let a = ClauseId::from_index(0);
        let b = ClauseId::from_index(1);
        store.add_clause(a, lits![1, 2, 3].iter().cloned()).unwrap();
        store.add_clause(b, lits![-1].iter().cloned()).unwrap();

        assert_eq!(store.number_of_clauses_with_len(3), 1);
        assert_eq!(store.unit_clauses(), vec![b]);

        assert!(store.remove_lit(a, lit!(2)).unwrap());
        assert!(!store.remove_lit(a, lit!(2)).unwrap());
        assert_eq!(store.clause_len(a).unwrap(), 2);
        assert_eq!(store.number_of_clauses_with_len(3), 0);
        assert_eq!(store.number_of_clauses_with_len(2), 1);

        assert!(store.remove_lit(b, lit!(-1)).unwrap());
        assert_eq!(store.empty_clauses(), vec![b]);
        store.check_len_index().unwrap();
    }

    #[test]
    fn sorted_clause_is_refreshed() {
        let mut store = ClauseStore::default();
        let id = ClauseId::from_index(0);
        store.add_clause(id, lits![3, -1].iter().cloned()).unwrap();
        assert_eq!(store.sorted_clause(id).unwrap(), &lits![-1, 3][..]);

        store.insert_lit(id, lit!(2)).unwrap();
        assert_eq!(store.sorted_clause(id).unwrap(), &lits![-1, 2, 3][..]);

        store.remove_clause(id).unwrap();
        assert_eq!(
            store.sorted_clause(id),
            Err(GraphError::ClauseNotFound(id))
        );
    }
}
