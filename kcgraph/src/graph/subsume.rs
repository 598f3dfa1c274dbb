//! Detection of redundant clauses.
use std::cmp::Ordering;

use partial_ref::{partial, PartialRef};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::context::{BackupsP, GraphContext, OccurrencesP, StoreP};
use crate::error::{BackupChannel, Result};
use crate::lit::{Lit, Var};
use crate::store::{ClauseId, ClauseStore};

use super::edit::{check_undo, delete_clause, undo};

/// How clauses made redundant by a literal removal are detected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedundancyPolicy {
    /// A clause is redundant if its literals are a superset of another clause's.
    Subsumption,
    /// A clause is redundant if its variables are a superset of another clause's, ignoring signs.
    VariableSubsumption,
}

/// Test whether a sorted slice is a subset of another sorted slice.
pub fn is_subset<T: Ord>(mut subset: &[T], mut superset: &[T]) -> bool {
    while let Some((sub_min, sub_rest)) = subset.split_first() {
        if subset.len() > superset.len() {
            return false;
        }
        match superset.split_first() {
            Some((super_min, super_rest)) => match sub_min.cmp(super_min) {
                // sub_min is smaller than everything left in superset
                Ordering::Less => return false,
                Ordering::Greater => superset = super_rest,
                Ordering::Equal => {
                    superset = super_rest;
                    subset = sub_rest;
                }
            },
            None => return false,
        }
    }
    true
}

/// Sorted items compared by a policy.
enum Items {
    Lits(Vec<Lit>),
    Vars(Vec<Var>),
}

impl Items {
    fn of(store: &ClauseStore, clause: ClauseId, policy: RedundancyPolicy) -> Items {
        let lits = store
            .sorted_clause(clause)
            .map(|lits| lits.to_vec())
            .unwrap_or_default();
        match policy {
            RedundancyPolicy::Subsumption => Items::Lits(lits),
            // Sorted literals are sorted by variable and a variable occurs once per clause.
            RedundancyPolicy::VariableSubsumption => {
                Items::Vars(lits.iter().map(|lit| lit.var()).collect())
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Items::Lits(lits) => lits.len(),
            Items::Vars(vars) => vars.len(),
        }
    }

    fn is_subset_of(&self, other: &Items) -> bool {
        match (self, other) {
            (Items::Lits(a), Items::Lits(b)) => is_subset(a, b),
            (Items::Vars(a), Items::Vars(b)) => is_subset(a, b),
            _ => false,
        }
    }
}

/// Live clauses that are redundant with respect to one of the `candidates`.
///
/// Each candidate is compared against every live clause sharing its least frequent literal (or
/// variable). When two clauses have equal sets the one with the larger id is redundant. Empty
/// candidates are skipped. Returns sorted clause ids.
pub fn redundant_clauses(
    ctx: partial!(GraphContext, OccurrencesP, StoreP),
    candidates: &[ClauseId],
    policy: RedundancyPolicy,
) -> Vec<ClauseId> {
    let store = ctx.part(StoreP);
    let occurrences = ctx.part(OccurrencesP);

    let mut redundant = FxHashSet::<ClauseId>::default();

    for &candidate in candidates.iter() {
        let lits = match store.sorted_clause(candidate) {
            Ok(lits) => lits,
            Err(_) => continue,
        };

        let others: Vec<ClauseId> = match policy {
            RedundancyPolicy::Subsumption => {
                let pivot = lits
                    .iter()
                    .cloned()
                    .min_by_key(|&lit| (occurrences.live(lit).len(), lit));
                match pivot {
                    Some(pivot) => occurrences.live(pivot).iter().cloned().collect(),
                    None => continue,
                }
            }
            RedundancyPolicy::VariableSubsumption => {
                let pivot = lits
                    .iter()
                    .map(|lit| lit.var())
                    .min_by_key(|&var| (occurrences.degree(var), var));
                match pivot {
                    Some(pivot) => occurrences.clauses_of(pivot).collect(),
                    None => continue,
                }
            }
        };

        let items = Items::of(store, candidate, policy);

        for other in others {
            if other == candidate || redundant.contains(&other) {
                continue;
            }
            let other_items = Items::of(store, other, policy);
            if other_items.len() < items.len() || !items.is_subset_of(&other_items) {
                continue;
            }
            if other_items.len() == items.len() && other < candidate {
                redundant.insert(candidate);
                break;
            }
            redundant.insert(other);
        }
    }

    let mut redundant: Vec<ClauseId> = redundant.into_iter().collect();
    redundant.sort_unstable();
    redundant
}

/// Remove a clause, recording it in the subsumption channel.
///
/// Variables left without edges stay in the graph.
pub fn remove_subsumed(
    mut ctx: partial!(GraphContext, mut BackupsP, mut OccurrencesP, mut StoreP),
    clause: ClauseId,
) -> Result<()> {
    let (backups, mut ctx) = ctx.split_part_mut(BackupsP);
    delete_clause(ctx.borrow(), clause, backups.subsumption_log())?;
    backups.note_subsumed(clause);
    log::trace!("removed subsumed clause {}", clause);
    Ok(())
}

/// Restore every clause removed through the subsumption channel.
pub fn restore_subsumed(
    mut ctx: partial!(GraphContext, mut BackupsP, mut OccurrencesP, mut StoreP),
) -> Result<()> {
    let (backups, mut ctx) = ctx.split_part_mut(BackupsP);
    let log = backups.pending_subsumption()?;
    backups.check_restore_order(BackupChannel::Subsumption)?;
    check_undo(ctx.part(StoreP), log, BackupChannel::Subsumption)?;
    undo(ctx.borrow(), log)?;
    let (_, subsumed) = backups.take_subsumption()?;
    log::debug!("restored {} subsumed clauses", subsumed.len());
    Ok(())
}
