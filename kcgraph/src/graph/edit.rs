//! Primitive edits that record how to undo them.
use partial_ref::{partial, PartialRef};
use rustc_hash::FxHashMap;

use crate::backup::{Step, UndoLog};
use crate::context::{GraphContext, OccurrencesP, StoreP};
use crate::error::{BackupChannel, GraphError, Result};
use crate::lit::{Lit, Var};
use crate::store::{ClauseId, ClauseStore};

/// Remove the edge between `lit` and `clause`.
pub fn detach_edge(
    mut ctx: partial!(GraphContext, mut OccurrencesP, mut StoreP),
    lit: Lit,
    clause: ClauseId,
    log: &mut UndoLog,
) -> Result<()> {
    if !ctx.part_mut(StoreP).remove_lit(clause, lit)? {
        return Err(GraphError::EdgeNotFound(lit, clause));
    }
    if !ctx.part_mut(OccurrencesP).remove_live(lit, clause) {
        return Err(corrupt!(
            "edge {} of clause {} missing from the occurrence lists",
            lit,
            clause
        ));
    }
    log.push(Step::RemovedEdge(lit, clause));
    Ok(())
}

/// Create an edge between `lit` and `clause`.
///
/// Both nodes must exist and must not be connected yet.
pub fn attach_edge(
    mut ctx: partial!(GraphContext, mut OccurrencesP, mut StoreP),
    lit: Lit,
    clause: ClauseId,
    log: &mut UndoLog,
) -> Result<()> {
    if !ctx.part(StoreP).contains_variable(lit.var()) {
        return Err(GraphError::VariableNotFound(lit.var()));
    }
    if !ctx.part_mut(StoreP).insert_lit(clause, lit)? {
        return Err(corrupt!("edge {} of clause {} exists already", lit, clause));
    }
    let occurrences = ctx.part_mut(OccurrencesP);
    occurrences.insert_live(lit, clause);
    let change = occurrences.record_static(lit, clause);
    log.push(Step::AddedEdge {
        lit,
        clause,
        change,
    });
    Ok(())
}

/// Remove a clause node with all its edges. Returns the variables it was connected to.
pub fn delete_clause(
    mut ctx: partial!(GraphContext, mut OccurrencesP, mut StoreP),
    clause: ClauseId,
    log: &mut UndoLog,
) -> Result<Vec<Var>> {
    let lits = ctx.part(StoreP).sorted_clause(clause)?.to_vec();
    for &lit in lits.iter() {
        detach_edge(ctx.borrow(), lit, clause, log)?;
    }
    ctx.part_mut(StoreP).remove_clause(clause)?;
    log.push(Step::RemovedClause(clause));
    Ok(lits.iter().map(|lit| lit.var()).collect())
}

/// Remove a variable node that has no edges left.
pub fn delete_variable(
    mut ctx: partial!(GraphContext, mut StoreP, OccurrencesP),
    var: Var,
    log: &mut UndoLog,
) -> Result<()> {
    let degree = ctx.part(OccurrencesP).degree(var);
    if degree != 0 {
        return Err(corrupt!(
            "variable {} still has {} edges when being removed",
            var,
            degree
        ));
    }
    ctx.part_mut(StoreP).remove_variable(var)?;
    log.push(Step::RemovedVariable(var));
    Ok(())
}

/// Remove the candidates that are live and have no edges. Returns the removed variables, sorted.
pub fn remove_isolated(
    mut ctx: partial!(GraphContext, mut StoreP, OccurrencesP),
    mut candidates: Vec<Var>,
    log: &mut UndoLog,
) -> Result<Vec<Var>> {
    candidates.sort_unstable();
    candidates.dedup();

    let mut isolated = vec![];
    for var in candidates {
        if ctx.part(StoreP).contains_variable(var) && ctx.part(OccurrencesP).degree(var) == 0 {
            delete_variable(ctx.borrow(), var, log)?;
            log::trace!("removed isolated variable {}", var);
            isolated.push(var);
        }
    }
    Ok(isolated)
}

/// Node and edge states of a store after replaying part of a log, without touching the store.
struct Replay<'a> {
    store: &'a ClauseStore,
    variables: FxHashMap<Var, bool>,
    clauses: FxHashMap<ClauseId, bool>,
    edges: FxHashMap<(Lit, ClauseId), bool>,
}

impl<'a> Replay<'a> {
    fn variable(&self, var: Var) -> bool {
        self.variables
            .get(&var)
            .cloned()
            .unwrap_or_else(|| self.store.contains_variable(var))
    }

    fn clause(&self, clause: ClauseId) -> bool {
        self.clauses
            .get(&clause)
            .cloned()
            .unwrap_or_else(|| self.store.contains_clause(clause))
    }

    fn edge(&self, lit: Lit, clause: ClauseId) -> bool {
        self.edges.get(&(lit, clause)).cloned().unwrap_or_else(|| {
            self.store
                .clause(clause)
                .map_or(false, |lits| lits.contains(&lit))
        })
    }
}

/// Check that [`undo`] can replay `log` on the current store.
///
/// Fails with [`GraphError::RestoreConflict`] when the graph was changed in a way the log does
/// not expect. Nothing is modified.
pub fn check_undo(store: &ClauseStore, log: &[Step], channel: BackupChannel) -> Result<()> {
    let mut replay = Replay {
        store,
        variables: FxHashMap::default(),
        clauses: FxHashMap::default(),
        edges: FxHashMap::default(),
    };
    let conflict = |reason: String| GraphError::RestoreConflict(channel, reason);

    for step in log.iter().rev() {
        match *step {
            Step::RemovedEdge(lit, clause) => {
                if !replay.clause(clause) {
                    return Err(conflict(format!("clause {} is missing", clause)));
                }
                if !replay.variable(lit.var()) {
                    return Err(conflict(format!(
                        "variable {} of clause {} is missing",
                        lit.var(),
                        clause
                    )));
                }
                if replay.edge(lit, clause) || replay.edge(!lit, clause) {
                    return Err(conflict(format!(
                        "variable {} is connected to clause {} already",
                        lit.var(),
                        clause
                    )));
                }
                replay.edges.insert((lit, clause), true);
            }
            Step::AddedEdge { lit, clause, .. } => {
                if !replay.edge(lit, clause) {
                    return Err(conflict(format!("edge {} of clause {} is missing", lit, clause)));
                }
                replay.edges.insert((lit, clause), false);
            }
            Step::RemovedVariable(var) => {
                if replay.variable(var) {
                    return Err(conflict(format!("variable {} exists already", var)));
                }
                replay.variables.insert(var, true);
            }
            Step::RemovedClause(clause) => {
                if replay.clause(clause) {
                    return Err(conflict(format!("clause {} exists already", clause)));
                }
                replay.clauses.insert(clause, true);
            }
        }
    }
    Ok(())
}

/// Revert the steps of a log, most recent first.
///
/// Callers run [`check_undo`] first, an error here means the graph state is corrupt.
pub fn undo(
    mut ctx: partial!(GraphContext, mut OccurrencesP, mut StoreP),
    log: &[Step],
) -> Result<()> {
    for &step in log.iter().rev() {
        match step {
            Step::RemovedEdge(lit, clause) => {
                if !ctx.part_mut(StoreP).insert_lit(clause, lit)? {
                    return Err(corrupt!("restored edge {} of clause {} exists", lit, clause));
                }
                ctx.part_mut(OccurrencesP).insert_live(lit, clause);
            }
            Step::AddedEdge {
                lit,
                clause,
                change,
            } => {
                if !ctx.part_mut(StoreP).remove_lit(clause, lit)? {
                    return Err(corrupt!("added edge {} of clause {} is gone", lit, clause));
                }
                let occurrences = ctx.part_mut(OccurrencesP);
                occurrences.remove_live(lit, clause);
                occurrences.revert_static(lit, clause, change);
            }
            Step::RemovedVariable(var) => ctx.part_mut(StoreP).add_variable(var)?,
            Step::RemovedClause(clause) => ctx.part_mut(StoreP).add_clause_id(clause)?,
        }
    }
    Ok(())
}
