//! Merging of equivalent variables.
use partial_ref::{partial, PartialRef};
use rustc_hash::FxHashSet;

use crate::context::{BackupsP, GraphContext, OccurrencesP, StoreP};
use crate::error::{BackupChannel, GraphError, Result};
use crate::lit::{Lit, Var};

use super::edit::{
    attach_edge, check_undo, delete_clause, delete_variable, detach_edge, undo,
};

/// Replace every class member by its representative.
///
/// A member `m` stands for `var(m) == representative` when positive and for
/// `var(m) == !representative` when negative. Clauses that end up containing both polarities of
/// the representative are removed. The whole batch is undone by [`restore_merge`].
pub fn merge_variables(
    mut ctx: partial!(GraphContext, mut BackupsP, mut OccurrencesP, mut StoreP),
    mapping: &[(Var, Vec<Lit>)],
) -> Result<()> {
    if ctx.part(BackupsP).simplification_pending() {
        return Err(GraphError::SimplificationPending);
    }
    check_mapping(ctx.borrow(), mapping)?;

    let mut log = vec![];
    let mut tautologies = 0;

    for (representative, class) in mapping.iter() {
        for &member in class.iter() {
            let var = member.var();
            let edges: Vec<(Lit, _)> = [var.positive(), var.negative()]
                .iter()
                .flat_map(|&lit| {
                    ctx.part(OccurrencesP)
                        .live_sorted(lit)
                        .into_iter()
                        .map(move |clause| (lit, clause))
                })
                .collect();

            for (lit, clause) in edges {
                detach_edge(ctx.borrow(), lit, clause, &mut log)?;
                let target = representative.lit(lit.is_positive() == member.is_positive());
                let content = ctx.part(StoreP).clause(clause)?;
                if content.contains(&target) {
                    continue;
                } else if content.contains(&!target) {
                    delete_clause(ctx.borrow(), clause, &mut log)?;
                    tautologies += 1;
                } else {
                    attach_edge(ctx.borrow(), target, clause, &mut log)?;
                }
            }

            delete_variable(ctx.borrow(), var, &mut log)?;
        }
    }

    log::debug!(
        "merged {} variable classes, removed {} tautologies",
        mapping.len(),
        tautologies
    );

    ctx.part_mut(BackupsP).set_simplification(log)
}

/// Undo the pending merge batch.
pub fn restore_merge(
    mut ctx: partial!(GraphContext, mut BackupsP, mut OccurrencesP, mut StoreP),
) -> Result<()> {
    let (backups, mut ctx) = ctx.split_part_mut(BackupsP);
    let log = backups.simplification_log()?;
    backups.check_restore_order(BackupChannel::Simplification)?;
    check_undo(ctx.part(StoreP), log, BackupChannel::Simplification)?;
    undo(ctx.borrow(), log)?;
    backups.take_simplification()?;
    log::debug!("restored variable simplification");
    Ok(())
}

/// All variables must be live and unassigned, members must be distinct and no representative may
/// be merged away itself.
fn check_mapping(
    ctx: partial!(GraphContext, BackupsP, StoreP),
    mapping: &[(Var, Vec<Lit>)],
) -> Result<()> {
    let mut seen = FxHashSet::<Var>::default();
    let representatives: FxHashSet<Var> = mapping.iter().map(|&(var, _)| var).collect();

    let live = |var: Var| -> Result<()> {
        if ctx.part(BackupsP).is_assigned(var) {
            Err(GraphError::AlreadyAssigned(var))
        } else if !ctx.part(StoreP).contains_variable(var) {
            Err(GraphError::VariableNotFound(var))
        } else {
            Ok(())
        }
    };

    for (representative, class) in mapping.iter() {
        live(*representative)?;
        for member in class.iter() {
            let var = member.var();
            live(var)?;
            if representatives.contains(&var) || !seen.insert(var) {
                return Err(GraphError::InvalidMerge(var));
            }
        }
    }
    Ok(())
}
