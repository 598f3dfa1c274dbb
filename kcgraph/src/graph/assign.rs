//! Literal removal and its undo.
use partial_ref::{partial, PartialRef};

use crate::context::{BackupsP, GraphContext, OccurrencesP, StoreP};
use crate::error::{BackupChannel, GraphError, Result};
use crate::lit::{Lit, Var};

use super::edit::{check_undo, delete_clause, delete_variable, detach_edge, remove_isolated, undo};
use super::subsume::{redundant_clauses, RedundancyPolicy};

/// Make `lit` true.
///
/// Clauses containing `lit` are satisfied and removed, `!lit` is removed from the remaining
/// clauses and the variable node goes away. Variables left without edges are removed too and
/// returned. With a policy, clauses made redundant by the shortened clauses are removed after
/// that.
pub fn remove_literal(
    mut ctx: partial!(GraphContext, mut BackupsP, mut OccurrencesP, mut StoreP),
    lit: Lit,
    policy: Option<RedundancyPolicy>,
) -> Result<Vec<Var>> {
    let var = lit.var();
    if ctx.part(BackupsP).is_assigned(var) {
        return Err(GraphError::AlreadyAssigned(var));
    }
    if !ctx.part(StoreP).contains_variable(var) {
        return Err(GraphError::VariableNotFound(var));
    }

    let mut log = vec![];
    let mut touched = vec![];

    let satisfied = ctx.part(OccurrencesP).live_sorted(lit);
    for &clause in satisfied.iter() {
        touched.extend(delete_clause(ctx.borrow(), clause, &mut log)?);
    }

    let shortened = ctx.part(OccurrencesP).live_sorted(!lit);
    for &clause in shortened.iter() {
        detach_edge(ctx.borrow(), !lit, clause, &mut log)?;
    }

    delete_variable(ctx.borrow(), var, &mut log)?;
    let mut isolated = remove_isolated(ctx.borrow(), touched, &mut log)?;

    if let Some(policy) = policy {
        let redundant = redundant_clauses(ctx.borrow(), &shortened, policy);
        let mut touched = vec![];
        for &clause in redundant.iter() {
            touched.extend(delete_clause(ctx.borrow(), clause, &mut log)?);
        }
        if !redundant.is_empty() {
            log::trace!("literal {} made clauses {:?} redundant", lit, redundant);
        }
        isolated.extend(remove_isolated(ctx.borrow(), touched, &mut log)?);
        isolated.sort_unstable();
    }

    log::debug!(
        "removed literal {}: {} satisfied, {} shortened, {} isolated",
        lit,
        satisfied.len(),
        shortened.len(),
        isolated.len()
    );

    ctx.part_mut(BackupsP).push_assignment(lit, isolated.clone(), log);

    Ok(isolated)
}

/// Undo the most recent [`remove_literal`], which must have removed `lit`.
///
/// Fails without changing the graph if a later mutation of another channel is still pending.
pub fn restore_literal(
    mut ctx: partial!(GraphContext, mut BackupsP, mut OccurrencesP, mut StoreP),
    lit: Lit,
) -> Result<()> {
    let (backups, mut ctx) = ctx.split_part_mut(BackupsP);
    let frame = backups.last_assignment(lit)?;
    backups.check_restore_order(BackupChannel::Assignment)?;
    check_undo(ctx.part(StoreP), &frame.log, BackupChannel::Assignment)?;
    undo(ctx.borrow(), &frame.log)?;
    backups.pop_assignment(lit)?;
    log::debug!("restored literal {}", lit);
    Ok(())
}
