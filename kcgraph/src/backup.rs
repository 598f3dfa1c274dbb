//! Undo records for graph mutations.
use rustc_hash::FxHashSet;

use crate::error::{BackupChannel, GraphError, Result};
use crate::lit::{Lit, Var};
use crate::occurrence::StaticChange;
use crate::store::ClauseId;

/// A primitive graph edit.
///
/// Every mutation that can be undone is decomposed into these steps. Undoing replays the steps of
/// a log in reverse order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// An edge was removed. The static polarity lists keep it.
    RemovedEdge(Lit, ClauseId),
    /// An edge was created.
    AddedEdge {
        lit: Lit,
        clause: ClauseId,
        change: StaticChange,
    },
    /// A variable node without edges was removed.
    RemovedVariable(Var),
    /// A clause node without edges was removed.
    RemovedClause(ClauseId),
}

pub type UndoLog = Vec<Step>;

/// Everything removed by one literal removal.
pub struct AssignmentFrame {
    pub lit: Lit,
    /// Variables that lost their last edge and were removed as well.
    pub isolated: Vec<Var>,
    pub log: UndoLog,
    /// Position of the removal among all backed up mutations.
    seq: u64,
}

/// The three backup channels.
///
/// Assignments form a stack that must be unwound in order. A variable simplification batch is
/// restored in one go and cannot be nested. Subsumption removals accumulate until restored
/// together.
///
/// Every backed up mutation gets a sequence number. A channel can only be restored when no other
/// channel holds a mutation made after the ones being restored.
#[derive(Default)]
pub struct Backups {
    next_seq: u64,
    assignment: Vec<AssignmentFrame>,
    /// Variables removed by the frames of `assignment`, including isolated ones.
    assigned: FxHashSet<Var>,
    simplification: Option<(u64, UndoLog)>,
    subsumption: UndoLog,
    subsumed: Vec<ClauseId>,
    /// Sequence numbers of the first and the last pending subsumption removal.
    subsumption_seq: Option<(u64, u64)>,
}

impl Backups {
    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub fn is_assigned(&self, var: Var) -> bool {
        self.assigned.contains(&var)
    }

    /// Number of literal removals not yet restored.
    pub fn assignment_depth(&self) -> usize {
        self.assignment.len()
    }

    /// Removed literals, oldest first.
    pub fn assigned_lits(&self) -> impl Iterator<Item = Lit> + '_ {
        self.assignment.iter().map(|frame| frame.lit)
    }

    pub fn push_assignment(&mut self, lit: Lit, isolated: Vec<Var>, log: UndoLog) {
        let seq = self.next_seq();
        self.assigned.insert(lit.var());
        self.assigned.extend(isolated.iter().cloned());
        self.assignment.push(AssignmentFrame {
            lit,
            isolated,
            log,
            seq,
        });
    }

    /// The frame of `lit`, which must be the most recently removed literal.
    pub fn last_assignment(&self, lit: Lit) -> Result<&AssignmentFrame> {
        match self.assignment.last() {
            None => Err(GraphError::NothingToRestore(BackupChannel::Assignment)),
            Some(frame) if frame.lit != lit => Err(GraphError::NotLastRemoved {
                requested: lit,
                last: frame.lit,
            }),
            Some(frame) => Ok(frame),
        }
    }

    /// Drop the frame of `lit` after it was undone.
    pub fn pop_assignment(&mut self, lit: Lit) -> Result<AssignmentFrame> {
        self.last_assignment(lit)?;
        let frame = self
            .assignment
            .pop()
            .ok_or(GraphError::NothingToRestore(BackupChannel::Assignment))?;
        self.assigned.remove(&frame.lit.var());
        for var in frame.isolated.iter() {
            self.assigned.remove(var);
        }
        Ok(frame)
    }

    pub fn simplification_pending(&self) -> bool {
        self.simplification.is_some()
    }

    pub fn set_simplification(&mut self, log: UndoLog) -> Result<()> {
        if self.simplification.is_some() {
            return Err(GraphError::SimplificationPending);
        }
        let seq = self.next_seq();
        self.simplification = Some((seq, log));
        Ok(())
    }

    /// Log of the pending simplification batch.
    pub fn simplification_log(&self) -> Result<&[Step]> {
        self.simplification
            .as_ref()
            .map(|(_, log)| &log[..])
            .ok_or(GraphError::NothingToRestore(BackupChannel::Simplification))
    }

    pub fn take_simplification(&mut self) -> Result<UndoLog> {
        self.simplification
            .take()
            .map(|(_, log)| log)
            .ok_or(GraphError::NothingToRestore(BackupChannel::Simplification))
    }

    /// Log collecting subsumption removals.
    pub fn subsumption_log(&mut self) -> &mut UndoLog {
        &mut self.subsumption
    }

    pub fn note_subsumed(&mut self, clause: ClauseId) {
        let seq = self.next_seq();
        self.subsumption_seq = Some(match self.subsumption_seq {
            Some((first, _)) => (first, seq),
            None => (seq, seq),
        });
        self.subsumed.push(clause);
    }

    /// Clauses removed through the subsumption channel, in removal order.
    pub fn subsumed(&self) -> &[ClauseId] {
        &self.subsumed
    }

    /// Log of the pending subsumption removals.
    pub fn pending_subsumption(&self) -> Result<&[Step]> {
        if self.subsumed.is_empty() {
            return Err(GraphError::NothingToRestore(BackupChannel::Subsumption));
        }
        Ok(&self.subsumption)
    }

    /// Take the subsumption log and the removed clause ids.
    pub fn take_subsumption(&mut self) -> Result<(UndoLog, Vec<ClauseId>)> {
        if self.subsumed.is_empty() {
            return Err(GraphError::NothingToRestore(BackupChannel::Subsumption));
        }
        self.subsumption_seq = None;
        Ok((
            std::mem::replace(&mut self.subsumption, vec![]),
            std::mem::replace(&mut self.subsumed, vec![]),
        ))
    }

    /// Check that restoring `channel` undoes the most recent backed up mutations.
    ///
    /// The assignment channel restores its top frame, the other channels everything they hold.
    pub fn check_restore_order(&self, channel: BackupChannel) -> Result<()> {
        let assignment = self.assignment.last().map(|frame| frame.seq);
        let simplification = self.simplification.as_ref().map(|&(seq, _)| seq);

        let first = match channel {
            BackupChannel::Assignment => assignment,
            BackupChannel::Simplification => simplification,
            BackupChannel::Subsumption => self.subsumption_seq.map(|(first, _)| first),
        }
        .ok_or(GraphError::NothingToRestore(channel))?;

        let latest = [
            (BackupChannel::Assignment, assignment),
            (BackupChannel::Simplification, simplification),
            (
                BackupChannel::Subsumption,
                self.subsumption_seq.map(|(_, last)| last),
            ),
        ];
        for &(pending, seq) in latest.iter() {
            if pending != channel && seq.map_or(false, |seq| seq > first) {
                return Err(GraphError::RestoreOrder { channel, pending });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use kcgraph_formula::lit;

    #[test]
    fn restores_follow_the_mutation_order() {
        let mut backups = Backups::default();
        backups.push_assignment(lit!(1), vec![], vec![]);
        backups.note_subsumed(ClauseId::from_index(0));
        backups.set_simplification(vec![]).unwrap();

        assert_eq!(
            backups.check_restore_order(BackupChannel::Subsumption),
            Err(GraphError::RestoreOrder {
                channel: BackupChannel::Subsumption,
                pending: BackupChannel::Simplification,
            })
        );
        backups.check_restore_order(BackupChannel::Simplification).unwrap();
        backups.take_simplification().unwrap();

        assert_eq!(
            backups.check_restore_order(BackupChannel::Assignment),
            Err(GraphError::RestoreOrder {
                channel: BackupChannel::Assignment,
                pending: BackupChannel::Subsumption,
            })
        );
        backups.check_restore_order(BackupChannel::Subsumption).unwrap();
        backups.take_subsumption().unwrap();

        backups.check_restore_order(BackupChannel::Assignment).unwrap();
        backups.pop_assignment(lit!(1)).unwrap();
        assert_eq!(
            backups.check_restore_order(BackupChannel::Assignment),
            Err(GraphError::NothingToRestore(BackupChannel::Assignment))
        );
    }

    #[test]
    fn subsumption_spans_its_first_removal() {
        let mut backups = Backups::default();
        backups.note_subsumed(ClauseId::from_index(0));
        backups.push_assignment(lit!(2), vec![], vec![]);
        backups.note_subsumed(ClauseId::from_index(1));

        // Restoring both removals would undo the first one from under the assignment.
        assert_eq!(
            backups.check_restore_order(BackupChannel::Subsumption),
            Err(GraphError::RestoreOrder {
                channel: BackupChannel::Subsumption,
                pending: BackupChannel::Assignment,
            })
        );
        assert_eq!(
            backups.check_restore_order(BackupChannel::Assignment),
            Err(GraphError::RestoreOrder {
                channel: BackupChannel::Assignment,
                pending: BackupChannel::Subsumption,
            })
        );
    }
}
