//! Errors reported by the incidence graph.
use std::fmt;

use thiserror::Error;

use crate::lit::{Lit, Var};
use crate::store::ClauseId;

/// The independent undo channels of an incidence graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackupChannel {
    Assignment,
    Simplification,
    Subsumption,
}

impl fmt::Display for BackupChannel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            BackupChannel::Assignment => "assignment",
            BackupChannel::Simplification => "variable simplification",
            BackupChannel::Subsumption => "subsumption",
        };
        f.write_str(name)
    }
}

/// Precondition violations and internal inconsistencies.
///
/// All variants except [`GraphError::CorruptState`] are usage errors: the graph is left as it was
/// before the failing call. `CorruptState` means an internal invariant broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("variable {0} is not in the graph")]
    VariableNotFound(Var),
    #[error("clause {0} is not in the graph")]
    ClauseNotFound(ClauseId),
    #[error("variable {0} already exists")]
    VariableAlreadyExists(Var),
    #[error("clause {0} already exists")]
    ClauseAlreadyExists(ClauseId),
    #[error("variable {0} is already assigned")]
    AlreadyAssigned(Var),
    #[error("literal {0} does not occur in clause {1}")]
    EdgeNotFound(Lit, ClauseId),
    #[error("cannot restore literal {requested}, the last removed literal is {last}")]
    NotLastRemoved { requested: Lit, last: Lit },
    #[error("no {0} backup to restore")]
    NothingToRestore(BackupChannel),
    #[error("cannot restore the {channel} backup before the later {pending} mutation")]
    RestoreOrder {
        channel: BackupChannel,
        pending: BackupChannel,
    },
    #[error("cannot restore the {0} backup: {1}")]
    RestoreConflict(BackupChannel, String),
    #[error("a variable simplification batch is pending")]
    SimplificationPending,
    #[error("invalid variable merge involving variable {0}")]
    InvalidMerge(Var),
    #[error("the renamable-Horn recognizer is not initialized")]
    NotInitialized,
    #[error("the renamable-Horn recognizer is already initialized")]
    AlreadyInitialized,
    #[error("corrupt graph state: {0}")]
    CorruptState(String),
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;

/// Shortcut for building a [`GraphError::CorruptState`].
macro_rules! corrupt {
    ($($arg:tt)*) => {
        $crate::error::GraphError::CorruptState(format!($($arg)*))
    };
}
