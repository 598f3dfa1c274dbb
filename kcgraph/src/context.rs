//! Mutable state of an incidence graph.
use partial_ref::{part, PartialRefTarget};

use crate::backup::Backups;
use crate::occurrence::Occurrences;
use crate::store::ClauseStore;

/// Part declarations for the [`GraphContext`] struct.
mod parts {
    use super::*;

    part!(pub BackupsP: Backups);
    part!(pub OccurrencesP: Occurrences);
    part!(pub StoreP: ClauseStore);
}

pub use parts::*;

/// Mutable state of an incidence graph.
///
/// Edges are stored twice: as literals of the clause in the [`ClauseStore`] and as live
/// occurrences of the literal in [`Occurrences`]. Functions editing the graph take partial
/// references to the parts they touch.
#[derive(PartialRefTarget, Default)]
pub struct GraphContext {
    #[part = "BackupsP"]
    backups: Backups,
    #[part = "OccurrencesP"]
    occurrences: Occurrences,
    #[part = "StoreP"]
    store: ClauseStore,
}

impl GraphContext {
    pub fn backups(&self) -> &Backups {
        &self.backups
    }

    pub fn occurrences(&self) -> &Occurrences {
        &self.occurrences
    }

    pub fn store(&self) -> &ClauseStore {
        &self.store
    }
}
