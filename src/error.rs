//! Error taxonomy shared by the catalog and the arena.
//!
//! Every variant is recoverable at the request level; none of them is fatal
//! for the process. The HTTP mapping lives in [`crate::status_messages`].

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArenaError {
    /// The referenced entry does not exist or has been soft-deleted.
    #[error("{0}")]
    NotFound(String),

    /// The staging set already holds two combatants.
    #[error("Cannot stage more than {} combatants", crate::arena::staging::CAPACITY)]
    CapacityExceeded,

    /// A battle needs exactly two staged combatants.
    #[error("Two combatants must be staged for a battle, found {0}")]
    InsufficientCombatants(usize),

    /// The catalog store failed or did not answer in time.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Invalid catalog entry: {0}")]
    InvalidEntry(String),

    #[error("Invalid sort key: {0}. Expected 'wins', 'win_pct' or 'battles'")]
    InvalidSortKey(String),

    #[error("No failed battle commit is waiting for a retry")]
    NoPendingCommit,
}

impl ArenaError {
    pub fn entry_not_found(id: u64) -> Self {
        ArenaError::NotFound(format!("Entry with id {id} not found"))
    }

    pub fn entry_deleted(id: u64) -> Self {
        ArenaError::NotFound(format!("Entry with id {id} has been deleted"))
    }
}
