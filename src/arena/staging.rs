//! Holding area for the combatants of the next battle.
//!
//! Mutations go through one mutex so the two-slot limit holds under
//! concurrent requests. Nothing here is persisted; a restart empties it.

use std::sync::{Mutex, MutexGuard};

use log::info;

use crate::catalog::{CatalogStore, EntryId};
use crate::error::ArenaError;

pub const CAPACITY: usize = 2;

#[derive(Debug, Default)]
pub struct StagingSet {
    slots: Mutex<Vec<EntryId>>,
}

impl StagingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the critical section. Battles hold this for their whole run.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<EntryId>> {
        match self.slots.lock() {
            Ok(g) => g,
            Err(e) => e.into_inner(),
        }
    }

    /// Stage a live catalog entry. Staging the same id twice is allowed.
    pub fn add(&self, store: &dyn CatalogStore, id: EntryId) -> Result<Vec<EntryId>, ArenaError> {
        let mut slots = self.lock();
        if slots.len() >= CAPACITY {
            return Err(ArenaError::CapacityExceeded);
        }
        let entry = store.get_active(id)?;
        slots.push(id);
        info!("Staged combatant {} ({}), {} staged", id, entry.name, slots.len());
        Ok(slots.clone())
    }

    pub fn clear(&self) {
        self.lock().clear();
        info!("Combatants cleared");
    }

    pub fn list(&self) -> Vec<EntryId> {
        self.lock().clone()
    }
}

pub(crate) fn staged_pair(slots: &[EntryId]) -> Result<[EntryId; 2], ArenaError> {
    match *slots {
        [first, second] => Ok([first, second]),
        _ => Err(ArenaError::InsufficientCombatants(slots.len())),
    }
}

/// Remove one occurrence of the loser. Returns whether anything was removed.
pub(crate) fn remove_loser(slots: &mut Vec<EntryId>, loser: EntryId) -> bool {
    match slots.iter().position(|id| *id == loser) {
        Some(index) => {
            slots.remove(index);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_requires_exactly_two() {
        assert_eq!(
            staged_pair(&[]),
            Err(ArenaError::InsufficientCombatants(0))
        );
        assert_eq!(
            staged_pair(&[4]),
            Err(ArenaError::InsufficientCombatants(1))
        );
        assert_eq!(staged_pair(&[4, 9]), Ok([4, 9]));
    }

    #[test]
    fn removing_a_duplicate_leaves_one_copy() {
        let mut slots = vec![3, 3];
        assert!(remove_loser(&mut slots, 3));
        assert_eq!(slots, vec![3]);
        assert!(!remove_loser(&mut slots, 8));
        assert_eq!(slots, vec![3]);
    }
}
