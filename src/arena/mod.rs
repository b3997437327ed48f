//! Combat resolution and leaderboard engine.
//!
//! [`Arena`] is the one shared arena per server instance. It owns the
//! staging set and the battle RNG, and reaches catalog entries only through
//! the injected [`CatalogStore`].
//!
//! After a committed battle the loser leaves the staging set and the winner
//! stays staged, ready for the next challenger.

pub mod endpoints;
pub mod leaderboard;
pub mod resolver;
pub mod score;
pub mod staging;
pub mod stats;

use std::sync::{Arc, Mutex, MutexGuard};

use log::{info, warn};
use rand::{RngCore, SeedableRng};
use rand_pcg::Lcg64Xsh32;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::{CatalogEntry, CatalogStore, EntryId};
use crate::error::ArenaError;
use leaderboard::{LeaderboardRow, SortKey};
use resolver::BattleOutcome;
use staging::StagingSet;

/// A committed battle together with what it did to the staging set.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct BattleReport {
    pub outcome: BattleOutcome,
    /// Id taken out of the staging set, if it was still there.
    pub removed: Option<EntryId>,
    /// Staging set contents after the battle.
    pub staged: Vec<EntryId>,
}

/// Seed the battle RNG from a u64, two copies filling the 16 seed bytes.
pub fn seeded_rng(seed: u64) -> Lcg64Xsh32 {
    let mut seed_bytes = [0u8; 16];
    seed_bytes[0..8].copy_from_slice(&seed.to_le_bytes());
    seed_bytes[8..16].copy_from_slice(&seed.to_le_bytes());
    Lcg64Xsh32::from_seed(seed_bytes)
}

pub struct Arena {
    store: Arc<dyn CatalogStore>,
    staging: StagingSet,
    rng: Mutex<Box<dyn RngCore + Send>>,
    // Outcome whose stats commit failed, waiting for retry_commit.
    pending: Mutex<Option<BattleOutcome>>,
}

impl std::fmt::Debug for Arena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Arena")
            .field("staging", &self.staging)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

impl Arena {
    /// Arena with a PCG generator, seeded when `seed` is given and from OS
    /// entropy otherwise.
    pub fn new(store: Arc<dyn CatalogStore>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => seeded_rng(seed),
            None => Lcg64Xsh32::from_entropy(),
        };
        Self::with_rng(store, rng)
    }

    /// Arena drawing from any generator, e.g. a fixed one in tests.
    pub fn with_rng<R>(store: Arc<dyn CatalogStore>, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        Arena {
            store,
            staging: StagingSet::new(),
            rng: Mutex::new(Box::new(rng)),
            pending: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    pub fn add_combatant(&self, id: EntryId) -> Result<Vec<EntryId>, ArenaError> {
        self.staging.add(self.store.as_ref(), id)
    }

    /// Stage the live entry with this name.
    pub fn add_combatant_by_name(&self, name: &str) -> Result<Vec<EntryId>, ArenaError> {
        let entry = self.store.find_by_name(name)?;
        self.add_combatant(entry.id)
    }

    pub fn clear_combatants(&self) {
        self.staging.clear();
    }

    pub fn combatants(&self) -> Vec<EntryId> {
        self.staging.list()
    }

    /// Current staged entries as stored, deleted flag included.
    pub fn combatant_entries(&self) -> Result<Vec<CatalogEntry>, ArenaError> {
        self.entries_of(&self.combatants())
    }

    /// Look up `ids` in order, e.g. the staging snapshot returned by an add.
    pub fn entries_of(&self, ids: &[EntryId]) -> Result<Vec<CatalogEntry>, ArenaError> {
        ids.iter().map(|&id| self.store.get(id)).collect()
    }

    /// Draw an outcome for the staged pair without writing anything.
    pub fn resolve(&self) -> Result<BattleOutcome, ArenaError> {
        let pair = staging::staged_pair(&self.staging.lock())?;
        self.draw(pair)
    }

    /// Commit an outcome from [`Arena::resolve`], then drop its loser from staging.
    pub fn commit(&self, outcome: &BattleOutcome) -> Result<BattleReport, ArenaError> {
        let mut slots = self.staging.lock();
        self.commit_locked(&mut slots, outcome.clone())
    }

    /// Resolve and commit the staged pair as one step.
    pub fn battle(&self) -> Result<BattleReport, ArenaError> {
        let mut slots = self.staging.lock();
        let pair = staging::staged_pair(&slots)?;
        info!("Two combatants enter, one leaves: {} vs {}", pair[0], pair[1]);
        let outcome = self.draw(pair)?;
        self.commit_locked(&mut slots, outcome)
    }

    /// Replay the commit of the last battle whose commit failed.
    pub fn retry_commit(&self) -> Result<BattleReport, ArenaError> {
        let mut slots = self.staging.lock();
        let outcome = lock(&self.pending)
            .clone()
            .ok_or(ArenaError::NoPendingCommit)?;
        info!(
            "Retrying commit of {} beating {}",
            outcome.winner, outcome.loser
        );
        self.commit_locked(&mut slots, outcome)
    }

    pub fn pending_commit(&self) -> Option<BattleOutcome> {
        lock(&self.pending).clone()
    }

    pub fn leaderboard(&self, key: SortKey) -> Result<Vec<LeaderboardRow>, ArenaError> {
        leaderboard::leaderboard(self.store.as_ref(), key)
    }

    fn draw(&self, pair: [EntryId; 2]) -> Result<BattleOutcome, ArenaError> {
        let mut rng = lock(&self.rng);
        resolver::resolve(pair, self.store.as_ref(), &mut **rng)
    }

    // Staging only changes once the store has accepted the counters.
    fn commit_locked(
        &self,
        slots: &mut Vec<EntryId>,
        outcome: BattleOutcome,
    ) -> Result<BattleReport, ArenaError> {
        if let Err(e) = stats::commit(self.store.as_ref(), &outcome) {
            warn!(
                "Stats commit failed for {} beating {}: {e}",
                outcome.winner, outcome.loser
            );
            let mut pending = lock(&self.pending);
            if matches!(e, ArenaError::Persistence(_)) {
                *pending = Some(outcome);
            } else if pending.as_ref() == Some(&outcome) {
                // a combatant vanished; this outcome can never be recorded
                warn!("Dropping pending outcome {} beating {}", outcome.winner, outcome.loser);
                *pending = None;
            }
            return Err(e);
        }
        if let Some(stale) = lock(&self.pending).take() {
            if stale != outcome {
                warn!(
                    "Discarding uncommitted outcome {} beating {}",
                    stale.winner, stale.loser
                );
            }
        }
        let removed = staging::remove_loser(slots, outcome.loser).then_some(outcome.loser);
        Ok(BattleReport {
            outcome,
            removed,
            staged: slots.clone(),
        })
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(g) => g,
        Err(e) => e.into_inner(),
    }
}
