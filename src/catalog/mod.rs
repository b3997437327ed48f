//! Catalog of exercises and ingredients that can be sent into the arena.
//!
//! The arena only talks to the catalog through [`CatalogStore`]. The default
//! implementation, [`InMemoryCatalog`], keeps entries in memory and can mirror
//! every mutation to a JSON-lines journal so the catalog survives restarts.

pub mod endpoints;
pub mod journal;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info};
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::error::ArenaError;
use journal::{CatalogEvent, JournalWriter};

pub type EntryId = u64;

/// Upper bound of the rating of perceived exertion scale.
pub const MAX_RPE: f64 = 10.0;

/// Upper bound for every real-valued attribute. Keeps scores finite.
pub const MAX_ATTRIBUTE: f64 = 1e6;

/// Numeric attributes fetched from the nutrition/fitness provider.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "kind")]
pub enum Attributes {
    Exercise {
        weight: f64,
        sets: u32,
        repetitions: u32,
        rpe: f64,
    },
    Ingredient {
        energy: f64,
        protein: f64,
        carbohydrates: f64,
        fat: f64,
        fiber: f64,
    },
}

impl Attributes {
    /// Reject negative, non-finite or out of range values.
    pub fn validate(&self) -> Result<(), ArenaError> {
        let reals: Vec<(&str, f64)> = match self {
            Attributes::Exercise { weight, rpe, .. } => vec![("weight", *weight), ("rpe", *rpe)],
            Attributes::Ingredient {
                energy,
                protein,
                carbohydrates,
                fat,
                fiber,
            } => vec![
                ("energy", *energy),
                ("protein", *protein),
                ("carbohydrates", *carbohydrates),
                ("fat", *fat),
                ("fiber", *fiber),
            ],
        };
        for (field, value) in reals {
            if !value.is_finite() || value < 0.0 {
                return Err(ArenaError::InvalidEntry(format!(
                    "{field} must be a non-negative number, got {value}"
                )));
            }
            if value > MAX_ATTRIBUTE {
                return Err(ArenaError::InvalidEntry(format!(
                    "{field} must be at most {MAX_ATTRIBUTE}, got {value}"
                )));
            }
        }
        if let Attributes::Exercise { rpe, .. } = self {
            if *rpe > MAX_RPE {
                return Err(ArenaError::InvalidEntry(format!(
                    "rpe must be between 0 and {MAX_RPE}, got {rpe}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CatalogEntry {
    pub id: EntryId,
    pub name: String,
    pub attributes: Attributes,
    pub wins: u64,
    pub losses: u64,
    pub deleted: bool,
}

impl CatalogEntry {
    pub fn battles(&self) -> u64 {
        self.wins + self.losses
    }
}

/// Request body for registering a new catalog entry.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct NewEntry {
    pub name: String,
    pub attributes: Attributes,
}

/// Counter increments for one entry.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct StatsDelta {
    pub id: EntryId,
    pub wins: u64,
    pub losses: u64,
}

/// Durable home of catalog entries.
///
/// `commit_stats` must apply all of its deltas as a single step: a concurrent
/// `list` or `get` observes either none or all of them.
pub trait CatalogStore: Send + Sync {
    fn create(&self, name: &str, attributes: Attributes) -> Result<CatalogEntry, ArenaError>;

    /// Fetch an entry by id, soft-deleted ones included.
    fn get(&self, id: EntryId) -> Result<CatalogEntry, ArenaError>;

    /// Fetch the live entry with exactly this name.
    fn find_by_name(&self, name: &str) -> Result<CatalogEntry, ArenaError>;

    /// All entries ordered by id.
    fn list(&self, include_deleted: bool) -> Result<Vec<CatalogEntry>, ArenaError>;

    fn soft_delete(&self, id: EntryId) -> Result<(), ArenaError>;

    /// Fails with `NotFound` if any id is missing or soft-deleted, and with
    /// `Persistence` if the write cannot be made durable; nothing is applied
    /// in either case.
    fn commit_stats(&self, deltas: &[StatsDelta]) -> Result<(), ArenaError>;

    fn increment_stats(
        &self,
        id: EntryId,
        wins_delta: u64,
        losses_delta: u64,
    ) -> Result<(), ArenaError> {
        self.commit_stats(&[StatsDelta {
            id,
            wins: wins_delta,
            losses: losses_delta,
        }])
    }

    /// Flush anything buffered. Called once at shutdown.
    fn close(&self) {}

    /// Like `get`, but a soft-deleted entry counts as missing.
    fn get_active(&self, id: EntryId) -> Result<CatalogEntry, ArenaError> {
        let entry = self.get(id)?;
        if entry.deleted {
            return Err(ArenaError::entry_deleted(id));
        }
        Ok(entry)
    }
}

#[derive(Debug)]
struct CatalogTable {
    entries: BTreeMap<EntryId, CatalogEntry>,
    next_id: EntryId,
}

impl Default for CatalogTable {
    fn default() -> Self {
        CatalogTable {
            entries: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl CatalogTable {
    /// Apply a journal event. Used both for live mutations and for replay.
    fn apply(&mut self, event: &CatalogEvent) {
        match event {
            CatalogEvent::Created(entry) => {
                self.next_id = self.next_id.max(entry.id + 1);
                self.entries.insert(entry.id, entry.clone());
            }
            CatalogEvent::Deleted { id } => {
                if let Some(entry) = self.entries.get_mut(id) {
                    entry.deleted = true;
                }
            }
            CatalogEvent::Stats { deltas } => {
                for delta in deltas {
                    if let Some(entry) = self.entries.get_mut(&delta.id) {
                        entry.wins = entry.wins.saturating_add(delta.wins);
                        entry.losses = entry.losses.saturating_add(delta.losses);
                    }
                }
            }
        }
    }

    fn live_by_name(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.values().find(|e| !e.deleted && e.name == name)
    }
}

/// `RwLock`-guarded catalog, optionally journaled to disk.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    table: RwLock<CatalogTable>,
    journal: Option<JournalWriter>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a journaled catalog, replaying the file first if it already exists.
    pub fn open(path: &Path) -> Result<Self, ArenaError> {
        let mut table = CatalogTable::default();
        if path.exists() {
            let events = journal::load_events(path).map_err(ArenaError::Persistence)?;
            for event in &events {
                table.apply(event);
            }
            info!(
                "Replayed {} catalog events from {:?} ({} entries)",
                events.len(),
                path,
                table.entries.len()
            );
        }
        let writer = JournalWriter::new(path.to_path_buf()).map_err(|e| {
            ArenaError::Persistence(format!("cannot open journal {path:?}: {e}"))
        })?;
        Ok(InMemoryCatalog {
            table: RwLock::new(table),
            journal: Some(writer),
        })
    }

    /// Empty catalog journaled through an already built writer.
    pub fn with_journal(journal: JournalWriter) -> Self {
        InMemoryCatalog {
            table: RwLock::new(CatalogTable::default()),
            journal: Some(journal),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CatalogTable> {
        match self.table.read() {
            Ok(g) => g,
            Err(e) => e.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, CatalogTable> {
        match self.table.write() {
            Ok(g) => g,
            Err(e) => e.into_inner(),
        }
    }

    /// Journal, then apply, both under the write lock. A journal failure
    /// leaves the table untouched.
    fn record(&self, table: &mut CatalogTable, event: CatalogEvent) -> Result<(), ArenaError> {
        if let Some(journal) = &self.journal {
            journal.append(&event)?;
        }
        table.apply(&event);
        Ok(())
    }
}

impl CatalogStore for InMemoryCatalog {
    fn create(&self, name: &str, attributes: Attributes) -> Result<CatalogEntry, ArenaError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ArenaError::InvalidEntry("name must not be empty".to_string()));
        }
        attributes.validate()?;

        let mut table = self.write();
        if table.live_by_name(name).is_some() {
            return Err(ArenaError::InvalidEntry(format!(
                "An entry named '{name}' already exists"
            )));
        }
        let entry = CatalogEntry {
            id: table.next_id,
            name: name.to_string(),
            attributes,
            wins: 0,
            losses: 0,
            deleted: false,
        };
        self.record(&mut table, CatalogEvent::Created(entry.clone()))?;
        info!("Catalog entry {} created: {}", entry.id, entry.name);
        Ok(entry)
    }

    fn get(&self, id: EntryId) -> Result<CatalogEntry, ArenaError> {
        self.read()
            .entries
            .get(&id)
            .cloned()
            .ok_or_else(|| ArenaError::entry_not_found(id))
    }

    fn find_by_name(&self, name: &str) -> Result<CatalogEntry, ArenaError> {
        self.read()
            .live_by_name(name.trim())
            .cloned()
            .ok_or_else(|| ArenaError::NotFound(format!("Entry with name '{name}' not found")))
    }

    fn list(&self, include_deleted: bool) -> Result<Vec<CatalogEntry>, ArenaError> {
        Ok(self
            .read()
            .entries
            .values()
            .filter(|e| include_deleted || !e.deleted)
            .cloned()
            .collect())
    }

    fn soft_delete(&self, id: EntryId) -> Result<(), ArenaError> {
        let mut table = self.write();
        match table.entries.get(&id) {
            None => return Err(ArenaError::entry_not_found(id)),
            Some(entry) if entry.deleted => {
                return Err(ArenaError::NotFound(format!(
                    "Entry with id {id} has already been deleted"
                )))
            }
            Some(_) => {}
        }
        self.record(&mut table, CatalogEvent::Deleted { id })?;
        info!("Catalog entry {id} marked as deleted");
        Ok(())
    }

    fn commit_stats(&self, deltas: &[StatsDelta]) -> Result<(), ArenaError> {
        let mut table = self.write();
        // validate everything before touching anything
        for delta in deltas {
            match table.entries.get(&delta.id) {
                None => return Err(ArenaError::entry_not_found(delta.id)),
                Some(entry) if entry.deleted => return Err(ArenaError::entry_deleted(delta.id)),
                Some(_) => {}
            }
        }
        self.record(
            &mut table,
            CatalogEvent::Stats {
                deltas: deltas.to_vec(),
            },
        )?;
        debug!("Committed stats {deltas:?}");
        Ok(())
    }

    fn close(&self) {
        if let Some(journal) = &self.journal {
            journal.close();
        }
    }
}
