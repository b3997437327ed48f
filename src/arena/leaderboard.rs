//! Ranked views over the catalog's win/loss counters.

use std::cmp::Ordering;
use std::str::FromStr;

use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::{CatalogEntry, CatalogStore, EntryId};
use crate::error::ArenaError;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Wins,
    WinPct,
    Battles,
}

impl FromStr for SortKey {
    type Err = ArenaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wins" => Ok(SortKey::Wins),
            "win_pct" => Ok(SortKey::WinPct),
            "battles" => Ok(SortKey::Battles),
            other => Err(ArenaError::InvalidSortKey(other.to_string())),
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct LeaderboardRow {
    pub id: EntryId,
    pub name: String,
    pub wins: u64,
    pub losses: u64,
    pub battles: u64,
    /// Percentage rounded to one decimal; 0 for entries that never fought.
    pub win_pct: f64,
}

impl From<&CatalogEntry> for LeaderboardRow {
    fn from(entry: &CatalogEntry) -> Self {
        LeaderboardRow {
            id: entry.id,
            name: entry.name.clone(),
            wins: entry.wins,
            losses: entry.losses,
            battles: entry.battles(),
            win_pct: win_pct(entry.wins, entry.battles()),
        }
    }
}

pub fn win_pct(wins: u64, battles: u64) -> f64 {
    if battles == 0 {
        return 0.0;
    }
    (wins as f64 / battles as f64 * 1000.0).round() / 10.0
}

fn by_wins(a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
    b.wins.cmp(&a.wins).then_with(|| a.id.cmp(&b.id))
}

// Ratios are compared by cross-multiplying, so equal ratios tie exactly.
fn by_win_pct(a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
    let ratio = match (a.battles(), b.battles()) {
        (0, 0) => Ordering::Equal,
        (0, _) => Ordering::Greater,
        (_, 0) => Ordering::Less,
        (a_battles, b_battles) => {
            let a_side = u128::from(a.wins) * u128::from(b_battles);
            let b_side = u128::from(b.wins) * u128::from(a_battles);
            b_side.cmp(&a_side)
        }
    };
    ratio.then_with(|| by_wins(a, b))
}

fn by_battles(a: &CatalogEntry, b: &CatalogEntry) -> Ordering {
    b.battles().cmp(&a.battles()).then_with(|| by_wins(a, b))
}

/// Rank live entries. Deleted entries are dropped even if passed in.
pub fn rank(entries: &[CatalogEntry], key: SortKey) -> Vec<LeaderboardRow> {
    let mut live: Vec<&CatalogEntry> = entries.iter().filter(|e| !e.deleted).collect();
    let compare = match key {
        SortKey::Wins => by_wins,
        SortKey::WinPct => by_win_pct,
        SortKey::Battles => by_battles,
    };
    live.sort_by(|a, b| compare(a, b));
    live.into_iter().map(LeaderboardRow::from).collect()
}

/// Read one consistent snapshot of the catalog and rank it.
pub fn leaderboard(store: &dyn CatalogStore, key: SortKey) -> Result<Vec<LeaderboardRow>, ArenaError> {
    let entries = store.list(false)?;
    Ok(rank(&entries, key))
}
