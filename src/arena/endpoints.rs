use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};

use super::leaderboard::{LeaderboardRow, SortKey};
use super::{Arena, BattleReport};
use crate::blocking::with_deadline;
use crate::catalog::{CatalogEntry, EntryId};
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::status_messages::{new_status, ApiError, Status};

/// Stage a combatant by catalog id or by name.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CombatantRequest {
    pub id: Option<EntryId>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct CombatantsResponse {
    pub combatants: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct LeaderboardResponse {
    pub sort: SortKey,
    pub leaderboard: Vec<LeaderboardRow>,
}

/// Add a combatant to the staging set (at most two).
#[openapi]
#[post("/combatants", format = "json", data = "<request>")]
pub async fn add_combatant(
    request: Json<CombatantRequest>,
    arena: &State<Arc<Arena>>,
    config: &State<ArenaConfig>,
) -> Result<Json<CombatantsResponse>, ApiError> {
    let arena = Arc::clone(arena.inner());
    let request = request.into_inner();
    let combatants = with_deadline(config.store_timeout, move || {
        let staged = match (request.id, request.name) {
            (Some(id), _) => arena.add_combatant(id)?,
            (None, Some(name)) => arena.add_combatant_by_name(&name)?,
            (None, None) => {
                return Err(ArenaError::InvalidEntry(
                    "a combatant needs an id or a name".to_string(),
                ))
            }
        };
        // the set as this add left it, even if another request changes it next
        arena.entries_of(&staged)
    })
    .await?;
    Ok(Json(CombatantsResponse { combatants }))
}

/// List the staged combatants.
#[openapi]
#[get("/combatants")]
pub async fn list_combatants(
    arena: &State<Arc<Arena>>,
    config: &State<ArenaConfig>,
) -> Result<Json<CombatantsResponse>, ApiError> {
    let arena = Arc::clone(arena.inner());
    let combatants = with_deadline(config.store_timeout, move || arena.combatant_entries()).await?;
    Ok(Json(CombatantsResponse { combatants }))
}

/// Empty the staging set.
#[openapi]
#[delete("/combatants")]
pub async fn clear_combatants(
    arena: &State<Arc<Arena>>,
    config: &State<ArenaConfig>,
) -> Result<Json<Status>, ApiError> {
    let arena = Arc::clone(arena.inner());
    // waits behind a battle that holds the staging lock
    with_deadline(config.store_timeout, move || {
        arena.clear_combatants();
        Ok(())
    })
    .await?;
    Ok(new_status("Combatants cleared".to_string()))
}

/// Fight the two staged combatants and record the result.
#[openapi]
#[post("/battle")]
pub async fn battle(
    arena: &State<Arc<Arena>>,
    config: &State<ArenaConfig>,
) -> Result<Json<BattleReport>, ApiError> {
    let arena = Arc::clone(arena.inner());
    let report = with_deadline(config.store_timeout, move || arena.battle()).await?;
    Ok(Json(report))
}

/// Retry recording the last battle whose result could not be stored.
#[openapi]
#[post("/battle/retry")]
pub async fn retry_battle_commit(
    arena: &State<Arc<Arena>>,
    config: &State<ArenaConfig>,
) -> Result<Json<BattleReport>, ApiError> {
    let arena = Arc::clone(arena.inner());
    let report = with_deadline(config.store_timeout, move || arena.retry_commit()).await?;
    Ok(Json(report))
}

/// Leaderboard sorted by `wins` (default), `win_pct` or `battles`.
#[openapi]
#[get("/leaderboard?<sort>")]
pub async fn get_leaderboard(
    sort: Option<String>,
    arena: &State<Arc<Arena>>,
    config: &State<ArenaConfig>,
) -> Result<Json<LeaderboardResponse>, ApiError> {
    let key = match sort.as_deref() {
        Some(raw) => raw.parse::<SortKey>()?,
        None => SortKey::default(),
    };
    let arena = Arc::clone(arena.inner());
    let leaderboard = with_deadline(config.store_timeout, move || arena.leaderboard(key)).await?;
    Ok(Json(LeaderboardResponse {
        sort: key,
        leaderboard,
    }))
}
