use std::sync::Arc;

use rocket::response::status::Created;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use super::{CatalogEntry, EntryId, NewEntry};
use crate::arena::Arena;
use crate::blocking::with_deadline;
use crate::config::ArenaConfig;
use crate::status_messages::{new_status, ApiError, Status};

/// Register an exercise or ingredient.
#[openapi]
#[post("/catalog", format = "json", data = "<entry>")]
pub async fn create_entry(
    entry: Json<NewEntry>,
    arena: &State<Arc<Arena>>,
    config: &State<ArenaConfig>,
) -> Result<Created<Json<CatalogEntry>>, ApiError> {
    let store = Arc::clone(arena.store());
    let NewEntry { name, attributes } = entry.into_inner();
    let created = with_deadline(config.store_timeout, move || store.create(&name, attributes)).await?;
    Ok(Created::new(format!("/catalog/{}", created.id)).body(Json(created)))
}

/// List live catalog entries.
#[openapi]
#[get("/catalog")]
pub async fn list_entries(
    arena: &State<Arc<Arena>>,
    config: &State<ArenaConfig>,
) -> Result<Json<Vec<CatalogEntry>>, ApiError> {
    let store = Arc::clone(arena.store());
    let entries = with_deadline(config.store_timeout, move || store.list(false)).await?;
    Ok(Json(entries))
}

#[openapi]
#[get("/catalog/<id>")]
pub async fn get_entry(
    id: EntryId,
    arena: &State<Arc<Arena>>,
    config: &State<ArenaConfig>,
) -> Result<Json<CatalogEntry>, ApiError> {
    let store = Arc::clone(arena.store());
    let entry = with_deadline(config.store_timeout, move || store.get_active(id)).await?;
    Ok(Json(entry))
}

#[openapi]
#[get("/catalog/by-name/<name>")]
pub async fn get_entry_by_name(
    name: String,
    arena: &State<Arc<Arena>>,
    config: &State<ArenaConfig>,
) -> Result<Json<CatalogEntry>, ApiError> {
    let store = Arc::clone(arena.store());
    let entry = with_deadline(config.store_timeout, move || store.find_by_name(&name)).await?;
    Ok(Json(entry))
}

/// Soft-delete an entry. Its counters are kept.
#[openapi]
#[delete("/catalog/<id>")]
pub async fn delete_entry(
    id: EntryId,
    arena: &State<Arc<Arena>>,
    config: &State<ArenaConfig>,
) -> Result<Json<Status>, ApiError> {
    let store = Arc::clone(arena.store());
    with_deadline(config.store_timeout, move || store.soft_delete(id)).await?;
    Ok(new_status(format!("Entry {id} deleted")))
}
