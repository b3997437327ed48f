use std::sync::Arc;

use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};

use crate::arena::Arena;
use crate::blocking::with_deadline;
use crate::config::ArenaConfig;
use crate::status_messages::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct HealthResponse {
    pub status: String,
    /// Live catalog entries, only reported by the store check.
    pub entries: Option<usize>,
}

/// Liveness check.
#[openapi]
#[get("/health")]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        entries: None,
    })
}

/// Check that the catalog store answers within the configured deadline.
#[openapi]
#[get("/health/store")]
pub async fn store_health_check(
    arena: &State<Arc<Arena>>,
    config: &State<ArenaConfig>,
) -> Result<Json<HealthResponse>, ApiError> {
    let store = Arc::clone(arena.store());
    let entries = with_deadline(config.store_timeout, move || store.list(false)).await?;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        entries: Some(entries.len()),
    }))
}
