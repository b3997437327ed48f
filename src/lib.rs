//! # Catalog Arena
//!
//! A web API where catalog entries (exercises or food ingredients) battle
//! each other.
//!
//! ## Overview
//!
//! Entries are registered in the catalog with their numeric attributes. Up to
//! two of them can be staged as combatants; a battle scores both, draws a
//! score-weighted winner, records a win and a loss, and keeps the winner
//! staged for the next challenger. The leaderboard ranks live entries by
//! wins, win percentage or battles fought.
//!
//! ## Architecture
//!
//! The API is built using the Rocket web framework with OpenAPI documentation
//! support. A single `Arc<Arena>` is managed by Rocket and shared by all
//! requests; it serializes staging changes internally. Store work runs on the
//! blocking pool under a deadline from [`config::ArenaConfig`].

// Rocket makes this a bit tricky to support
#![allow(clippy::module_name_repetitions)]
#[macro_use]
extern crate rocket;

use std::sync::Arc;

use log::{error, info};
use rocket::fairing::AdHoc;
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};

pub mod arena;
pub mod blocking;
pub mod catalog;
pub mod config;
pub mod error;
pub mod health;
pub mod status_messages;

use crate::arena::Arena;
use crate::catalog::{CatalogStore, InMemoryCatalog};
use crate::config::ArenaConfig;
use crate::error::ArenaError;

/// Builds the server from environment configuration.
///
/// # Example
///
/// ```no_run
/// use catalog_arena::rocket_initialize;
///
/// #[rocket::main]
/// async fn main() {
///     let rocket = rocket_initialize().expect("catalog store available");
///     rocket.launch().await.expect("Failed to launch rocket");
/// }
/// ```
pub fn rocket_initialize() -> Result<rocket::Rocket<rocket::Build>, ArenaError> {
    rocket_with(ArenaConfig::from_env())
}

/// Installs the `RUST_LOG` driven logger; later calls are no-ops.
pub fn init_logging() {
    #[allow(clippy::no_effect_underscore_binding)]
    let _ = env_logger::try_init();
}

/// Builds the server from an explicit configuration, opening the journal if one is set.
pub fn rocket_with(config: ArenaConfig) -> Result<rocket::Rocket<rocket::Build>, ArenaError> {
    let store: Arc<dyn CatalogStore> = match &config.journal_file {
        Some(path) => {
            info!("Catalog journal at {:?}", path);
            Arc::new(InMemoryCatalog::open(path)?)
        }
        None => Arc::new(InMemoryCatalog::new()),
    };
    Ok(rocket_with_store(config, store))
}

/// Builds the server around an already constructed catalog store.
pub fn rocket_with_store(
    config: ArenaConfig,
    store: Arc<dyn CatalogStore>,
) -> rocket::Rocket<rocket::Build> {
    use crate::arena::endpoints::*;
    use crate::catalog::endpoints::*;
    use crate::health::*;

    init_logging();

    let arena = Arc::new(Arena::new(store, config.seed));

    rocket::build()
        .mount(
            "/",
            openapi_get_routes![
                create_entry,
                list_entries,
                get_entry,
                get_entry_by_name,
                delete_entry,
                add_combatant,
                list_combatants,
                clear_combatants,
                battle,
                retry_battle_commit,
                get_leaderboard,
                health_check,
                store_health_check
            ],
        )
        .mount("/swagger", make_swagger_ui(&get_docs()))
        .manage(arena)
        .manage(config)
        .attach(AdHoc::on_shutdown("catalog-journal-shutdown", |rocket| {
            Box::pin(async move {
                match rocket.state::<Arc<Arena>>() {
                    Some(arena) => arena.store().close(),
                    None => error!("Arena state missing at shutdown, journal not flushed"),
                }
            })
        }))
}

fn get_docs() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}
