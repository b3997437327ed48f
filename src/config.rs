//! Service configuration read from the environment.
//!
//! Rocket's own settings (address, port, log level) stay in `Rocket.toml` /
//! `ROCKET_*`; this only covers the arena and its catalog store.

use std::path::PathBuf;
use std::time::Duration;

use log::warn;

pub const SEED_VAR: &str = "ARENA_SEED";
pub const JOURNAL_VAR: &str = "CATALOG_JOURNAL_FILE";
pub const TIMEOUT_VAR: &str = "ARENA_STORE_TIMEOUT_MS";

pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaConfig {
    /// Seed for the battle RNG; `None` draws one from OS entropy.
    pub seed: Option<u64>,
    /// JSON-lines journal backing the catalog; `None` keeps it in memory only.
    pub journal_file: Option<PathBuf>,
    pub store_timeout: Duration,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            seed: None,
            journal_file: None,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl ArenaConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup. Unparsable values fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ArenaConfig::default();

        if let Some(raw) = lookup(SEED_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(seed) => config.seed = Some(seed),
                Err(e) => warn!("Ignoring {SEED_VAR}={raw:?}: {e}"),
            }
        }

        if let Some(raw) = lookup(JOURNAL_VAR) {
            if !raw.trim().is_empty() {
                config.journal_file = Some(PathBuf::from(raw.trim()));
            }
        }

        if let Some(raw) = lookup(TIMEOUT_VAR) {
            match raw.trim().parse::<u64>() {
                Ok(0) => warn!("Ignoring {TIMEOUT_VAR}=0, a deadline must be positive"),
                Ok(ms) => config.store_timeout = Duration::from_millis(ms),
                Err(e) => warn!("Ignoring {TIMEOUT_VAR}={raw:?}: {e}"),
            }
        }

        config
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
