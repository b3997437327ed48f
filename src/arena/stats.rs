//! Applies a battle outcome to the persisted win/loss counters.

use log::info;

use super::resolver::BattleOutcome;
use crate::catalog::{CatalogStore, StatsDelta};
use crate::error::ArenaError;

/// Counter increments implied by an outcome. A self-battle folds into one delta.
pub fn deltas(outcome: &BattleOutcome) -> Vec<StatsDelta> {
    if outcome.winner == outcome.loser {
        return vec![StatsDelta {
            id: outcome.winner,
            wins: 1,
            losses: 1,
        }];
    }
    vec![
        StatsDelta {
            id: outcome.winner,
            wins: 1,
            losses: 0,
        },
        StatsDelta {
            id: outcome.loser,
            wins: 0,
            losses: 1,
        },
    ]
}

/// Commit both increments in one store step.
///
/// Safe to call again with the same outcome after a failure; the draw is
/// never repeated here.
pub fn commit(store: &dyn CatalogStore, outcome: &BattleOutcome) -> Result<(), ArenaError> {
    store.commit_stats(&deltas(outcome))?;
    info!(
        "Battle committed: {} beat {} (scores {:.2} vs {:.2}, draw {:.4})",
        outcome.winner, outcome.loser, outcome.first_score, outcome.second_score, outcome.draw
    );
    Ok(())
}
