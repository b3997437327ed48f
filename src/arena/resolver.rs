//! Score-weighted battle resolution.

use rand::{Rng, RngCore};
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use super::score::score;
use crate::catalog::{CatalogStore, EntryId};
use crate::error::ArenaError;

/// Result of one draw. Not persisted; the counters it implies are.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct BattleOutcome {
    pub first: EntryId,
    pub second: EntryId,
    pub first_score: f64,
    pub second_score: f64,
    /// Uniform draw in `[0, 1)` compared against the first combatant's odds.
    pub draw: f64,
    pub winner: EntryId,
    pub loser: EntryId,
}

impl BattleOutcome {
    pub fn first_win_probability(&self) -> f64 {
        win_probability(self.first_score, self.second_score)
    }
}

/// Chance that the combatant scoring `first` beats the one scoring `second`.
/// Two zero scores make it a coin flip, and so does any NaN along the way.
pub fn win_probability(first: f64, second: f64) -> f64 {
    if first.is_nan() || second.is_nan() {
        return 0.5;
    }
    if first > 0.0 {
        // first / (first + second) without summing, so huge scores cannot overflow
        let probability = 1.0 / (1.0 + second / first);
        if probability.is_nan() {
            0.5
        } else {
            probability
        }
    } else if second > 0.0 {
        0.0
    } else {
        0.5
    }
}

/// Pure decision step. A draw equal to the probability goes to `second`.
pub fn decide(
    [first, second]: [EntryId; 2],
    first_score: f64,
    second_score: f64,
    draw: f64,
) -> BattleOutcome {
    let (winner, loser) = if draw < win_probability(first_score, second_score) {
        (first, second)
    } else {
        (second, first)
    };
    BattleOutcome {
        first,
        second,
        first_score,
        second_score,
        draw,
        winner,
        loser,
    }
}

/// Fetch both combatants fresh from the store, score them and draw a winner.
///
/// Performs no writes. Fails with `NotFound` if either entry is gone or was
/// deleted after being staged.
pub fn resolve<R>(
    pair: [EntryId; 2],
    store: &dyn CatalogStore,
    rng: &mut R,
) -> Result<BattleOutcome, ArenaError>
where
    R: RngCore + ?Sized,
{
    let first = store.get_active(pair[0])?;
    let second = store.get_active(pair[1])?;
    let first_score = score(&first.attributes);
    let second_score = score(&second.attributes);
    let draw: f64 = rng.gen();
    Ok(decide(pair, first_score, second_score, draw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_is_score_share() {
        assert_eq!(win_probability(10.0, 0.0), 1.0);
        assert_eq!(win_probability(0.0, 10.0), 0.0);
        assert_eq!(win_probability(1.0, 3.0), 0.25);
        assert_eq!(win_probability(0.0, 0.0), 0.5);
    }

    #[test]
    fn extreme_scores_stay_well_defined() {
        assert_eq!(win_probability(1e308, 1e308), 0.5);
        assert_eq!(win_probability(f64::MAX, f64::MAX), 0.5);
        assert_eq!(win_probability(f64::INFINITY, f64::INFINITY), 0.5);
        assert_eq!(win_probability(f64::NAN, 1.0), 0.5);
        assert_eq!(win_probability(1.0, f64::NAN), 0.5);
        assert_eq!(win_probability(f64::MAX, 1.0), 1.0);
        assert!(win_probability(1.0, f64::MAX) < 1e-300);
        assert_eq!(win_probability(0.0, f64::INFINITY), 0.0);

        let outcome = decide([1, 2], 1e308, 1e308, 0.25);
        assert_eq!(outcome.winner, 1);
    }

    #[test]
    fn draw_below_probability_goes_to_first() {
        let outcome = decide([1, 2], 3.0, 1.0, 0.74);
        assert_eq!((outcome.winner, outcome.loser), (1, 2));
    }

    #[test]
    fn draw_equal_to_probability_goes_to_second() {
        let outcome = decide([1, 2], 1.0, 1.0, 0.5);
        assert_eq!((outcome.winner, outcome.loser), (2, 1));
    }

    #[test]
    fn certain_winner_wins_any_draw() {
        for draw in [0.0, 0.5, 0.999_999_999] {
            assert_eq!(decide([7, 8], 10.0, 0.0, draw).winner, 7);
        }
    }

    #[test]
    fn self_battle_names_the_same_entry_twice() {
        let outcome = decide([5, 5], 2.0, 2.0, 0.1);
        assert_eq!(outcome.winner, 5);
        assert_eq!(outcome.loser, 5);
    }
}
