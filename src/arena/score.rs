//! Strength score of a catalog entry.
//!
//! Every term has a positive weight, so the score grows strictly with each
//! attribute and is positive as soon as one attribute is.

use crate::catalog::Attributes;

/// Repetitions that double a lift in the Epley one-rep-max estimate.
pub const EPLEY_REPETITIONS: f64 = 30.0;

pub const SETS_WEIGHT: f64 = 2.0;
pub const REPETITIONS_WEIGHT: f64 = 1.0;
pub const RPE_WEIGHT: f64 = 5.0;

pub const ENERGY_WEIGHT: f64 = 0.1;
pub const PROTEIN_WEIGHT: f64 = 4.0;
pub const CARBOHYDRATES_WEIGHT: f64 = 4.0;
pub const FAT_WEIGHT: f64 = 9.0;
pub const FIBER_WEIGHT: f64 = 2.0;

pub fn score(attributes: &Attributes) -> f64 {
    let raw = match *attributes {
        Attributes::Exercise {
            weight,
            sets,
            repetitions,
            rpe,
        } => {
            let repetitions = f64::from(repetitions);
            let one_rep_max = weight * (1.0 + repetitions / EPLEY_REPETITIONS);
            one_rep_max
                + SETS_WEIGHT * f64::from(sets)
                + REPETITIONS_WEIGHT * repetitions
                + RPE_WEIGHT * rpe
        }
        Attributes::Ingredient {
            energy,
            protein,
            carbohydrates,
            fat,
            fiber,
        } => {
            ENERGY_WEIGHT * energy
                + PROTEIN_WEIGHT * protein
                + CARBOHYDRATES_WEIGHT * carbohydrates
                + FAT_WEIGHT * fat
                + FIBER_WEIGHT * fiber
        }
    };
    // f64::max drops NaN, so unvalidated input still lands on 0
    raw.max(0.0)
}
