use serde::{Deserialize, Serialize};

use ecosmart_core::ValueObject;
use ecosmart_core::rounding::{round_half_up, round_one_decimal};

/// CO₂ one tree absorbs per day (20 g), used for the "trees" comparison.
pub const TREE_ABSORPTION_KG_PER_DAY: f64 = 0.02;

/// Savings of switching from one product to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapSavings {
    /// kg CO₂e, one decimal, never negative.
    pub co2_saved: f64,
    /// Whole percent of the original footprint.
    pub percent_reduction: u32,
    pub trees_equivalent: u64,
}

impl ValueObject for SwapSavings {}

impl SwapSavings {
    pub fn none() -> Self {
        Self {
            co2_saved: 0.0,
            percent_reduction: 0,
            trees_equivalent: 0,
        }
    }
}

/// Compare two per-unit footprints.
///
/// A worse alternative saves zero rather than a negative amount. The percent
/// and tree figures are derived from the unrounded saving.
pub fn calculate_swap_savings(original_co2e: f64, alternative_co2e: f64) -> SwapSavings {
    let saved = (original_co2e - alternative_co2e).max(0.0);
    if !saved.is_finite() {
        return SwapSavings::none();
    }

    let percent_reduction = if original_co2e > 0.0 {
        round_half_up(saved / original_co2e * 100.0) as u32
    } else {
        0
    };

    SwapSavings {
        co2_saved: round_one_decimal(saved),
        percent_reduction,
        trees_equivalent: round_half_up(saved / TREE_ABSORPTION_KG_PER_DAY) as u64,
    }
}
