//! Cart-level environmental summary.

use serde::{Deserialize, Serialize};

use ecosmart_core::ValueObject;
use ecosmart_core::rounding::{round_half_up, round_one_decimal};

use crate::cart::CartItem;

/// Target basket footprint in kg CO₂e.
pub const DEFAULT_CO2E_GOAL_KG: f64 = 15.0;

/// Miles driven in a gas car per kg CO₂e.
const MILES_PER_KG_CO2E: f64 = 3.0;

/// Where a basket sits relative to its CO₂e goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    /// At most 80% of the goal.
    OnTrack,
    /// Above 80% but not above the goal.
    NearGoal,
    /// Over the goal.
    OverGoal,
}

/// Aggregate environmental metrics of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EcoMetrics {
    /// kg CO₂e, one decimal.
    pub total_co2e: f64,
    pub co2e_goal: f64,
    /// Liters, nearest integer.
    pub water_usage: u64,
    /// Mean recyclability over distinct lines (not quantity-weighted).
    pub recyclability_average: u32,
    pub eco_friendly_count: usize,
    pub total_items: u64,
}

impl ValueObject for EcoMetrics {}

impl EcoMetrics {
    /// Metrics of an empty cart.
    pub fn empty(co2e_goal: f64) -> Self {
        Self {
            total_co2e: 0.0,
            co2e_goal,
            water_usage: 0,
            recyclability_average: 0,
            eco_friendly_count: 0,
            total_items: 0,
        }
    }

    pub fn goal_status(&self) -> GoalStatus {
        if self.co2e_goal <= 0.0 {
            return if self.total_co2e > 0.0 {
                GoalStatus::OverGoal
            } else {
                GoalStatus::OnTrack
            };
        }
        let percentage = self.total_co2e / self.co2e_goal * 100.0;
        if percentage <= 80.0 {
            GoalStatus::OnTrack
        } else if percentage <= 100.0 {
            GoalStatus::NearGoal
        } else {
            GoalStatus::OverGoal
        }
    }
}

/// Summarize a cart against the default goal.
pub fn compute_metrics(items: &[CartItem]) -> EcoMetrics {
    compute_metrics_with_goal(items, DEFAULT_CO2E_GOAL_KG)
}

/// Summarize a cart in a single pass.
///
/// Sums are kept at full precision; rounding happens once on the way out.
pub fn compute_metrics_with_goal(items: &[CartItem], co2e_goal: f64) -> EcoMetrics {
    if items.is_empty() {
        return EcoMetrics::empty(co2e_goal);
    }

    let mut co2e = 0.0_f64;
    let mut water = 0.0_f64;
    let mut recyclability = 0.0_f64;
    let mut eco_friendly_count = 0usize;
    let mut total_items = 0u64;

    for item in items {
        let product = item.product();
        let quantity = f64::from(item.quantity());

        co2e += product.co2e() * quantity;
        water += product.water_usage() * quantity;
        recyclability += f64::from(product.recyclability_percent());
        if product.is_eco_friendly() {
            eco_friendly_count += 1;
        }
        total_items += u64::from(item.quantity());
    }

    EcoMetrics {
        total_co2e: round_one_decimal(co2e),
        co2e_goal,
        water_usage: round_half_up(water) as u64,
        recyclability_average: round_half_up(recyclability / items.len() as f64) as u32,
        eco_friendly_count,
        total_items,
    }
}

pub fn driving_miles_equivalent(co2e: f64) -> f64 {
    co2e * MILES_PER_KG_CO2E
}

/// "13.5 miles driven in a gas car"
pub fn format_co2_comparison(co2e: f64) -> String {
    format!("{:.1} miles driven in a gas car", driving_miles_equivalent(co2e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ecosmart_catalog::{Product, ProductSpec};

    fn item(id: &str, co2e: f64, water: f64, recyclability: u8, eco: bool, quantity: u32) -> CartItem {
        let product = Product::new(ProductSpec {
            id: id.to_string(),
            barcode: format!("bc-{id}"),
            name: format!("Product {id}"),
            brand: "Brand".to_string(),
            category: "Grocery".to_string(),
            image_url: String::new(),
            price_cents: 100,
            co2e,
            water_usage: water,
            recyclability_percent: recyclability,
            is_eco_friendly: eco,
        })
        .unwrap();
        CartItem::with_quantity(product, quantity, Utc::now()).unwrap()
    }

    #[test]
    fn empty_cart_yields_zeroed_metrics() {
        let metrics = compute_metrics(&[]);
        assert_eq!(metrics, EcoMetrics::empty(DEFAULT_CO2E_GOAL_KG));
        assert_eq!(metrics.co2e_goal, 15.0);
        assert_eq!(metrics.recyclability_average, 0);
    }

    #[test]
    fn co2e_is_quantity_weighted_and_rounded_once() {
        let cart = vec![
            item("1", 15.2, 1847.0, 20, false, 1),
            item("2", 0.3, 12.0, 90, true, 2),
        ];
        let metrics = compute_metrics(&cart);

        assert_eq!(metrics.total_co2e, 15.8);
        assert_eq!(metrics.water_usage, 1871);
        assert_eq!(metrics.total_items, 3);
        assert_eq!(metrics.eco_friendly_count, 1);
    }

    #[test]
    fn recyclability_average_counts_distinct_lines() {
        let cart = vec![item("1", 1.0, 1.0, 20, false, 5), item("2", 1.0, 1.0, 90, false, 1)];
        // (20 + 90) / 2 lines, not weighted by the 6 units.
        assert_eq!(compute_metrics(&cart).recyclability_average, 55);
    }

    #[test]
    fn recyclability_average_ignores_quantity() {
        let one = compute_metrics(&[item("1", 1.0, 1.0, 80, false, 1)]);
        let ten = compute_metrics(&[item("1", 1.0, 1.0, 80, false, 10)]);
        assert_eq!(one.recyclability_average, 80);
        assert_eq!(ten.recyclability_average, 80);
    }

    #[test]
    fn eco_friendly_count_is_per_line() {
        let cart = vec![item("1", 0.1, 1.0, 100, true, 4)];
        assert_eq!(compute_metrics(&cart).eco_friendly_count, 1);
    }

    #[test]
    fn goal_status_thresholds() {
        let mut metrics = EcoMetrics::empty(15.0);
        metrics.total_co2e = 12.0;
        assert_eq!(metrics.goal_status(), GoalStatus::OnTrack);
        metrics.total_co2e = 15.0;
        assert_eq!(metrics.goal_status(), GoalStatus::NearGoal);
        metrics.total_co2e = 15.1;
        assert_eq!(metrics.goal_status(), GoalStatus::OverGoal);
    }

    #[test]
    fn zero_goal_is_only_met_by_an_empty_footprint() {
        let mut metrics = EcoMetrics::empty(0.0);
        assert_eq!(metrics.goal_status(), GoalStatus::OnTrack);
        metrics.total_co2e = 0.1;
        assert_eq!(metrics.goal_status(), GoalStatus::OverGoal);
    }

    #[test]
    fn co2_comparison_is_in_driving_miles() {
        assert_eq!(format_co2_comparison(4.5), "13.5 miles driven in a gas car");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_cart() -> impl Strategy<Value = Vec<CartItem>> {
            proptest::collection::vec(
                (0.0f64..50.0, 0.0f64..2000.0, 0u8..=100, any::<bool>(), 1u32..20),
                0..12,
            )
            .prop_map(|lines| {
                lines
                    .into_iter()
                    .enumerate()
                    .map(|(i, (co2e, water, r, eco, q))| item(&i.to_string(), co2e, water, r, eco, q))
                    .collect()
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: compute_metrics is pure (same cart = same summary).
            #[test]
            fn compute_metrics_is_idempotent(cart in arb_cart()) {
                prop_assert_eq!(compute_metrics(&cart), compute_metrics(&cart));
            }

            /// Property: total_items is the sum of quantities.
            #[test]
            fn total_items_is_sum_of_quantities(cart in arb_cart()) {
                let expected: u64 = cart.iter().map(|i| u64::from(i.quantity())).sum();
                prop_assert_eq!(compute_metrics(&cart).total_items, expected);
            }

            /// Property: the recyclability average stays within 0..=100.
            #[test]
            fn recyclability_average_is_a_percentage(cart in arb_cart()) {
                prop_assert!(compute_metrics(&cart).recyclability_average <= 100);
            }
        }
    }
}
