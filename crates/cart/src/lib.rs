//! Shopping cart and its environmental summary.
//!
//! The cart is the only mutable state in the eco-impact model; `EcoMetrics` is
//! recomputed from it on every change and never stored.

pub mod cart;
pub mod metrics;

pub use cart::{Cart, CartItem};
pub use metrics::{
    DEFAULT_CO2E_GOAL_KG, EcoMetrics, GoalStatus, compute_metrics, compute_metrics_with_goal,
    driving_miles_equivalent, format_co2_comparison,
};
