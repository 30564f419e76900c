//! Lower-impact swap recommendations.
//!
//! The catalog decides what counts as a better product (first alternative
//! wins); this crate only measures the difference and decides when a product is
//! worth flagging.

pub mod alert;
pub mod evaluator;
pub mod optimize;
pub mod savings;

pub use alert::{AlertPolicy, EcoAlert, ImpactLevel};
pub use evaluator::{SwapRecommendation, evaluate_swap, recommend_for};
pub use optimize::{CartOptimization, PerformedSwap, optimize_cart, optimize_cart_in};
pub use savings::{SwapSavings, TREE_ABSORPTION_KG_PER_DAY, calculate_swap_savings};
