//! Whole-cart optimization: swap every high-impact line at once.

use serde::Serialize;

use ecosmart_cart::{Cart, CartItem, EcoMetrics};
use ecosmart_catalog::{CatalogProvider, Product};
use ecosmart_core::DomainResult;
use ecosmart_core::rounding::round_one_decimal;

use crate::alert::AlertPolicy;
use crate::evaluator::{SwapRecommendation, recommend_for};

/// One line replaced during optimization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformedSwap {
    pub quantity: u32,
    pub recommendation: SwapRecommendation,
}

/// Preview (or result) of optimizing a cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartOptimization {
    pub optimized: Cart,
    pub before: EcoMetrics,
    pub after: EcoMetrics,
    pub swaps: Vec<PerformedSwap>,
    /// Difference of the rounded totals, never negative.
    pub co2_reduction: f64,
}

impl CartOptimization {
    pub fn is_noop(&self) -> bool {
        self.swaps.is_empty()
    }
}

/// Replace each line that qualifies for a swap prompt with its best alternative.
///
/// The input cart is left untouched; quantities carry over to the alternative.
pub fn optimize_cart(cart: &Cart, policy: &AlertPolicy, co2e_goal: f64) -> DomainResult<CartOptimization> {
    optimize_with(cart, policy, co2e_goal, Product::clone)
}

/// Like [`optimize_cart`], but each chosen alternative is re-read from `catalog`
/// so the optimized lines carry their own alternatives.
///
/// An alternative missing from the catalog is used as recommended.
pub fn optimize_cart_in(
    cart: &Cart,
    catalog: &dyn CatalogProvider,
    policy: &AlertPolicy,
    co2e_goal: f64,
) -> DomainResult<CartOptimization> {
    optimize_with(cart, policy, co2e_goal, |chosen| {
        catalog.get(chosen.id_typed()).unwrap_or_else(|| chosen.clone())
    })
}

fn optimize_with<F>(cart: &Cart, policy: &AlertPolicy, co2e_goal: f64, resolve: F) -> DomainResult<CartOptimization>
where
    F: Fn(&Product) -> Product,
{
    let before = cart.metrics(co2e_goal);

    // Targets are decided per original line: a product swapped in is never
    // swapped again, and lines that land on the same product are merged.
    let mut optimized = Cart::new();
    let mut swaps = Vec::new();
    for item in cart.items() {
        let recommendation = if policy.should_offer_swap(item.product()) {
            recommend_for(item.product())
        } else {
            None
        };

        let target = match recommendation {
            Some(recommendation) => {
                let target = resolve(&recommendation.chosen);
                swaps.push(PerformedSwap {
                    quantity: item.quantity(),
                    recommendation,
                });
                target
            }
            None => item.product().clone(),
        };
        optimized.merge_line(CartItem::with_quantity(target, item.quantity(), item.scanned_at())?);
    }

    let after = optimized.metrics(co2e_goal);
    let co2_reduction = round_one_decimal((before.total_co2e - after.total_co2e).max(0.0));

    tracing::debug!(swaps = swaps.len(), co2_reduction, "cart optimization computed");

    Ok(CartOptimization {
        optimized,
        before,
        after,
        swaps,
        co2_reduction,
    })
}
