use serde::Serialize;

use ecosmart_catalog::Product;
use ecosmart_core::rounding::round_to_i64;

use crate::savings::{SwapSavings, calculate_swap_savings};

/// The alternative to present for a product, with what switching saves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapRecommendation {
    pub original: Product,
    pub chosen: Product,
    pub savings: SwapSavings,
    /// Liters saved per unit. Not clamped: a thirstier alternative shows as negative.
    pub water_saved_liters: i64,
    /// Positive when the alternative costs more.
    pub price_delta_cents: i64,
}

/// Pick the first alternative and measure the swap.
///
/// No ranking happens here; `None` when there is nothing to offer.
pub fn evaluate_swap(original: &Product, alternatives: &[Product]) -> Option<SwapRecommendation> {
    let chosen = alternatives.first()?;
    let savings = calculate_swap_savings(original.co2e(), chosen.co2e());

    tracing::debug!(
        original = %original.id_typed(),
        chosen = %chosen.id_typed(),
        co2_saved = savings.co2_saved,
        "swap evaluated"
    );

    Some(SwapRecommendation {
        original: original.clone(),
        chosen: chosen.clone(),
        savings,
        water_saved_liters: round_to_i64(original.water_usage() - chosen.water_usage()),
        price_delta_cents: chosen.price_cents() as i64 - original.price_cents() as i64,
    })
}

/// Evaluate a product against its own catalog alternatives.
pub fn recommend_for(product: &Product) -> Option<SwapRecommendation> {
    evaluate_swap(product, product.alternatives())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecosmart_catalog::{CatalogProvider, ProductSpec, demo_catalog};

    fn product(id: &str, co2e: f64, water: f64, price_cents: u64) -> Product {
        Product::new(ProductSpec {
            id: id.to_string(),
            barcode: format!("bc-{id}"),
            name: format!("Product {id}"),
            brand: "Brand".to_string(),
            category: "Grocery".to_string(),
            image_url: String::new(),
            price_cents,
            co2e,
            water_usage: water,
            recyclability_percent: 50,
            is_eco_friendly: false,
        })
        .unwrap()
    }

    #[test]
    fn no_alternatives_means_no_recommendation() {
        assert!(evaluate_swap(&product("1", 15.2, 10.0, 100), &[]).is_none());
    }

    #[test]
    fn first_alternative_wins_even_if_a_later_one_is_greener() {
        let original = product("1", 15.2, 1847.0, 498);
        let alternatives = vec![product("a", 1.5, 164.0, 598), product("b", 0.1, 1.0, 100)];

        let rec = evaluate_swap(&original, &alternatives).unwrap();
        assert_eq!(rec.chosen.id_typed().as_str(), "a");
        assert_eq!(rec.savings.co2_saved, 13.7);
        assert_eq!(rec.savings.percent_reduction, 90);
        assert_eq!(rec.savings.trees_equivalent, 685);
        assert_eq!(rec.water_saved_liters, 1683);
        assert_eq!(rec.price_delta_cents, 100);
    }

    #[test]
    fn water_delta_is_not_clamped() {
        let original = product("1", 2.0, 10.0, 100);
        let thirsty = product("a", 1.0, 40.0, 100);

        let rec = evaluate_swap(&original, &[thirsty]).unwrap();
        assert_eq!(rec.water_saved_liters, -30);
        assert_eq!(rec.savings.co2_saved, 1.0);
    }

    #[test]
    fn worse_alternative_still_recommended_with_zero_savings() {
        let rec = evaluate_swap(&product("1", 1.0, 1.0, 100), &[product("a", 2.0, 1.0, 100)]).unwrap();
        assert_eq!(rec.savings.co2_saved, 0.0);
        assert_eq!(rec.savings.percent_reduction, 0);
    }

    #[test]
    fn recommend_for_uses_catalog_alternatives() {
        let catalog = demo_catalog().unwrap();
        let milk = catalog.get_by_barcode("681131001234").unwrap();
        let rec = recommend_for(&milk).unwrap();
        assert_eq!(rec.chosen.name(), "Oat Dream Oat Milk");
        assert_eq!(rec.savings.co2_saved, 2.3);
    }
}
