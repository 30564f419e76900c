//! High-impact product detection.

use serde::{Deserialize, Serialize};

use ecosmart_cart::format_co2_comparison;
use ecosmart_catalog::Product;

pub const DEFAULT_HIGH_IMPACT_THRESHOLD_KG: f64 = 5.0;
pub const DEFAULT_SWAP_PROMPT_THRESHOLD_KG: f64 = 3.0;

/// Products above this footprint are shown as moderate (below it: low).
const MODERATE_IMPACT_KG: f64 = 2.0;

/// Thresholds deciding when a scanned product gets flagged.
///
/// The alert and the swap prompt are separate decisions: a product can be worth
/// offering a swap for without being alarming.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertPolicy {
    /// `co2e` strictly above this raises a high-impact alert.
    pub high_impact_threshold_kg: f64,
    /// `co2e` strictly above this (with alternatives available) offers a swap.
    pub swap_prompt_threshold_kg: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            high_impact_threshold_kg: DEFAULT_HIGH_IMPACT_THRESHOLD_KG,
            swap_prompt_threshold_kg: DEFAULT_SWAP_PROMPT_THRESHOLD_KG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Low,
    Moderate,
    High,
}

/// Alert payload for a high-impact scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EcoAlert {
    pub product_name: String,
    pub co2e: f64,
    pub comparison: String,
    pub alternatives_available: bool,
}

impl AlertPolicy {
    pub fn should_alert(&self, product: &Product) -> bool {
        product.co2e() > self.high_impact_threshold_kg
    }

    pub fn should_offer_swap(&self, product: &Product) -> bool {
        product.has_alternatives() && product.co2e() > self.swap_prompt_threshold_kg
    }

    pub fn impact_level(&self, product: &Product) -> ImpactLevel {
        if product.co2e() > self.high_impact_threshold_kg {
            ImpactLevel::High
        } else if product.co2e() > MODERATE_IMPACT_KG {
            ImpactLevel::Moderate
        } else {
            ImpactLevel::Low
        }
    }

    /// Build the alert for a product, if it warrants one.
    pub fn alert_for(&self, product: &Product) -> Option<EcoAlert> {
        if !self.should_alert(product) {
            return None;
        }
        Some(EcoAlert {
            product_name: product.name().to_string(),
            co2e: product.co2e(),
            comparison: format_co2_comparison(product.co2e()),
            alternatives_available: product.has_alternatives(),
        })
    }
}
