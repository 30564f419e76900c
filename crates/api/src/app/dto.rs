use serde::{Deserialize, Serialize};

use ecosmart_catalog::{Product, ProductId};
use ecosmart_rewards::Rarity;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub barcode: String,
}

#[derive(Debug, Deserialize)]
pub struct AwardBadgeRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub rarity: Rarity,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub items: Vec<Product>,
}

impl ProductList {
    pub fn new(items: Vec<Product>) -> Self {
        Self { items }
    }
}

// -------------------------
// Path parsing
// -------------------------

pub fn parse_product_id(raw: &str) -> Result<ProductId, axum::response::Response> {
    raw.parse::<ProductId>().map_err(errors::domain_error_to_response)
}
