use serde::{Deserialize, Serialize};

use ecosmart_core::{DomainError, DomainResult, Entity};

/// Product identifier.
///
/// Seed products use short ids ("1", "1a"); database rows use UUID text. Both
/// are opaque non-empty strings here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> DomainResult<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::invalid_id("ProductId: empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl core::str::FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Unvalidated product attributes, as they arrive from seed data or a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub id: String,
    pub barcode: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub image_url: String,
    /// Price in smallest currency unit (cents).
    pub price_cents: u64,
    /// kg CO₂-equivalent per unit.
    pub co2e: f64,
    /// Liters per unit.
    pub water_usage: f64,
    pub recyclability_percent: u8,
    pub is_eco_friendly: bool,
}

/// Immutable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    id: ProductId,
    barcode: String,
    name: String,
    brand: String,
    category: String,
    image_url: String,
    price_cents: u64,
    co2e: f64,
    water_usage: f64,
    recyclability_percent: u8,
    is_eco_friendly: bool,
    /// Better choices, best first. Ordering is the catalog's responsibility.
    alternatives: Vec<Product>,
}

impl Product {
    /// Validate a spec into a product with no alternatives.
    pub fn new(spec: ProductSpec) -> DomainResult<Self> {
        let id = ProductId::new(spec.id)?;

        if spec.name.trim().is_empty() {
            return Err(DomainError::validation(format!("product {id}: name cannot be empty")));
        }
        if !(spec.co2e.is_finite() && spec.co2e >= 0.0) {
            return Err(DomainError::validation(format!(
                "product {id}: co2e must be a finite non-negative number"
            )));
        }
        if !(spec.water_usage.is_finite() && spec.water_usage >= 0.0) {
            return Err(DomainError::validation(format!(
                "product {id}: water_usage must be a finite non-negative number"
            )));
        }
        if spec.recyclability_percent > 100 {
            return Err(DomainError::validation(format!(
                "product {id}: recyclability_percent must be within 0..=100"
            )));
        }

        Ok(Self {
            id,
            barcode: spec.barcode,
            name: spec.name,
            brand: spec.brand,
            category: spec.category,
            image_url: spec.image_url,
            price_cents: spec.price_cents,
            co2e: spec.co2e,
            water_usage: spec.water_usage,
            recyclability_percent: spec.recyclability_percent,
            is_eco_friendly: spec.is_eco_friendly,
            alternatives: Vec::new(),
        })
    }

    /// Attach the precomputed alternatives (best first).
    pub fn with_alternatives(mut self, alternatives: Vec<Product>) -> DomainResult<Self> {
        if alternatives.iter().any(|alt| alt.id == self.id) {
            return Err(DomainError::invariant(format!(
                "product {} lists itself as an alternative",
                self.id
            )));
        }
        self.alternatives = alternatives;
        Ok(self)
    }

    pub fn id_typed(&self) -> &ProductId {
        &self.id
    }

    pub fn barcode(&self) -> &str {
        &self.barcode
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn brand(&self) -> &str {
        &self.brand
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn price_cents(&self) -> u64 {
        self.price_cents
    }

    pub fn co2e(&self) -> f64 {
        self.co2e
    }

    pub fn water_usage(&self) -> f64 {
        self.water_usage
    }

    pub fn recyclability_percent(&self) -> u8 {
        self.recyclability_percent
    }

    pub fn is_eco_friendly(&self) -> bool {
        self.is_eco_friendly
    }

    pub fn alternatives(&self) -> &[Product] {
        &self.alternatives
    }

    pub fn has_alternatives(&self) -> bool {
        !self.alternatives.is_empty()
    }

    /// The alternative the catalog recommends, if any.
    pub fn best_alternative(&self) -> Option<&Product> {
        self.alternatives.first()
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
