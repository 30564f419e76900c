use chrono::{DateTime, Utc};
use serde::Serialize;

use ecosmart_catalog::{Product, ProductId};
use ecosmart_core::{DomainError, DomainResult, Entity};

use crate::metrics::{EcoMetrics, compute_metrics_with_goal};

/// Cart line: a product plus how many of it are in the basket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    #[serde(flatten)]
    product: Product,
    quantity: u32,
    /// When the line was first scanned (informational only).
    scanned_at: DateTime<Utc>,
}

impl CartItem {
    /// Create a line with quantity 1.
    pub fn new(product: Product, scanned_at: DateTime<Utc>) -> Self {
        Self {
            product,
            quantity: 1,
            scanned_at,
        }
    }

    /// Create a line with an explicit quantity (must be positive).
    pub fn with_quantity(product: Product, quantity: u32, scanned_at: DateTime<Utc>) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("cart quantity must be positive"));
        }
        Ok(Self {
            product,
            quantity,
            scanned_at,
        })
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn product_id(&self) -> &ProductId {
        self.product.id_typed()
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }
}

impl Entity for CartItem {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        self.product.id_typed()
    }
}

/// Ordered collection of cart lines, in first-scan order.
///
/// Invariant: at most one line per product id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id() == product_id)
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.items.iter().position(|i| i.product_id() == product_id)
    }

    /// Add a scanned product: a new line, or +1 on the existing line.
    ///
    /// Returns the line's quantity after the scan.
    pub fn add_scanned(&mut self, product: Product, scanned_at: DateTime<Utc>) -> u32 {
        match self.position(product.id_typed()) {
            Some(idx) => {
                let line = &mut self.items[idx];
                line.quantity = line.quantity.saturating_add(1);
                line.quantity
            }
            None => {
                self.items.push(CartItem::new(product, scanned_at));
                1
            }
        }
    }

    /// Add a whole line, merging it into an existing line for the same product.
    ///
    /// The existing line keeps its product and scan time. Returns the line's
    /// quantity afterwards.
    pub fn merge_line(&mut self, item: CartItem) -> u32 {
        match self.position(item.product_id()) {
            Some(idx) => {
                let line = &mut self.items[idx];
                line.quantity = line.quantity.saturating_add(item.quantity);
                line.quantity
            }
            None => {
                let quantity = item.quantity;
                self.items.push(item);
                quantity
            }
        }
    }

    /// Remove a line entirely.
    pub fn remove(&mut self, product_id: &ProductId) -> Option<CartItem> {
        let idx = self.position(product_id)?;
        Some(self.items.remove(idx))
    }

    /// Swap a line for another product, keeping its quantity.
    ///
    /// If the replacement is already in the cart the two lines are merged, so
    /// the total quantity is unchanged either way.
    pub fn replace(&mut self, product_id: &ProductId, replacement: Product) -> DomainResult<&CartItem> {
        if replacement.id_typed() == product_id {
            return Err(DomainError::invariant("a product cannot replace itself"));
        }
        let idx = self
            .position(product_id)
            .ok_or_else(|| DomainError::not_found(format!("cart line {product_id}")))?;

        match self.position(replacement.id_typed()) {
            Some(existing) => {
                let moved = self.items.remove(idx).quantity;
                let existing = if existing > idx { existing - 1 } else { existing };
                let line = &mut self.items[existing];
                line.quantity = line.quantity.saturating_add(moved);
                Ok(&self.items[existing])
            }
            None => {
                self.items[idx].product = replacement;
                Ok(&self.items[idx])
            }
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of quantities across all lines.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Current summary against the given CO₂e goal.
    pub fn metrics(&self, co2e_goal: f64) -> EcoMetrics {
        compute_metrics_with_goal(&self.items, co2e_goal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecosmart_catalog::ProductSpec;

    fn product(id: &str, co2e: f64) -> Product {
        Product::new(ProductSpec {
            id: id.to_string(),
            barcode: format!("bc-{id}"),
            name: format!("Product {id}"),
            brand: "Brand".to_string(),
            category: "Grocery".to_string(),
            image_url: String::new(),
            price_cents: 100,
            co2e,
            water_usage: 1.0,
            recyclability_percent: 50,
            is_eco_friendly: false,
        })
        .unwrap()
    }

    fn pid(id: &str) -> ProductId {
        ProductId::new(id).unwrap()
    }

    #[test]
    fn rescanning_increments_quantity_instead_of_adding_a_line() {
        let mut cart = Cart::new();
        let t0 = Utc::now();

        assert_eq!(cart.add_scanned(product("1", 1.0), t0), 1);
        assert_eq!(cart.add_scanned(product("1", 1.0), Utc::now()), 2);

        assert_eq!(cart.len(), 1);
        let line = cart.get(&pid("1")).unwrap();
        assert_eq!(line.quantity(), 2);
        // The first scan time is kept.
        assert_eq!(line.scanned_at(), t0);
    }

    #[test]
    fn lines_keep_first_scan_order() {
        let mut cart = Cart::new();
        cart.add_scanned(product("b", 1.0), Utc::now());
        cart.add_scanned(product("a", 1.0), Utc::now());
        cart.add_scanned(product("b", 1.0), Utc::now());

        let ids: Vec<_> = cart.items().iter().map(|i| i.product_id().as_str().to_string()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn remove_drops_the_whole_line() {
        let mut cart = Cart::new();
        cart.add_scanned(product("1", 1.0), Utc::now());
        cart.add_scanned(product("1", 1.0), Utc::now());

        let removed = cart.remove(&pid("1")).unwrap();
        assert_eq!(removed.quantity(), 2);
        assert!(cart.is_empty());
        assert!(cart.remove(&pid("1")).is_none());
    }

    #[test]
    fn replace_keeps_quantity() {
        let mut cart = Cart::new();
        cart.add_scanned(product("1", 15.2), Utc::now());
        cart.add_scanned(product("1", 15.2), Utc::now());

        let line = cart.replace(&pid("1"), product("1a", 1.5)).unwrap();
        assert_eq!(line.product_id().as_str(), "1a");
        assert_eq!(line.quantity(), 2);
        assert!(cart.get(&pid("1")).is_none());
    }

    #[test]
    fn replace_merges_into_an_existing_line() {
        let mut cart = Cart::new();
        cart.add_scanned(product("1a", 1.5), Utc::now());
        cart.add_scanned(product("2", 0.3), Utc::now());
        cart.add_scanned(product("1", 15.2), Utc::now());
        cart.add_scanned(product("1", 15.2), Utc::now());

        let line = cart.replace(&pid("1"), product("1a", 1.5)).unwrap();
        assert_eq!(line.quantity(), 3);
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total_quantity(), 4);
    }

    #[test]
    fn replace_merge_handles_replacement_listed_after_original() {
        let mut cart = Cart::new();
        cart.add_scanned(product("1", 15.2), Utc::now());
        cart.add_scanned(product("2", 0.3), Utc::now());
        cart.add_scanned(product("1a", 1.5), Utc::now());

        let line = cart.replace(&pid("1"), product("1a", 1.5)).unwrap();
        assert_eq!(line.product_id().as_str(), "1a");
        assert_eq!(line.quantity(), 2);
    }

    #[test]
    fn merge_line_adds_quantity_to_the_existing_line() {
        let mut cart = Cart::new();
        let t0 = Utc::now();
        cart.add_scanned(product("1a", 1.5), t0);

        let merged = CartItem::with_quantity(product("1a", 1.5), 3, Utc::now()).unwrap();
        assert_eq!(cart.merge_line(merged), 4);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].scanned_at(), t0);

        let fresh = CartItem::with_quantity(product("2", 0.3), 2, Utc::now()).unwrap();
        assert_eq!(cart.merge_line(fresh), 2);
        assert_eq!(cart.total_quantity(), 6);
    }

    #[test]
    fn replace_missing_line_is_not_found() {
        let mut cart = Cart::new();
        let err = cart.replace(&pid("1"), product("1a", 1.5)).unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn zero_quantity_lines_are_rejected() {
        let err = CartItem::with_quantity(product("1", 1.0), 0, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn cart_item_serializes_product_fields_inline() {
        let item = CartItem::new(product("1", 1.0), Utc::now());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["quantity"], 1);
        assert!(json.get("scanned_at").is_some());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: any scan sequence leaves one line per distinct id and
            /// total quantity equal to the number of scans.
            #[test]
            fn scans_keep_lines_unique(ids in proptest::collection::vec(0u8..6, 0..60)) {
                let mut cart = Cart::new();
                let mut previous_total = 0;
                for id in &ids {
                    cart.add_scanned(product(&id.to_string(), 1.0), Utc::now());
                    let total = cart.total_quantity();
                    prop_assert!(total >= previous_total);
                    previous_total = total;
                }

                let mut distinct = ids.clone();
                distinct.sort();
                distinct.dedup();
                prop_assert_eq!(cart.len(), distinct.len());
                prop_assert_eq!(cart.total_quantity(), ids.len() as u64);
            }
        }
    }
}
