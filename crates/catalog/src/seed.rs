//! Demo catalog used when no database is configured.

use ecosmart_core::DomainResult;

use crate::catalog::InMemoryCatalog;
use crate::product::{Product, ProductSpec};

const IMG: &str = "https://images.pexels.com/photos";

#[allow(clippy::too_many_arguments)]
fn spec(
    id: &str,
    barcode: &str,
    name: &str,
    brand: &str,
    category: &str,
    image: &str,
    price_cents: u64,
    co2e: f64,
    water_usage: f64,
    recyclability_percent: u8,
    is_eco_friendly: bool,
) -> ProductSpec {
    ProductSpec {
        id: id.to_string(),
        barcode: barcode.to_string(),
        name: name.to_string(),
        brand: brand.to_string(),
        category: category.to_string(),
        image_url: format!("{IMG}/{image}?auto=compress&cs=tinysrgb&w=150&h=150&dpr=2"),
        price_cents,
        co2e,
        water_usage,
        recyclability_percent,
        is_eco_friendly,
    }
}

fn with_alternative(original: ProductSpec, alternative: ProductSpec) -> DomainResult<Product> {
    Product::new(original)?.with_alternatives(vec![Product::new(alternative)?])
}

/// The grocery products shown in the scanner demo, with their swaps.
pub fn demo_products() -> DomainResult<Vec<Product>> {
    Ok(vec![
        with_alternative(
            spec("1", "123456789012", "Great Value Ground Beef", "Great Value", "Meat & Seafood",
                "361184/asparagus-steak-veal-steak-veal-361184.jpeg", 498, 15.2, 1847.0, 20, false),
            spec("1a", "123456789013", "Beyond Beef Plant-Based Ground", "Beyond Meat", "Plant-Based",
                "1640777/pexels-photo-1640777.jpeg", 598, 1.5, 164.0, 85, true),
        )?,
        Product::new(spec("2", "123456789014", "Great Value Organic Spinach", "Great Value", "Fresh Produce",
            "2255935/pexels-photo-2255935.jpeg", 248, 0.3, 12.0, 90, true))?,
        with_alternative(
            spec("3", "123456789015", "Coca-Cola Classic 12-Pack", "Coca-Cola", "Beverages",
                "50593/coca-cola-cold-drink-soft-drink-coke-50593.jpeg", 648, 4.2, 185.0, 75, false),
            spec("3a", "123456789016", "BUBLY Sparkling Water 12-Pack", "bubly", "Beverages",
                "416528/pexels-photo-416528.jpeg", 498, 0.8, 45.0, 95, true),
        )?,
        with_alternative(
            spec("4", "037000127512", "Tide Laundry Detergent", "Tide", "Household",
                "4239146/pexels-photo-4239146.jpeg", 1297, 2.8, 95.0, 60, false),
            spec("4a", "732913441235", "Seventh Generation Free & Clear", "Seventh Generation", "Household",
                "4239146/pexels-photo-4239146.jpeg", 1197, 1.2, 35.0, 95, true),
        )?,
        Product::new(spec("5", "4011", "Bananas Organic", "Fresh", "Fresh Produce",
            "2872755/pexels-photo-2872755.jpeg", 198, 0.1, 8.0, 100, true))?,
        with_alternative(
            spec("6", "681131771234", "Chicken Breast", "Great Value", "Meat & Seafood",
                "616354/pexels-photo-616354.jpeg", 898, 6.9, 542.0, 25, false),
            spec("6a", "842234400123", "Gardein Plant-Based Chicken", "Gardein", "Plant-Based",
                "1640777/pexels-photo-1640777.jpeg", 498, 1.8, 89.0, 80, true),
        )?,
        with_alternative(
            spec("7", "681131001234", "Great Value Milk 1 Gallon", "Great Value", "Dairy",
                "236010/pexels-photo-236010.jpeg", 348, 3.2, 628.0, 85, false),
            spec("7a", "681131001235", "Oat Dream Oat Milk", "Oat Dream", "Plant-Based",
                "6544373/pexels-photo-6544373.jpeg", 448, 0.9, 48.0, 90, true),
        )?,
        Product::new(spec("8", "884912345678", "Wonder Bread White", "Wonder", "Bakery",
            "209206/pexels-photo-209206.jpeg", 298, 1.1, 45.0, 70, false))?,
    ])
}

/// Demo products indexed into an in-memory catalog.
pub fn demo_catalog() -> DomainResult<InMemoryCatalog> {
    InMemoryCatalog::from_products(demo_products()?)
}
