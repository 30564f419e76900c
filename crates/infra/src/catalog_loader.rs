//! One-shot load of the product catalog from Postgres.
//!
//! Reads `products` and `product_alternatives` once at startup and indexes them
//! into an `InMemoryCatalog`; lookups never touch the database afterwards.

use std::collections::HashMap;

use sqlx::{PgPool, Row};
use tracing::{info, warn};

use ecosmart_catalog::{InMemoryCatalog, Product, ProductSpec};
use ecosmart_core::rounding::round_to_i64;

use crate::scan_history::StoreError;
use crate::scan_history::postgres::map_sqlx_error;

/// A `product_alternatives` row: `original` can be swapped for `alternative`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternativeLink {
    pub original_product_id: String,
    pub alternative_product_id: String,
}

pub async fn load_catalog(pool: &PgPool) -> Result<InMemoryCatalog, StoreError> {
    let rows = sqlx::query(
        r#"
        SELECT
            id::text AS id,
            barcode,
            name,
            brand,
            category,
            image_url,
            price::float8 AS price,
            co2e::float8 AS co2e,
            water_usage::float8 AS water_usage,
            recyclability_percent::int4 AS recyclability_percent,
            is_eco_friendly
        FROM products
        ORDER BY name
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| map_sqlx_error("load_products", e))?;

    let specs = rows
        .iter()
        .map(spec_from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let links = sqlx::query(
        r#"
        SELECT
            original_product_id::text AS original_product_id,
            alternative_product_id::text AS alternative_product_id
        FROM product_alternatives
        ORDER BY created_at, id
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(|e| map_sqlx_error("load_product_alternatives", e))?
    .iter()
    .map(|row| -> Result<AlternativeLink, sqlx::Error> {
        Ok(AlternativeLink {
            original_product_id: row.try_get("original_product_id")?,
            alternative_product_id: row.try_get("alternative_product_id")?,
        })
    })
    .collect::<Result<Vec<_>, _>>()
    .map_err(|e| map_sqlx_error("load_product_alternatives", e))?;

    let catalog = assemble(specs, &links)?;
    info!(products = catalog.len(), alternatives = links.len(), "catalog loaded from postgres");
    Ok(catalog)
}

fn spec_from_row(row: &sqlx::postgres::PgRow) -> Result<ProductSpec, StoreError> {
    let decode = |e| map_sqlx_error("load_products", e);

    let id: String = row.try_get("id").map_err(decode)?;
    let price: f64 = row.try_get("price").map_err(decode)?;
    let recyclability: i32 = row.try_get("recyclability_percent").map_err(decode)?;

    let price_cents = u64::try_from(round_to_i64(price * 100.0))
        .map_err(|_| StoreError::Corrupt(format!("product {id}: negative price {price}")))?;
    let recyclability_percent = u8::try_from(recyclability)
        .map_err(|_| StoreError::Corrupt(format!("product {id}: recyclability {recyclability} out of range")))?;

    Ok(ProductSpec {
        barcode: row.try_get("barcode").map_err(decode)?,
        name: row.try_get("name").map_err(decode)?,
        brand: row.try_get("brand").map_err(decode)?,
        category: row.try_get("category").map_err(decode)?,
        image_url: row.try_get::<Option<String>, _>("image_url").map_err(decode)?.unwrap_or_default(),
        price_cents,
        co2e: row.try_get("co2e").map_err(decode)?,
        water_usage: row.try_get("water_usage").map_err(decode)?,
        recyclability_percent,
        is_eco_friendly: row.try_get("is_eco_friendly").map_err(decode)?,
        id,
    })
}

/// Attach alternatives (in link order) and index everything.
///
/// Links to unknown products, or from a product to itself, are skipped.
pub fn assemble(specs: Vec<ProductSpec>, links: &[AlternativeLink]) -> Result<InMemoryCatalog, StoreError> {
    let corrupt = |e: ecosmart_core::DomainError| StoreError::Corrupt(e.to_string());

    let products = specs
        .into_iter()
        .map(Product::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(corrupt)?;
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id_typed().as_str(), p)).collect();

    let mut alternatives: HashMap<&str, Vec<Product>> = HashMap::new();
    for link in links {
        let original = link.original_product_id.as_str();
        let alternative = link.alternative_product_id.as_str();
        if original == alternative {
            warn!(product_id = original, "skipping self-referencing alternative");
            continue;
        }
        match (by_id.contains_key(original), by_id.get(alternative)) {
            (true, Some(alt)) => alternatives.entry(original).or_default().push((*alt).clone()),
            _ => warn!(original, alternative, "skipping alternative link to unknown product"),
        }
    }

    let linked = products
        .iter()
        .map(|p| {
            let alts = alternatives.remove(p.id_typed().as_str()).unwrap_or_default();
            p.clone().with_alternatives(alts)
        })
        .collect::<Result<Vec<_>, _>>()
        .map_err(corrupt)?;

    InMemoryCatalog::from_products(linked).map_err(corrupt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecosmart_catalog::{CatalogProvider, ProductId};

    fn spec(id: &str, co2e: f64) -> ProductSpec {
        ProductSpec {
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
        }
    }

    fn link(original: &str, alternative: &str) -> AlternativeLink {
        AlternativeLink {
            original_product_id: original.to_string(),
            alternative_product_id: alternative.to_string(),
        }
    }

    #[test]
    fn alternatives_are_attached_in_link_order() {
        let catalog = assemble(
            vec![spec("beef", 15.2), spec("tofu", 2.0), spec("beyond", 1.5)],
            &[link("beef", "tofu"), link("beef", "beyond")],
        )
        .unwrap();

        let beef = catalog.get(&ProductId::new("beef").unwrap()).unwrap();
        let names: Vec<_> = beef.alternatives().iter().map(|p| p.id_typed().as_str().to_string()).collect();
        assert_eq!(names, vec!["tofu", "beyond"]);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn dangling_and_self_links_are_skipped() {
        let catalog = assemble(vec![spec("a", 4.0)], &[link("a", "a"), link("a", "ghost"), link("ghost", "a")]).unwrap();
        assert!(!catalog.get(&ProductId::new("a").unwrap()).unwrap().has_alternatives());
    }

    #[test]
    fn invalid_rows_are_reported_as_corrupt() {
        let mut bad = spec("a", 1.0);
        bad.co2e = -1.0;
        assert!(matches!(assemble(vec![bad], &[]), Err(StoreError::Corrupt(_))));
    }
}
