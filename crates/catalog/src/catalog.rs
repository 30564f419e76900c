use std::collections::HashMap;
use std::sync::Arc;

use ecosmart_core::{DomainError, DomainResult};

use crate::product::{Product, ProductId};

/// Maximum number of products returned by a catalog search.
pub const SEARCH_RESULT_LIMIT: usize = 10;

/// Read-only product lookup.
///
/// Whether products come from a static seed or a database snapshot is
/// irrelevant to callers. A barcode miss is an explicit `None`; there is no
/// fallback to some other product.
pub trait CatalogProvider: Send + Sync {
    fn get(&self, id: &ProductId) -> Option<Product>;

    /// First product registered with this barcode (barcodes are not unique).
    fn get_by_barcode(&self, barcode: &str) -> Option<Product>;

    /// Every product, ordered by name.
    fn list_all(&self) -> Vec<Product>;

    /// Case-insensitive substring match on name or brand.
    fn search(&self, query: &str) -> Vec<Product> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.list_all()
            .into_iter()
            .filter(|p| {
                p.name().to_lowercase().contains(&needle) || p.brand().to_lowercase().contains(&needle)
            })
            .take(SEARCH_RESULT_LIMIT)
            .collect()
    }

    /// Precomputed alternatives of a product, best first.
    fn alternatives_for(&self, id: &ProductId) -> Vec<Product> {
        self.get(id).map(|p| p.alternatives().to_vec()).unwrap_or_default()
    }
}

impl<C> CatalogProvider for Arc<C>
where
    C: CatalogProvider + ?Sized,
{
    fn get(&self, id: &ProductId) -> Option<Product> {
        (**self).get(id)
    }

    fn get_by_barcode(&self, barcode: &str) -> Option<Product> {
        (**self).get_by_barcode(barcode)
    }

    fn list_all(&self) -> Vec<Product> {
        (**self).list_all()
    }

    fn search(&self, query: &str) -> Vec<Product> {
        (**self).search(query)
    }

    fn alternatives_for(&self, id: &ProductId) -> Vec<Product> {
        (**self).alternatives_for(id)
    }
}

/// Immutable in-memory catalog.
///
/// Alternatives nested under a product are indexed too, so scanning the barcode
/// of a recommended alternative resolves to it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Vec<Product>,
    by_id: HashMap<ProductId, usize>,
    by_barcode: HashMap<String, usize>,
}

impl InMemoryCatalog {
    /// Build a catalog from top-level products.
    ///
    /// Two top-level products sharing an id is an error. A nested alternative
    /// whose id is already known is not indexed a second time.
    pub fn from_products(products: Vec<Product>) -> DomainResult<Self> {
        let mut catalog = Self::default();

        for product in &products {
            if catalog.by_id.contains_key(product.id_typed()) {
                return Err(DomainError::validation(format!(
                    "duplicate product id in catalog: {}",
                    product.id_typed()
                )));
            }
            catalog.insert(product.clone());
        }

        for product in &products {
            for alternative in product.alternatives() {
                if !catalog.by_id.contains_key(alternative.id_typed()) {
                    catalog.insert(alternative.clone());
                }
            }
        }

        tracing::debug!(products = catalog.products.len(), "catalog indexed");
        Ok(catalog)
    }

    fn insert(&mut self, product: Product) {
        let idx = self.products.len();
        self.by_id.insert(product.id_typed().clone(), idx);
        self.by_barcode.entry(product.barcode().to_string()).or_insert(idx);
        self.products.push(product);
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl CatalogProvider for InMemoryCatalog {
    fn get(&self, id: &ProductId) -> Option<Product> {
        self.by_id.get(id).map(|&i| self.products[i].clone())
    }

    fn get_by_barcode(&self, barcode: &str) -> Option<Product> {
        self.by_barcode.get(barcode.trim()).map(|&i| self.products[i].clone())
    }

    fn list_all(&self) -> Vec<Product> {
        let mut all = self.products.clone();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::tests::spec;

    fn product(id: &str, co2e: f64) -> Product {
        Product::new(spec(id, co2e)).unwrap()
    }

    #[test]
    fn barcode_lookup_miss_is_none() {
        let catalog = InMemoryCatalog::from_products(vec![product("1", 1.0)]).unwrap();
        assert!(catalog.get_by_barcode("does-not-exist").is_none());
    }

    #[test]
    fn duplicate_barcode_resolves_to_first_registered() {
        let mut second = spec("2", 2.0);
        second.barcode = "0001".to_string();
        let catalog =
            InMemoryCatalog::from_products(vec![product("1", 1.0), Product::new(second).unwrap()]).unwrap();

        assert_eq!(catalog.get_by_barcode("0001").unwrap().id_typed().as_str(), "1");
    }

    #[test]
    fn duplicate_top_level_ids_are_rejected() {
        let err = InMemoryCatalog::from_products(vec![product("1", 1.0), product("1", 2.0)]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn nested_alternatives_are_indexed() {
        let beef = product("1", 15.2).with_alternatives(vec![product("1a", 1.5)]).unwrap();
        let catalog = InMemoryCatalog::from_products(vec![beef]).unwrap();

        assert_eq!(catalog.len(), 2);
        let alt = catalog.get_by_barcode("0001a").unwrap();
        assert_eq!(alt.id_typed().as_str(), "1a");

        let alternatives = catalog.alternatives_for(&ProductId::new("1").unwrap());
        assert_eq!(alternatives.len(), 1);
        assert!(catalog.alternatives_for(&ProductId::new("missing").unwrap()).is_empty());
    }

    #[test]
    fn list_all_is_ordered_by_name() {
        let mut z = spec("1", 1.0);
        z.name = "Zucchini".to_string();
        let mut a = spec("2", 1.0);
        a.name = "Apples".to_string();
        let catalog =
            InMemoryCatalog::from_products(vec![Product::new(z).unwrap(), Product::new(a).unwrap()]).unwrap();

        let names: Vec<_> = catalog.list_all().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["Apples", "Zucchini"]);
    }

    #[test]
    fn search_matches_name_or_brand_case_insensitively() {
        let mut s = spec("1", 1.0);
        s.name = "Oat Milk".to_string();
        s.brand = "Oat Dream".to_string();
        let mut t = spec("2", 1.0);
        t.name = "Detergent".to_string();
        t.brand = "Tide".to_string();
        let catalog =
            InMemoryCatalog::from_products(vec![Product::new(s).unwrap(), Product::new(t).unwrap()]).unwrap();

        assert_eq!(catalog.search("oat").len(), 1);
        assert_eq!(catalog.search("TIDE").len(), 1);
        assert!(catalog.search("   ").is_empty());
    }

    #[test]
    fn search_is_capped() {
        let products = (0..25).map(|i| product(&i.to_string(), 1.0)).collect();
        let catalog = InMemoryCatalog::from_products(products).unwrap();
        assert_eq!(catalog.search("product").len(), SEARCH_RESULT_LIMIT);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: search is capped and every hit matches the query.
            #[test]
            fn search_results_are_capped_and_match(
                names in proptest::collection::vec("[a-c]{1,6}", 0..40),
                query in "[a-cA-C]{1,2}",
            ) {
                let products = names
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        let mut s = spec(&i.to_string(), 1.0);
                        s.name = name.clone();
                        s.brand = "Xyz".to_string();
                        Product::new(s).unwrap()
                    })
                    .collect();
                let catalog = InMemoryCatalog::from_products(products).unwrap();

                let hits = catalog.search(&query);
                let needle = query.to_lowercase();
                let expected = names.iter().filter(|n| n.contains(&needle)).count();

                prop_assert!(hits.len() <= SEARCH_RESULT_LIMIT);
                prop_assert_eq!(hits.len(), expected.min(SEARCH_RESULT_LIMIT));
                prop_assert!(hits.iter().all(|p| p.name().contains(&needle)));
            }

            /// Property: a shared barcode always resolves to the first product registered with it.
            #[test]
            fn shared_barcode_resolves_to_first_registered(
                barcodes in proptest::collection::vec(0u8..4, 1..20),
            ) {
                let products = barcodes
                    .iter()
                    .enumerate()
                    .map(|(i, code)| {
                        let mut s = spec(&i.to_string(), 1.0);
                        s.barcode = format!("bc-{code}");
                        Product::new(s).unwrap()
                    })
                    .collect();
                let catalog = InMemoryCatalog::from_products(products).unwrap();

                for code in &barcodes {
                    let first = barcodes.iter().position(|c| c == code).unwrap();
                    let hit = catalog.get_by_barcode(&format!("bc-{code}")).unwrap();
                    prop_assert_eq!(hit.id_typed().as_str(), first.to_string());
                }
            }
        }
    }
}
