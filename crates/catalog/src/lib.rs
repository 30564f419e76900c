//! Product catalog domain module.
//!
//! Products are immutable for the lifetime of a session: they are created once
//! (seed data or a one-time database load) and only ever read afterwards.

pub mod catalog;
pub mod product;
pub mod seed;

pub use catalog::{CatalogProvider, InMemoryCatalog, SEARCH_RESULT_LIMIT};
pub use product::{Product, ProductId, ProductSpec};
pub use seed::{demo_catalog, demo_products};
