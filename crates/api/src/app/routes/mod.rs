use axum::{routing::get, Router};

pub mod cart;
pub mod history;
pub mod products;
pub mod rewards;
pub mod system;

/// Router for the shopping-session endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/products", products::router())
        .nest("/cart", cart::router())
        .nest("/rewards", rewards::router())
        .nest("/history", history::router())
}
