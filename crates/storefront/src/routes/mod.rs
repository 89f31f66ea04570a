//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Health check (in main)
//!
//! # Cart
//! GET  /cart                   - Self-healed cart snapshot
//! POST /cart                   - Cart action endpoint (JSON or form body)
//!
//! # Products
//! GET  /products/{handle}      - Product detail with buy-button state
//!
//! # Hampers
//! POST /hampers/{handle}/add   - Add a whole hamper to the cart
//! ```

pub mod cart;
pub mod hampers;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new().route("/", get(cart::show).post(cart::action))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new().route("/{handle}", get(products::show))
}

/// Create the hamper routes router.
pub fn hamper_routes() -> Router<AppState> {
    Router::new().route("/{handle}/add", post(hampers::add))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/products", product_routes())
        .nest("/hampers", hamper_routes())
}
