//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health             - Health check (in main)
//! GET  /                   - Landing page with featured collection
//! GET  /collections        - Full catalog grid
//! GET  /products/{id}      - Product detail with gallery viewer
//! ```

pub mod home;
pub mod products;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Build the storefront router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/collections", get(home::collections))
        .route("/products/{id}", get(products::show))
}
