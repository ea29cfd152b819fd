//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                               - Health check (in main)
//!
//! # Auth (shared access key -> capability cookie)
//! GET  /login                                - Login page
//! POST /login                                - Exchange access key for cookie
//! POST /logout                               - Clear the cookie
//!
//! # Products
//! GET  /products                             - Product listing
//! GET  /products/new                         - Blank product form
//! POST /products                             - Create product
//! GET  /products/{id}                        - Edit form with gallery editor
//! POST /products/{id}                        - Update attributes
//! POST /products/{id}/toggle                 - Flip storefront visibility
//! POST /products/{id}/delete                 - Delete product
//!
//! # Gallery editing (HTMX partials)
//! POST /products/{id}/gallery/upload         - Transcode + store + append
//! POST /products/{id}/gallery/{index}/primary - Mark cover image
//! POST /products/{id}/gallery/{index}/remove  - Remove asset
//! POST /products/{id}/gallery/move           - Reorder assets
//! POST /products/{id}/gallery/save           - Persist working gallery
//! POST /products/{id}/gallery/discard        - Reset to persisted gallery
//! ```

pub mod auth;
pub mod gallery;
pub mod products;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/products") }))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/products", get(products::index).post(products::create))
        .route("/products/new", get(products::new_form))
        .route("/products/{id}", get(products::edit_form).post(products::update))
        .route("/products/{id}/toggle", post(products::toggle_active))
        .route("/products/{id}/delete", post(products::delete))
        .route("/products/{id}/gallery/upload", post(gallery::upload))
        .route(
            "/products/{id}/gallery/{index}/primary",
            post(gallery::set_primary),
        )
        .route(
            "/products/{id}/gallery/{index}/remove",
            post(gallery::remove),
        )
        .route("/products/{id}/gallery/move", post(gallery::move_asset))
        .route("/products/{id}/gallery/save", post(gallery::save))
        .route("/products/{id}/gallery/discard", post(gallery::discard))
}
