//! Landing page and collection grid handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;

use tandem_core::Product;

use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

use super::products::{CardView, card_views};

/// Number of products featured on the landing page.
const FEATURED_COUNT: usize = 6;

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured: Vec<CardView>,
    pub total: usize,
}

/// Full catalog grid template.
#[derive(Template, WebTemplate)]
#[template(path = "collections.html")]
pub struct CollectionsTemplate {
    pub products: Vec<CardView>,
}

/// Landing page: hero plus a capped featured grid.
pub async fn index(State(state): State<AppState>) -> Result<HomeTemplate, AppError> {
    let products: Vec<Product> = state.catalog().active_products().await?;
    let total = products.len();

    Ok(HomeTemplate {
        featured: card_views(products.iter().take(FEATURED_COUNT)),
        total,
    })
}

/// Every active product, in display order.
pub async fn collections(State(state): State<AppState>) -> Result<CollectionsTemplate, AppError> {
    let products = state.catalog().active_products().await?;

    Ok(CollectionsTemplate {
        products: card_views(products.iter()),
    })
}
