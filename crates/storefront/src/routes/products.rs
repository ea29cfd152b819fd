//! Product detail route with the gallery viewer.
//!
//! The viewer is strictly read-only: picking a thumbnail only changes which
//! image is currently shown (the `?image=` query parameter), never the
//! gallery itself. The initially shown image is whatever
//! `Gallery::display_asset` resolves - primary if flagged, first as the
//! defensive fallback, a title-keyed placeholder if the gallery is empty.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use tandem_core::{Product, ProductId};

use crate::error::AppError;
use crate::filters;
use crate::state::AppState;

/// Product card for listing grids.
#[derive(Debug, Clone)]
pub struct CardView {
    pub id: i32,
    pub title: String,
    pub category: String,
    pub price: String,
    pub for_him: Option<String>,
    pub for_her: Option<String>,
    pub cover_url: Option<String>,
    /// Placeholder letter when the gallery is empty.
    pub initial: String,
}

/// One thumbnail in the viewer strip.
#[derive(Debug, Clone)]
pub struct ThumbView {
    pub index: usize,
    pub url: String,
    pub selected: bool,
}

/// Full product detail for the viewer page.
#[derive(Debug, Clone)]
pub struct ProductDetailView {
    pub id: i32,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub materials: Option<String>,
    pub sizing: Option<String>,
    pub care_instructions: Option<String>,
    pub for_him: Option<String>,
    pub for_her: Option<String>,
    pub price: String,
    pub purchase_link: Option<String>,
    /// Currently shown image, `None` for an empty gallery.
    pub shown_url: Option<String>,
    pub thumbs: Vec<ThumbView>,
    /// Placeholder letter when the gallery is empty.
    pub initial: String,
}

/// Viewer query parameters.
#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    /// Selected thumbnail index; out-of-range values fall back to the
    /// display asset.
    pub image: Option<usize>,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
}

// =============================================================================
// Type Conversions
// =============================================================================

/// Format an optional price as whole-unit rupiah with dot separators.
fn format_price(price: Option<Decimal>) -> String {
    price.map_or_else(
        || "Segera hadir".to_string(),
        |amount| {
            let whole = amount.trunc().to_string();
            let digits: Vec<char> = whole.chars().collect();
            let mut grouped = String::new();
            for (i, c) in digits.iter().enumerate() {
                if i > 0 && (digits.len() - i) % 3 == 0 && c.is_ascii_digit() {
                    grouped.push('.');
                }
                grouped.push(*c);
            }
            format!("Rp {grouped}")
        },
    )
}

/// Uppercase first letter of a title, for empty-gallery placeholders.
fn title_initial(title: &str) -> String {
    title
        .trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "•".to_string())
}

/// Build listing cards; each card's image is the gallery's display asset.
pub fn card_views<'a>(products: impl Iterator<Item = &'a Product>) -> Vec<CardView> {
    products
        .map(|product| CardView {
            id: product.id.map_or(0, |id| id.as_i32()),
            title: product.title.clone(),
            category: product.category.label().to_string(),
            price: format_price(product.price),
            for_him: product.for_him.clone(),
            for_her: product.for_her.clone(),
            cover_url: product
                .gallery
                .display_asset()
                .map(|asset| asset.locator.as_str().to_string()),
            initial: title_initial(&product.title),
        })
        .collect()
}

/// Resolve the viewer state for a product and an optional selection.
fn detail_view(product: &Product, requested: Option<usize>) -> ProductDetailView {
    let assets = product.gallery.assets();

    // A selection only holds if it points at a real asset; anything else
    // falls back to the display asset so the page always has a cover.
    let selected = requested
        .filter(|&index| index < assets.len())
        .or_else(|| product.gallery.display_index());

    let shown_url = selected
        .and_then(|index| assets.get(index))
        .map(|asset| asset.locator.as_str().to_string());

    let thumbs = assets
        .iter()
        .enumerate()
        .map(|(index, asset)| ThumbView {
            index,
            url: asset.locator.as_str().to_string(),
            selected: Some(index) == selected,
        })
        .collect();

    ProductDetailView {
        id: product.id.map_or(0, |id| id.as_i32()),
        title: product.title.clone(),
        category: product.category.label().to_string(),
        description: product.description.clone(),
        materials: product.materials.clone(),
        sizing: product.sizing.clone(),
        care_instructions: product.care_instructions.clone(),
        for_him: product.for_him.clone(),
        for_her: product.for_her.clone(),
        price: format_price(product.price),
        purchase_link: product.purchase_link.clone(),
        shown_url,
        thumbs,
        initial: title_initial(&product.title),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Product detail page with the gallery viewer.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<ViewerQuery>,
) -> Result<ProductShowTemplate, AppError> {
    let id = ProductId::new(id);

    let product = state
        .catalog()
        .product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductShowTemplate {
        product: detail_view(&product, query.image),
    })
}
