//! Product CRUD route handlers.

use askama::Template;
use axum::{
    extract::{Path, State},
    response::{Html, Redirect},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use tandem_core::{Category, Product, ProductId};

use crate::{
    db::{ProductDraft, ProductRepository},
    error::AppError,
    filters,
    middleware::auth::RequireCatalogWrite,
    state::AppState,
};

use super::gallery::GalleryEditorView;

/// Product row for the admin listing.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: i32,
    pub title: String,
    pub category: String,
    pub description: Option<String>,
    pub for_him: Option<String>,
    pub for_her: Option<String>,
    pub price: String,
    pub is_active: bool,
    pub cover_url: Option<String>,
    pub image_count: usize,
}

// =============================================================================
// Type Conversions
// =============================================================================

/// Format an optional price the way the storefront shows it (whole-unit
/// rupiah with dot separators).
fn format_price(price: Option<Decimal>) -> String {
    price.map_or_else(
        || "—".to_string(),
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

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.map_or(0, |id| id.as_i32()),
            title: product.title.clone(),
            category: product.category.label().to_string(),
            description: product.description.clone(),
            for_him: product.for_him.clone(),
            for_her: product.for_her.clone(),
            price: format_price(product.price),
            is_active: product.is_active,
            cover_url: product
                .gallery
                .display_asset()
                .map(|asset| asset.locator.as_str().to_string()),
            image_count: product.gallery.len(),
        }
    }
}

/// Products list page template.
#[derive(Template)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
}

/// Product create/edit form template.
#[derive(Template)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    /// `None` when creating a new product.
    pub product: Option<FormValues>,
    pub categories: Vec<CategoryOption>,
    /// Gallery editor state; `None` until the product exists.
    pub gallery: Option<GalleryEditorView>,
}

/// One `<option>` in the category select.
#[derive(Debug, Clone)]
pub struct CategoryOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Current attribute values shown in the form.
#[derive(Debug, Clone)]
pub struct FormValues {
    pub id: i32,
    pub title: String,
    pub category: String,
    pub description: String,
    pub materials: String,
    pub sizing: String,
    pub care_instructions: String,
    pub for_him: String,
    pub for_her: String,
    pub price: String,
    pub purchase_link: String,
    pub is_active: bool,
}

impl From<&Product> for FormValues {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.map_or(0, |id| id.as_i32()),
            title: product.title.clone(),
            category: product.category.as_str().to_string(),
            description: product.description.clone().unwrap_or_default(),
            materials: product.materials.clone().unwrap_or_default(),
            sizing: product.sizing.clone().unwrap_or_default(),
            care_instructions: product.care_instructions.clone().unwrap_or_default(),
            for_him: product.for_him.clone().unwrap_or_default(),
            for_her: product.for_her.clone().unwrap_or_default(),
            price: product.price.map(|p| p.to_string()).unwrap_or_default(),
            purchase_link: product.purchase_link.clone().unwrap_or_default(),
            is_active: product.is_active,
        }
    }
}

/// Attribute form body for create and update.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub materials: String,
    #[serde(default)]
    pub sizing: String,
    #[serde(default)]
    pub care_instructions: String,
    #[serde(default)]
    pub for_him: String,
    #[serde(default)]
    pub for_her: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub purchase_link: String,
}

const MAX_TITLE_LEN: usize = 200;

impl ProductForm {
    /// Validate and convert the submitted form into a repository draft.
    fn into_draft(self) -> Result<ProductDraft, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::BadRequest("title is required".to_string()));
        }
        if title.len() > MAX_TITLE_LEN {
            return Err(AppError::BadRequest(format!(
                "title must be at most {MAX_TITLE_LEN} characters"
            )));
        }

        let category: Category = self
            .category
            .parse()
            .map_err(|e: String| AppError::BadRequest(e))?;

        let price = match self.price.trim() {
            "" => None,
            raw => Some(raw.parse::<Decimal>().map_err(|_| {
                AppError::BadRequest(format!("invalid price: {raw}"))
            })?),
        };

        Ok(ProductDraft {
            title,
            category,
            description: non_empty(self.description),
            materials: non_empty(self.materials),
            sizing: non_empty(self.sizing),
            care_instructions: non_empty(self.care_instructions),
            for_him: non_empty(self.for_him),
            for_her: non_empty(self.for_her),
            price,
            purchase_link: non_empty(self.purchase_link),
        })
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Products list page handler.
#[instrument(skip(state))]
pub async fn index(
    _: RequireCatalogWrite,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let products = ProductRepository::new(state.pool()).list().await?;

    let template = ProductsIndexTemplate {
        products: products.iter().map(ProductView::from).collect(),
    };

    Ok(render(&template))
}

/// Blank product form.
pub async fn new_form(_: RequireCatalogWrite) -> Html<String> {
    let template = ProductFormTemplate {
        product: None,
        categories: category_options(None),
        gallery: None,
    };
    render(&template)
}

/// Create a product with an empty gallery.
#[instrument(skip(state, form))]
pub async fn create(
    _: RequireCatalogWrite,
    State(state): State<AppState>,
    axum::Form(form): axum::Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let draft = form.into_draft()?;
    let product = ProductRepository::new(state.pool()).insert(&draft).await?;

    let id = product
        .id
        .ok_or_else(|| AppError::Internal("insert returned product without id".to_string()))?;
    tracing::info!(product_id = %id, "product created");

    Ok(Redirect::to(&format!("/products/{id}")))
}

/// Edit form with the gallery editor, resuming any open session.
#[instrument(skip(state))]
pub async fn edit_form(
    _: RequireCatalogWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let id = ProductId::new(id);
    let product = load(&state, id).await?;

    let editor = state.editors().open(id, product.gallery.clone()).await;
    let snapshot = editor.snapshot().await;

    let template = ProductFormTemplate {
        product: Some(FormValues::from(&product)),
        categories: category_options(Some(product.category)),
        gallery: Some(GalleryEditorView::new(id, &snapshot)),
    };

    Ok(render(&template))
}

/// Update a product's descriptive attributes.
#[instrument(skip(state, form))]
pub async fn update(
    _: RequireCatalogWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    axum::Form(form): axum::Form<ProductForm>,
) -> Result<Redirect, AppError> {
    let id = ProductId::new(id);
    let draft = form.into_draft()?;
    ProductRepository::new(state.pool()).update(id, &draft).await?;

    Ok(Redirect::to(&format!("/products/{id}")))
}

/// Flip a product's storefront visibility.
#[instrument(skip(state))]
pub async fn toggle_active(
    _: RequireCatalogWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let id = ProductId::new(id);
    let repo = ProductRepository::new(state.pool());
    let product = repo.load(id).await?;
    repo.set_active(id, !product.is_active).await?;

    Ok(Redirect::to("/products"))
}

/// Delete a product and close its editing session.
#[instrument(skip(state))]
pub async fn delete(
    _: RequireCatalogWrite,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Redirect, AppError> {
    let id = ProductId::new(id);

    // Close the session first so an upload resolving mid-delete is
    // discarded instead of mutating a gallery about to disappear.
    state.editors().close(id).await;
    ProductRepository::new(state.pool()).remove(id).await?;
    tracing::info!(product_id = %id, "product deleted");

    Ok(Redirect::to("/products"))
}

// =============================================================================
// Helpers
// =============================================================================

async fn load(state: &AppState, id: ProductId) -> Result<Product, AppError> {
    match ProductRepository::new(state.pool()).load(id).await {
        Ok(product) => Ok(product),
        Err(crate::db::RepositoryError::NotFound) => {
            Err(AppError::NotFound(format!("product {id}")))
        }
        Err(e) => Err(e.into()),
    }
}

fn category_options(current: Option<Category>) -> Vec<CategoryOption> {
    Category::ALL
        .iter()
        .map(|&c| CategoryOption {
            value: c.as_str(),
            label: c.label(),
            selected: current == Some(c),
        })
        .collect()
}

fn render<T: Template>(template: &T) -> Html<String> {
    Html(template.render().unwrap_or_else(|e| {
        tracing::error!("Template render error: {}", e);
        "Internal Server Error".to_string()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_groups_thousands() {
        assert_eq!(format_price(Some(Decimal::new(250_000, 0))), "Rp 250.000");
        assert_eq!(
            format_price(Some(Decimal::new(1_250_000, 0))),
            "Rp 1.250.000"
        );
        assert_eq!(format_price(Some(Decimal::new(999, 0))), "Rp 999");
    }

    #[test]
    fn test_format_price_missing_is_placeholder() {
        assert_eq!(format_price(None), "—");
    }

    #[test]
    fn test_form_requires_title_and_known_category() {
        let form = ProductForm {
            title: "  ".to_string(),
            category: "casual".to_string(),
            description: String::new(),
            materials: String::new(),
            sizing: String::new(),
            care_instructions: String::new(),
            for_him: String::new(),
            for_her: String::new(),
            price: String::new(),
            purchase_link: String::new(),
        };
        assert!(matches!(form.into_draft(), Err(AppError::BadRequest(_))));

        let form = ProductForm {
            title: "Classic Duet".to_string(),
            category: "seasonal".to_string(),
            description: String::new(),
            materials: String::new(),
            sizing: String::new(),
            care_instructions: String::new(),
            for_him: String::new(),
            for_her: String::new(),
            price: String::new(),
            purchase_link: String::new(),
        };
        assert!(matches!(form.into_draft(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_form_normalizes_blank_fields_to_none() {
        let form = ProductForm {
            title: "Classic Duet".to_string(),
            category: "classic".to_string(),
            description: "  A matching set.  ".to_string(),
            materials: "   ".to_string(),
            sizing: String::new(),
            care_instructions: String::new(),
            for_him: "Relaxed Fit Shirt".to_string(),
            for_her: String::new(),
            price: "250000".to_string(),
            purchase_link: String::new(),
        };

        let draft = form.into_draft().expect("valid form");
        assert_eq!(draft.description.as_deref(), Some("A matching set."));
        assert_eq!(draft.materials, None);
        assert_eq!(draft.for_him.as_deref(), Some("Relaxed Fit Shirt"));
        assert_eq!(draft.price, Some(Decimal::new(250_000, 0)));
        assert_eq!(draft.purchase_link, None);
    }

    #[test]
    fn test_form_rejects_bad_price() {
        let form = ProductForm {
            title: "Classic Duet".to_string(),
            category: "classic".to_string(),
            description: String::new(),
            materials: String::new(),
            sizing: String::new(),
            care_instructions: String::new(),
            for_him: String::new(),
            for_her: String::new(),
            price: "not-a-number".to_string(),
            purchase_link: String::new(),
        };
        assert!(matches!(form.into_draft(), Err(AppError::BadRequest(_))));
    }
}
