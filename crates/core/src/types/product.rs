//! Catalog product owning one image gallery.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::gallery::Gallery;
use super::id::ProductId;

/// A catalog product and its full attribute set.
///
/// The product exclusively owns its [`Gallery`]; nothing else in the system
/// references an image asset. Identity and timestamps are assigned by the
/// record store on first save, so a freshly drafted product carries
/// `id: None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Record store id, `None` until first persisted.
    pub id: Option<ProductId>,
    pub title: String,
    pub category: Category,
    pub description: Option<String>,
    /// Fabric/material details shown in the detail accordion.
    pub materials: Option<String>,
    /// Size and fit notes.
    pub sizing: Option<String>,
    /// Washing/care notes.
    pub care_instructions: Option<String>,
    /// Blurb for the men's half of the pairing.
    pub for_him: Option<String>,
    /// Blurb for the women's half of the pairing.
    pub for_her: Option<String>,
    /// Price in whole currency units; `None` renders as "coming soon".
    pub price: Option<Decimal>,
    /// External buy link; the storefront never sells directly.
    pub purchase_link: Option<String>,
    /// Only active products appear on the storefront.
    pub is_active: bool,
    /// Ascending sort rank on every listing surface.
    pub display_order: i32,
    pub gallery: Gallery,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Draft a new product with an empty gallery, not yet persisted.
    #[must_use]
    pub fn draft(title: String, category: Category) -> Self {
        Self {
            id: None,
            title,
            category,
            description: None,
            materials: None,
            sizing: None,
            care_instructions: None,
            for_him: None,
            for_her: None,
            price: None,
            purchase_link: None,
            is_active: true,
            display_order: 0,
            gallery: Gallery::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_starts_active_with_empty_gallery() {
        let product = Product::draft("Casual Harmony".to_string(), Category::Casual);
        assert!(product.id.is_none());
        assert!(product.is_active);
        assert!(product.gallery.is_empty());
        assert!(product.created_at.is_none());
    }
}
