//! Read-only catalog access for the public storefront.
//!
//! Only active products are visible here, ordered by their display rank.
//! The gallery deserializes from the `images` JSONB column exactly as the
//! admin saved it; the viewer's fallback logic copes with anything imported
//! from before the single-primary invariant was enforced.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use tandem_core::{Category, Gallery, Product, ProductId};

use super::RepositoryError;

/// Internal row type for `PostgreSQL` product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    title: String,
    category: String,
    description: Option<String>,
    materials: Option<String>,
    sizing: Option<String>,
    care_instructions: Option<String>,
    for_him: Option<String>,
    for_her: Option<String>,
    price: Option<Decimal>,
    purchase_link: Option<String>,
    images: Json<Gallery>,
    is_active: bool,
    display_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category = Category::from_str(&row.category).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid category in database: {e}"))
        })?;

        Ok(Self {
            id: Some(ProductId::new(row.id)),
            title: row.title,
            category,
            description: row.description,
            materials: row.materials,
            sizing: row.sizing,
            care_instructions: row.care_instructions,
            for_him: row.for_him,
            for_her: row.for_her,
            price: row.price,
            purchase_link: row.purchase_link,
            is_active: row.is_active,
            display_order: row.display_order,
            gallery: row.images.0,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

const COLUMNS: &str = "id, title, category, description, materials, sizing, \
                       care_instructions, for_him, for_her, price, purchase_link, \
                       images, is_active, display_order, created_at, updated_at";

/// Read-only repository over the shared `products` table.
pub struct CatalogReader<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogReader<'a> {
    /// Create a new catalog reader.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let query = format!(
            "SELECT {COLUMNS} FROM products WHERE is_active = TRUE ORDER BY display_order ASC"
        );

        let rows: Vec<ProductRow> = sqlx::query_as(&query).fetch_all(self.pool).await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Load one active product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist or
    /// is hidden from the storefront.
    pub async fn load_active(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1 AND is_active = TRUE");

        let row: Option<ProductRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }
}
