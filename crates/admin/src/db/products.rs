//! Product repository - the catalog record gateway's write side.
//!
//! Persists a product's full attribute set including its serialized gallery.
//! The gallery travels as an ordered JSONB array of `{url, is_primary}`
//! objects; this module serializes and deserializes it but never validates
//! the single-primary invariant - that stays with the gallery model on the
//! write path, before anything reaches here.
//!
//! Queries use the runtime API with `FromRow` row structs rather than the
//! compile-time macros, so the crate builds without a live database.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use tandem_core::{Category, Gallery, Product, ProductId};

use super::RepositoryError;

/// Attribute set accepted by create/update operations.
///
/// The gallery is deliberately absent: gallery writes go through
/// [`ProductRepository::save_gallery`] as a separate explicit step owned by
/// the editor session.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub title: String,
    pub category: Category,
    pub description: Option<String>,
    pub materials: Option<String>,
    pub sizing: Option<String>,
    pub care_instructions: Option<String>,
    pub for_him: Option<String>,
    pub for_her: Option<String>,
    pub price: Option<Decimal>,
    pub purchase_link: Option<String>,
}

// =============================================================================
// Internal Row Types
// =============================================================================

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

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog product operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new product with an empty gallery.
    ///
    /// The record store assigns the id, both timestamps, and a display
    /// order of current-max-plus-one so new products land at the end of
    /// every listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let query = format!(
            "INSERT INTO products \
             (title, category, description, materials, sizing, care_instructions, \
              for_him, for_her, price, purchase_link, images, display_order) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, '[]'::jsonb, \
                     (SELECT COALESCE(MAX(display_order), -1) + 1 FROM products)) \
             RETURNING {COLUMNS}"
        );

        let row: ProductRow = sqlx::query_as(&query)
            .bind(&draft.title)
            .bind(draft.category.as_str())
            .bind(&draft.description)
            .bind(&draft.materials)
            .bind(&draft.sizing)
            .bind(&draft.care_instructions)
            .bind(&draft.for_him)
            .bind(&draft.for_her)
            .bind(draft.price)
            .bind(&draft.purchase_link)
            .fetch_one(self.pool)
            .await?;

        row.try_into()
    }

    /// Update a product's descriptive attributes, leaving its gallery as-is.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, RepositoryError> {
        let query = format!(
            "UPDATE products SET \
             title = $2, category = $3, description = $4, materials = $5, \
             sizing = $6, care_instructions = $7, for_him = $8, for_her = $9, \
             price = $10, purchase_link = $11, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );

        let row: Option<ProductRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(&draft.title)
            .bind(draft.category.as_str())
            .bind(&draft.description)
            .bind(&draft.materials)
            .bind(&draft.sizing)
            .bind(&draft.care_instructions)
            .bind(&draft.for_him)
            .bind(&draft.for_her)
            .bind(draft.price)
            .bind(&draft.purchase_link)
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Persist a product's gallery - the editor's explicit-save write path.
    ///
    /// The whole serialized gallery replaces the stored one; there is no
    /// partial-write recovery, a failed save leaves the stored record
    /// untouched for a later retry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn save_gallery(
        &self,
        id: ProductId,
        gallery: &Gallery,
    ) -> Result<Product, RepositoryError> {
        let query = format!(
            "UPDATE products SET images = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );

        let row: Option<ProductRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(Json(gallery))
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Load one product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn load(&self, id: ProductId) -> Result<Product, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");

        let row: Option<ProductRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// List every product, active or not, in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let query = format!("SELECT {COLUMNS} FROM products ORDER BY display_order ASC");

        let rows: Vec<ProductRow> = sqlx::query_as(&query).fetch_all(self.pool).await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Flip a product's storefront visibility.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn set_active(
        &self,
        id: ProductId,
        is_active: bool,
    ) -> Result<Product, RepositoryError> {
        let query = format!(
            "UPDATE products SET is_active = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );

        let row: Option<ProductRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(is_active)
            .fetch_optional(self.pool)
            .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    /// Delete a product record, gallery included.
    ///
    /// The record goes atomically, so no reader can observe a half-deleted
    /// gallery. Blob assets are left behind in the object store (no GC).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn remove(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
