//! Cached catalog reads for the storefront.
//!
//! Wraps [`CatalogReader`] with a short-TTL `moka` cache so landing-page
//! traffic does not hammer the database for a catalog that changes a few
//! times a day. Staleness is bounded by the TTL; the storefront never needs
//! writes-follow-reads consistency with the admin panel.

mod cache;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::instrument;

use tandem_core::{Product, ProductId};

use crate::db::{CatalogReader, RepositoryError};

use cache::{CacheKey, CacheValue};

/// Upper bound on cached entries; the catalog is small, this is a backstop.
const CACHE_CAPACITY: u64 = 1000;

/// Errors from cached catalog reads.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog read failed: {0}")]
    Read(String),
}

/// Catalog read service with an in-memory cache in front of the database.
#[derive(Clone)]
pub struct CachedCatalog {
    pool: PgPool,
    cache: Cache<CacheKey, CacheValue>,
}

impl CachedCatalog {
    /// Create a cached catalog with the given TTL.
    #[must_use]
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        Self { pool, cache }
    }

    /// Active products in display order, possibly up to one TTL stale.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the underlying read fails.
    #[instrument(skip(self))]
    pub async fn active_products(&self) -> Result<Vec<Product>, CatalogError> {
        let value = self
            .cache
            .try_get_with(CacheKey::Listing, async {
                let products = CatalogReader::new(&self.pool).list_active().await?;
                Ok::<_, RepositoryError>(CacheValue::Listing(products))
            })
            .await
            .map_err(|e: Arc<RepositoryError>| CatalogError::Read(e.to_string()))?;

        match value {
            CacheValue::Listing(products) => Ok(products),
            CacheValue::Product(_) => unreachable!("listing key always caches a listing"),
        }
    }

    /// One active product, or `None` if unknown or hidden.
    ///
    /// Misses are not cached, so a product flipped to active shows up
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the underlying read fails.
    #[instrument(skip(self))]
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, CatalogError> {
        let result = self
            .cache
            .try_get_with(CacheKey::Product(id.as_i32()), async {
                let product = CatalogReader::new(&self.pool).load_active(id).await?;
                Ok::<_, RepositoryError>(CacheValue::Product(Box::new(product)))
            })
            .await;

        match result {
            Ok(CacheValue::Product(product)) => Ok(Some(*product)),
            Ok(CacheValue::Listing(_)) => unreachable!("product key always caches a product"),
            Err(e) if matches!(*e, RepositoryError::NotFound) => Ok(None),
            Err(e) => Err(CatalogError::Read(e.to_string())),
        }
    }
}
