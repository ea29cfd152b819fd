//! Cache types for catalog reads.

use tandem_core::Product;

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// The active-product listing.
    Listing,
    /// One product by id.
    Product(i32),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Listing(Vec<Product>),
    Product(Box<Product>),
}
