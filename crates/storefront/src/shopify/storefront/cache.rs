//! Cache types for Storefront API responses.

use crate::shopify::types::{Collection, Product};

/// Cached value types for catalog reads.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Collection(Box<Collection>),
}
