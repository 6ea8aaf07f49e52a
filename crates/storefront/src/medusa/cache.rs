//! Cache types for Medusa catalog responses.

use super::types::{Category, Product, ProductPage};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductPage),
    Category(Box<Category>),
}
