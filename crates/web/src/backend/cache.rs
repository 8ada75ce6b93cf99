//! Cache types for backend responses.

use super::types::Category;

/// Cache key for the public category list.
pub const CATEGORIES_KEY: &str = "categories";

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Categories(Vec<Category>),
}
