//! Catalog domain types: categories, products, photos.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use copper_fox_core::{CategoryId, PhotoId, Price, ProductId};

/// A product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// URL-safe unique identifier.
    pub slug: String,
    /// Position in category listings (ascending).
    pub sort_order: i32,
}

/// A catalog product with its category embedded.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub category: Category,
    pub name: String,
    /// URL-safe unique identifier.
    pub slug: String,
    pub short_description: String,
    pub long_description: String,
    pub price: Price,
    /// Available inventory; decremented only by successful order placement.
    pub stock_quantity: i32,
    /// Denormalized URL of the primary photo, kept in sync by photo operations.
    pub primary_photo_url: Option<String>,
    /// Denormalized review count, kept in sync by comment operations.
    pub comment_count: i32,
    /// Denormalized average rating, kept in sync by comment operations.
    pub average_rating: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One photo in a product's ordered photo list.
///
/// Invariants (maintained by the photo repository, per operation, in one
/// transaction each):
/// - `sort_order` values of a product's photos are exactly `1..=N`
/// - exactly one photo per non-empty product has `is_primary = true`
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductPhoto {
    pub id: PhotoId,
    pub product_id: ProductId,
    pub url: String,
    /// Stored size of the image in bytes.
    pub size_bytes: i64,
    /// 1-based position within the product's photo list, dense.
    pub sort_order: i32,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
