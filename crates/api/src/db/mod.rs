//! Database operations for the storefront `PostgreSQL`.
//!
//! # Tables
//!
//! - `users` - Registered shoppers (argon2 password hashes)
//! - `categories` - Product categories
//! - `products` - Catalog entries with denormalized photo/review columns
//! - `product_photos` - Ordered per-product photo lists
//! - `carts` / `cart_items` - One lazy cart per user
//! - `orders` / `order_items` / `shipping_addresses` - Checkout snapshots
//! - `product_comments` - Reviews with 1-5 ratings
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p copper-fox-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod carts;
pub mod categories;
pub mod comments;
pub mod orders;
pub mod photos;
pub mod products;
pub mod users;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
