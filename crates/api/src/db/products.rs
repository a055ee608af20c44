//! Product repository for database operations.
//!
//! Stock decrements during checkout live in the order repository, where they
//! run inside the order placement transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use copper_fox_core::{CategoryId, Price, ProductId};

use super::RepositoryError;
use crate::models::{Category, Product};

/// Fallback copy for products created without descriptions.
const DEFAULT_SHORT_DESCRIPTION: &str = "No description yet";
const DEFAULT_LONG_DESCRIPTION: &str = "No detailed description yet";

/// Flat row from the products/categories join.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    slug: String,
    short_description: String,
    long_description: String,
    price: Price,
    stock_quantity: i32,
    primary_photo_url: Option<String>,
    comment_count: i32,
    average_rating: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    category_id: i32,
    category_name: String,
    category_slug: String,
    category_sort_order: i32,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            category: Category {
                id: CategoryId::new(row.category_id),
                name: row.category_name,
                slug: row.category_slug,
                sort_order: row.category_sort_order,
            },
            name: row.name,
            slug: row.slug,
            short_description: row.short_description,
            long_description: row.long_description,
            price: row.price,
            stock_quantity: row.stock_quantity,
            primary_photo_url: row.primary_photo_url,
            comment_count: row.comment_count,
            average_rating: row.average_rating,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PRODUCT_SELECT: &str = "SELECT p.id, p.name, p.slug, p.short_description, p.long_description,
        p.price, p.stock_quantity, p.primary_photo_url, p.comment_count, p.average_rating,
        p.created_at, p.updated_at,
        c.id AS category_id, c.name AS category_name, c.slug AS category_slug,
        c.sort_order AS category_sort_order
 FROM products p
 JOIN categories c ON c.id = p.category_id";

/// Fields accepted when creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub price: Price,
    pub stock_quantity: i32,
    pub primary_photo_url: Option<String>,
}

/// Product fields that can change after creation.
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub category_id: Option<CategoryId>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub price: Option<Price>,
    pub stock_quantity: Option<i32>,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all products with their categories, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} ORDER BY p.created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Get a product by its slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.slug = $1"))
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Create a new product.
    ///
    /// Missing descriptions fall back to placeholder copy.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    /// Returns `RepositoryError::Conflict` if the slug already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let short_description = new
            .short_description
            .clone()
            .unwrap_or_else(|| DEFAULT_SHORT_DESCRIPTION.to_owned());
        let long_description = new
            .long_description
            .clone()
            .unwrap_or_else(|| DEFAULT_LONG_DESCRIPTION.to_owned());

        let inserted_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO products (category_id, name, slug, short_description, long_description,
                                   price, stock_quantity, primary_photo_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(new.category_id)
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&short_description)
        .bind(&long_description)
        .bind(new.price)
        .bind(new.stock_quantity)
        .bind(&new.primary_photo_url)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return RepositoryError::Conflict("product slug already exists".to_owned());
                }
                if db_err.is_foreign_key_violation() {
                    return RepositoryError::NotFound;
                }
            }
            RepositoryError::Database(e)
        })?;

        self.get(ProductId::new(inserted_id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Update a product's catalog fields.
    ///
    /// Omitted fields keep their current values. Denormalized columns
    /// (photo URL, review aggregates) are owned by the photo and comment
    /// repositories and cannot be written here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &UpdateProduct,
    ) -> Result<Product, RepositoryError> {
        let current = self.get(id).await?.ok_or(RepositoryError::NotFound)?;

        let category_id = changes.category_id.unwrap_or(current.category.id);
        let name = changes.name.clone().unwrap_or(current.name);
        let slug = changes.slug.clone().unwrap_or(current.slug);
        let short_description = changes
            .short_description
            .clone()
            .unwrap_or(current.short_description);
        let long_description = changes
            .long_description
            .clone()
            .unwrap_or(current.long_description);
        let price = changes.price.unwrap_or(current.price);
        let stock_quantity = changes.stock_quantity.unwrap_or(current.stock_quantity);

        sqlx::query(
            "UPDATE products
             SET category_id = $2, name = $3, slug = $4, short_description = $5,
                 long_description = $6, price = $7, stock_quantity = $8, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(category_id)
        .bind(&name)
        .bind(&slug)
        .bind(&short_description)
        .bind(&long_description)
        .bind(price)
        .bind(stock_quantity)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return RepositoryError::Conflict("product slug already exists".to_owned());
                }
                if db_err.is_foreign_key_violation() {
                    return RepositoryError::NotFound;
                }
            }
            RepositoryError::Database(e)
        })?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Its photos, cart lines, and comments cascade.
    ///
    /// # Returns
    ///
    /// Returns `true` if the product was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
