//! Product comment (review) repository.
//!
//! Every mutation recomputes the owning product's denormalized
//! `comment_count` and `average_rating` inside the same transaction, so the
//! catalog columns never drift from the comment table.

use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use copper_fox_core::{CommentId, ProductId, UserId};

use super::RepositoryError;
use crate::models::Comment;

/// Ratings are stars, 1 through 5.
const MIN_RATING: i32 = 1;
const MAX_RATING: i32 = 5;

/// Errors from comment operations.
#[derive(Debug, Error)]
pub enum CommentError {
    /// The referenced product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The referenced comment does not exist.
    #[error("comment {0} not found")]
    NotFound(CommentId),

    /// Rating outside the 1-5 range.
    #[error("rating must be between {MIN_RATING} and {MAX_RATING}, got {0}")]
    InvalidRating(i32),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CommentError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Validate a star rating.
fn validate_rating(rating: i32) -> Result<(), CommentError> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(CommentError::InvalidRating(rating));
    }
    Ok(())
}

/// Fields accepted when creating a comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub title: String,
    pub content: String,
    pub rating: i32,
}

/// Comment fields that can change after creation.
#[derive(Debug, Clone, Default)]
pub struct UpdateComment {
    pub title: Option<String>,
    pub content: Option<String>,
    pub rating: Option<i32>,
}

const COMMENT_COLUMNS: &str =
    "id, user_id, product_id, title, content, rating, created_at, updated_at";

/// Repository for comment database operations.
pub struct CommentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CommentRepository<'a> {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a comment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM product_comments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(comment)
    }

    /// List comments, optionally filtered by product and/or rating.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        product_id: Option<ProductId>,
        rating: Option<i32>,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM product_comments
             WHERE ($1::int4 IS NULL OR product_id = $1)
               AND ($2::int4 IS NULL OR rating = $2)
             ORDER BY created_at DESC"
        ))
        .bind(product_id)
        .bind(rating)
        .fetch_all(self.pool)
        .await?;

        Ok(comments)
    }

    /// Create a comment and refresh the product's review aggregates.
    ///
    /// # Errors
    ///
    /// Returns `CommentError::InvalidRating` for ratings outside 1-5.
    /// Returns `CommentError::ProductNotFound` if the product doesn't exist.
    pub async fn create(&self, new: &NewComment) -> Result<Comment, CommentError> {
        validate_rating(new.rating)?;

        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(new.product_id)
        .fetch_optional(&mut *tx)
        .await?;

        if product.is_none() {
            return Err(CommentError::ProductNotFound(new.product_id));
        }

        let comment = sqlx::query_as::<_, Comment>(&format!(
            "INSERT INTO product_comments (user_id, product_id, title, content, rating)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(new.user_id)
        .bind(new.product_id)
        .bind(&new.title)
        .bind(&new.content)
        .bind(new.rating)
        .fetch_one(&mut *tx)
        .await?;

        refresh_aggregates(&mut tx, new.product_id).await?;

        tx.commit().await?;

        Ok(comment)
    }

    /// Update a comment and refresh the product's review aggregates.
    ///
    /// Omitted fields keep their current values.
    ///
    /// # Errors
    ///
    /// Returns `CommentError::NotFound` if the comment doesn't exist.
    /// Returns `CommentError::InvalidRating` for ratings outside 1-5.
    pub async fn update(
        &self,
        id: CommentId,
        changes: &UpdateComment,
    ) -> Result<Comment, CommentError> {
        if let Some(rating) = changes.rating {
            validate_rating(rating)?;
        }

        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM product_comments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CommentError::NotFound(id))?;

        let title = changes.title.clone().unwrap_or(current.title);
        let content = changes.content.clone().unwrap_or(current.content);
        let rating = changes.rating.unwrap_or(current.rating);

        let comment = sqlx::query_as::<_, Comment>(&format!(
            "UPDATE product_comments
             SET title = $2, content = $3, rating = $4, updated_at = NOW()
             WHERE id = $1
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(&title)
        .bind(&content)
        .bind(rating)
        .fetch_one(&mut *tx)
        .await?;

        refresh_aggregates(&mut tx, current.product_id).await?;

        tx.commit().await?;

        Ok(comment)
    }

    /// Delete a comment and refresh the product's review aggregates.
    ///
    /// # Errors
    ///
    /// Returns `CommentError::NotFound` if the comment doesn't exist.
    pub async fn remove(&self, id: CommentId) -> Result<(), CommentError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM product_comments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CommentError::NotFound(id))?;

        sqlx::query("DELETE FROM product_comments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        refresh_aggregates(&mut tx, current.product_id).await?;

        tx.commit().await?;

        Ok(())
    }
}

/// Recompute `comment_count` and `average_rating` for a product.
async fn refresh_aggregates(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
) -> Result<(), CommentError> {
    sqlx::query(
        "UPDATE products
         SET comment_count = stats.cnt,
             average_rating = stats.avg_rating,
             updated_at = NOW()
         FROM (
             SELECT COUNT(*) AS cnt,
                    ROUND(COALESCE(AVG(rating), 0), 2) AS avg_rating
             FROM product_comments
             WHERE product_id = $1
         ) AS stats
         WHERE products.id = $1",
    )
    .bind(product_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rating_bounds() {
        assert!(validate_rating(1).is_ok());
        assert!(validate_rating(5).is_ok());
        assert!(matches!(validate_rating(0), Err(CommentError::InvalidRating(0))));
        assert!(matches!(validate_rating(6), Err(CommentError::InvalidRating(6))));
        assert!(matches!(validate_rating(-1), Err(CommentError::InvalidRating(-1))));
    }
}
