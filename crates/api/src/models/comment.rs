//! Product review domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use copper_fox_core::{CommentId, ProductId, UserId};

/// A product review with a 1-5 rating.
///
/// Creating, updating, or deleting a comment recomputes the owning product's
/// `comment_count` and `average_rating` in the same transaction.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub title: String,
    pub content: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
