//! Cart repository: one lazily-created cart per user.
//!
//! Quantities of duplicate products merge; every quantity change is checked
//! against current stock. Checkout (which clears the cart) lives in the order
//! repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use copper_fox_core::{CartId, CartItemId, Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem, CartProduct};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The referenced product does not exist.
    #[error("product not found")]
    ProductNotFound,

    /// The referenced cart line does not exist in this user's cart.
    #[error("cart item not found")]
    ItemNotFound,

    /// The product has no stock at all.
    #[error("{name} is out of stock")]
    OutOfStock { name: String },

    /// Requested quantity exceeds available stock.
    #[error("cannot carry {requested} x {name}: only {available} in stock")]
    InsufficientStock {
        name: String,
        requested: i32,
        available: i32,
    },

    /// Quantity must be at least 1 when adding.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Sum of quantities and of quantity x current price across cart lines.
fn cart_totals(items: &[CartItem]) -> (i64, Decimal) {
    let total_items = items.iter().map(|item| i64::from(item.quantity)).sum();
    let total_price = items
        .iter()
        .map(|item| item.product.price.line_total(item.quantity.unsigned_abs()))
        .sum();
    (total_items, total_price)
}

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    quantity: i32,
    product_id: ProductId,
    product_name: String,
    product_slug: String,
    product_price: Price,
    product_stock: i32,
    product_photo_url: Option<String>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: row.id,
            quantity: row.quantity,
            product: CartProduct {
                id: row.product_id,
                name: row.product_name,
                slug: row.product_slug,
                price: row.product_price,
                stock_quantity: row.product_stock,
                primary_photo_url: row.product_photo_url,
            },
        }
    }
}

/// Current stock and price for a product referenced from the cart.
#[derive(sqlx::FromRow)]
struct ProductStockRow {
    name: String,
    stock_quantity: i32,
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating it on first access.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;
        let cart_id = ensure_cart(&mut tx, user_id).await?;
        tx.commit().await?;

        self.load(cart_id, user_id).await
    }

    /// Add a product to the user's cart, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for quantities below 1.
    /// Returns `CartError::ProductNotFound` if the product doesn't exist.
    /// Returns `CartError::OutOfStock` / `CartError::InsufficientStock` when
    /// stock cannot cover the (merged) quantity.
    pub async fn add_item(
        &self,
        user_id: UserId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Cart, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let mut tx = self.pool.begin().await?;
        let cart_id = ensure_cart(&mut tx, user_id).await?;

        let product = sqlx::query_as::<_, ProductStockRow>(
            "SELECT name, stock_quantity FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CartError::ProductNotFound)?;

        if product.stock_quantity <= 0 {
            return Err(CartError::OutOfStock { name: product.name });
        }

        let existing = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM cart_items WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        let merged = existing.unwrap_or(0) + quantity;
        if merged > product.stock_quantity {
            return Err(CartError::InsufficientStock {
                name: product.name,
                requested: merged,
                available: product.stock_quantity,
            });
        }

        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity)
             VALUES ($1, $2, $3)
             ON CONFLICT (cart_id, product_id)
             DO UPDATE SET quantity = $3, updated_at = NOW()",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(merged)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.load(cart_id, user_id).await
    }

    /// Set a cart line's quantity. A quantity of zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the line is not in this user's cart.
    /// Returns `CartError::InsufficientStock` when stock cannot cover it.
    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;
        let cart_id = ensure_cart(&mut tx, user_id).await?;

        let product = sqlx::query_as::<_, ProductStockRow>(
            "SELECT p.name, p.stock_quantity
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.id = $1 AND ci.cart_id = $2",
        )
        .bind(item_id)
        .bind(cart_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CartError::ItemNotFound)?;

        if quantity <= 0 {
            sqlx::query("DELETE FROM cart_items WHERE id = $1")
                .bind(item_id)
                .execute(&mut *tx)
                .await?;
        } else {
            if quantity > product.stock_quantity {
                return Err(CartError::InsufficientStock {
                    name: product.name,
                    requested: quantity,
                    available: product.stock_quantity,
                });
            }

            sqlx::query("UPDATE cart_items SET quantity = $2, updated_at = NOW() WHERE id = $1")
                .bind(item_id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.load(cart_id, user_id).await
    }

    /// Remove a line from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ItemNotFound` if the line is not in this user's cart.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;
        let cart_id = ensure_cart(&mut tx, user_id).await?;

        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id)
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CartError::ItemNotFound);
        }

        tx.commit().await?;

        self.load(cart_id, user_id).await
    }

    /// Remove every line from the user's cart. The cart row itself persists.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if a query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;
        let cart_id = ensure_cart(&mut tx, user_id).await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.load(cart_id, user_id).await
    }

    /// Load a cart with its items and totals.
    async fn load(&self, cart_id: CartId, user_id: UserId) -> Result<Cart, CartError> {
        let cart = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE id = $1",
        )
        .bind(cart_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| {
            CartError::Repository(RepositoryError::DataCorruption(format!(
                "cart {cart_id} vanished for user {user_id}"
            )))
        })?;

        let items: Vec<CartItem> = sqlx::query_as::<_, CartItemRow>(
            "SELECT ci.id, ci.quantity,
                    p.id AS product_id, p.name AS product_name, p.slug AS product_slug,
                    p.price AS product_price, p.stock_quantity AS product_stock,
                    p.primary_photo_url AS product_photo_url
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.cart_id = $1
             ORDER BY ci.id ASC",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(CartItem::from)
        .collect();

        let (total_items, total_price) = cart_totals(&items);

        Ok(Cart {
            id: cart.id,
            user_id: cart.user_id,
            items,
            total_items,
            total_price,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        })
    }
}

/// Find or lazily create the user's cart, returning its ID.
async fn ensure_cart(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<CartId, CartError> {
    if let Some(id) = sqlx::query_scalar::<_, CartId>("SELECT id FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
    {
        return Ok(id);
    }

    // Racing inserts resolve via the unique user_id; the loser re-reads.
    sqlx::query("INSERT INTO carts (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    let id = sqlx::query_scalar::<_, CartId>("SELECT id FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;

    Ok(id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn item(id: i32, quantity: i32, price: i64) -> CartItem {
        CartItem {
            id: CartItemId::new(id),
            quantity,
            product: CartProduct {
                id: ProductId::new(id),
                name: format!("product-{id}"),
                slug: format!("product-{id}"),
                price: Price::new(Decimal::from(price)).unwrap(),
                stock_quantity: 100,
                primary_photo_url: None,
            },
        }
    }

    #[test]
    fn test_cart_totals_empty() {
        let (count, total) = cart_totals(&[]);
        assert_eq!(count, 0);
        assert_eq!(total, Decimal::ZERO);
    }

    #[test]
    fn test_cart_totals_sums_lines() {
        let items = vec![item(1, 2, 100), item(2, 1, 250)];
        let (count, total) = cart_totals(&items);
        assert_eq!(count, 3);
        assert_eq!(total, Decimal::from(450));
    }
}
