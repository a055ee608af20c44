//! Order repository: checkout, retrieval, and status transitions.
//!
//! Checkout is the one multi-statement flow in the system that must be
//! all-or-nothing: stock decrements, the order row, its address and item
//! snapshots, and the cart clearing either all commit or none do. Product
//! rows are read `FOR UPDATE` and decremented with a `stock_quantity >= qty`
//! guard re-checked by the store in the same statement, so concurrent
//! checkouts against the same product cannot drive stock below zero.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use copper_fox_core::{
    OrderId, OrderItemId, OrderStatus, PaymentMethod, Price, ProductId, UserId,
};

use super::RepositoryError;
use crate::models::{Order, OrderItem, ShippingAddress, ShippingDetails};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The user has no cart.
    #[error("cart not found")]
    CartNotFound,

    /// The user's cart has no items.
    #[error("cart is empty")]
    CartEmpty,

    /// The referenced order does not exist.
    #[error("order {0} not found")]
    NotFound(OrderId),

    /// The requesting user does not own this order.
    #[error("order {0} belongs to another user")]
    Forbidden(OrderId),

    /// A cart line asks for more units than are in stock.
    #[error("insufficient stock for {name}: requested {requested}, available {available}")]
    InsufficientStock {
        name: String,
        requested: i32,
        available: i32,
    },

    /// The requested status change is not allowed by the transition table.
    #[error("cannot transition order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// One cart line joined with the product state current at checkout.
#[derive(Debug, Clone, sqlx::FromRow)]
struct CheckoutLine {
    product_id: ProductId,
    name: String,
    quantity: i32,
    unit_price: Price,
    stock_quantity: i32,
}

// =============================================================================
// Pure checkout helpers
// =============================================================================

/// Verify every line fits in stock; the first violation aborts checkout.
fn check_stock(lines: &[CheckoutLine]) -> Result<(), OrderError> {
    for line in lines {
        if line.quantity > line.stock_quantity {
            return Err(OrderError::InsufficientStock {
                name: line.name.clone(),
                requested: line.quantity,
                available: line.stock_quantity,
            });
        }
    }
    Ok(())
}

/// Order total at the prices current at checkout.
fn order_total(lines: &[CheckoutLine]) -> Decimal {
    lines
        .iter()
        .map(|line| line.unit_price.line_total(line.quantity.unsigned_abs()))
        .sum()
}

// =============================================================================
// Repository
// =============================================================================

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: String,
    payment_method: String,
    total_price: Decimal,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    product_id: ProductId,
    quantity: i32,
    unit_price: Price,
}

impl OrderRow {
    fn into_order(
        self,
        items: Vec<OrderItem>,
        shipping_address: ShippingAddress,
    ) -> Result<Order, RepositoryError> {
        let status = self.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", self.id))
        })?;
        let payment_method = self.payment_method.parse::<PaymentMethod>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", self.id))
        })?;

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            status,
            payment_method,
            total_price: self.total_price,
            items,
            shipping_address,
            created_at: self.created_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, status, payment_method, total_price, created_at";
const ADDRESS_COLUMNS: &str =
    "id, full_name, phone, address, city, state, zip_code, country";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from the user's cart.
    ///
    /// Runs as a single transaction: stock is decremented with a conditional
    /// guard, the order with its address and item snapshots is created, and
    /// the cart is cleared. Any failure rolls the whole thing back.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::CartNotFound` / `OrderError::CartEmpty` when there
    /// is nothing to check out, and `OrderError::InsufficientStock` naming the
    /// first product whose stock cannot cover its line.
    pub async fn create_order(
        &self,
        user_id: UserId,
        shipping: &ShippingDetails,
        payment_method: PaymentMethod,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let cart_id = sqlx::query_scalar::<_, i32>("SELECT id FROM carts WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(OrderError::CartNotFound)?;

        // Lock the product rows so the stock check below stays valid until
        // the decrements run.
        let lines = sqlx::query_as::<_, CheckoutLine>(
            "SELECT ci.product_id, p.name, ci.quantity,
                    p.price AS unit_price, p.stock_quantity
             FROM cart_items ci
             JOIN products p ON p.id = ci.product_id
             WHERE ci.cart_id = $1
             ORDER BY ci.id ASC
             FOR UPDATE OF p",
        )
        .bind(cart_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(OrderError::CartEmpty);
        }

        check_stock(&lines)?;
        let total_price = order_total(&lines);

        for line in &lines {
            let result = sqlx::query(
                "UPDATE products
                 SET stock_quantity = stock_quantity - $2, updated_at = NOW()
                 WHERE id = $1 AND stock_quantity >= $2",
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(OrderError::InsufficientStock {
                    name: line.name.clone(),
                    requested: line.quantity,
                    available: line.stock_quantity,
                });
            }
        }

        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            "INSERT INTO orders (user_id, status, payment_method, total_price)
             VALUES ($1, $2, $3, $4)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(OrderStatus::Pending.to_string())
        .bind(payment_method.to_string())
        .bind(total_price)
        .fetch_one(&mut *tx)
        .await?;

        let shipping_address = sqlx::query_as::<_, ShippingAddress>(&format!(
            "INSERT INTO shipping_addresses
                 (order_id, full_name, phone, address, city, state, zip_code, country)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(order_row.id)
        .bind(&shipping.full_name)
        .bind(&shipping.phone)
        .bind(&shipping.address)
        .bind(&shipping.city)
        .bind(&shipping.state)
        .bind(&shipping.zip_code)
        .bind(&shipping.country)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let item = sqlx::query_as::<_, OrderItemRow>(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id, product_id, quantity, unit_price",
            )
            .bind(order_row.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .fetch_one(&mut *tx)
            .await?;

            items.push(OrderItem {
                id: item.id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
            });
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(order_row.into_order(items, shipping_address)?)
    }

    /// Get an order with its items and address.
    ///
    /// Administrative callers pass `None` for `requesting_user` to skip the
    /// ownership check.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order doesn't exist.
    /// Returns `OrderError::Forbidden` when `requesting_user` doesn't own it.
    pub async fn get(
        &self,
        order_id: OrderId,
        requesting_user: Option<UserId>,
    ) -> Result<Order, OrderError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(OrderError::NotFound(order_id))?;

        if let Some(user_id) = requesting_user
            && row.user_id != user_id
        {
            return Err(OrderError::Forbidden(order_id));
        }

        let items = self.load_items(order_id).await?;
        let shipping_address = self.load_address(order_id).await?;

        Ok(row.into_order(items, shipping_address)?)
    }

    /// List a user's orders, newest first, with items and addresses.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.load_items(row.id).await?;
            let shipping_address = self.load_address(row.id).await?;
            orders.push(row.into_order(items, shipping_address)?);
        }

        Ok(orders)
    }

    /// Change an order's status along the allowed-transition table.
    ///
    /// Administrative callers pass `None` for `requesting_user` to skip the
    /// ownership check.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` / `OrderError::Forbidden` as [`Self::get`].
    /// Returns `OrderError::InvalidTransition` for moves the table forbids.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
        requesting_user: Option<UserId>,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(order_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(OrderError::NotFound(order_id))?;

        if let Some(user_id) = requesting_user
            && row.user_id != user_id
        {
            return Err(OrderError::Forbidden(order_id));
        }

        let current = row.status.parse::<OrderStatus>().map_err(|e| {
            OrderError::Repository(RepositoryError::DataCorruption(format!(
                "order {order_id}: {e}"
            )))
        })?;

        if !current.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: current,
                to: new_status,
            });
        }

        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(order_id)
            .bind(new_status.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get(order_id, None).await
    }

    async fn load_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, OrderError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT id, product_id, quantity, unit_price
             FROM order_items WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| OrderItem {
                id: row.id,
                product_id: row.product_id,
                quantity: row.quantity,
                unit_price: row.unit_price,
            })
            .collect())
    }

    async fn load_address(&self, order_id: OrderId) -> Result<ShippingAddress, OrderError> {
        let address = sqlx::query_as::<_, ShippingAddress>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM shipping_addresses WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| {
            OrderError::Repository(RepositoryError::DataCorruption(format!(
                "order {order_id} has no shipping address"
            )))
        })?;

        Ok(address)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(name: &str, quantity: i32, price: i64, stock: i32) -> CheckoutLine {
        CheckoutLine {
            product_id: ProductId::new(1),
            name: name.to_owned(),
            quantity,
            unit_price: Price::new(Decimal::from(price)).unwrap(),
            stock_quantity: stock,
        }
    }

    #[test]
    fn test_check_stock_passes_when_covered() {
        let lines = vec![line("shirt", 2, 100, 10), line("jeans", 1, 250, 1)];
        assert!(check_stock(&lines).is_ok());
    }

    #[test]
    fn test_check_stock_names_first_violation() {
        // Quantity 5 against stock 3 must abort and name both quantities.
        let lines = vec![line("shirt", 5, 100, 3)];
        match check_stock(&lines).unwrap_err() {
            OrderError::InsufficientStock {
                name,
                requested,
                available,
            } => {
                assert_eq!(name, "shirt");
                assert_eq!(requested, 5);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_stock_boundary() {
        let lines = vec![line("shirt", 3, 100, 3)];
        assert!(check_stock(&lines).is_ok());
    }

    #[test]
    fn test_order_total_snapshots_checkout_prices() {
        // 2 x 100 at checkout = 200.
        let lines = vec![line("shirt", 2, 100, 10)];
        assert_eq!(order_total(&lines), Decimal::from(200));
    }

    #[test]
    fn test_order_total_sums_lines() {
        let lines = vec![line("shirt", 2, 100, 10), line("jeans", 3, 50, 10)];
        assert_eq!(order_total(&lines), Decimal::from(350));
    }

    #[test]
    fn test_order_total_empty() {
        assert_eq!(order_total(&[]), Decimal::ZERO);
    }
}
