//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use copper_fox_core::{CartId, CartItemId, Price, ProductId, UserId};

/// A user's cart with its items and computed totals.
///
/// Created lazily on first access; survives checkout empty (only the items
/// are deleted when an order is placed).
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub items: Vec<CartItem>,
    /// Sum of item quantities.
    pub total_items: i64,
    /// Sum of quantity x current product price.
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line in a cart. Products are unique per cart; adding an existing
/// product merges quantities.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub quantity: i32,
    pub product: CartProduct,
}

/// Product summary attached to a cart line.
#[derive(Debug, Clone, Serialize)]
pub struct CartProduct {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    /// Current catalog price; orders snapshot it at checkout.
    pub price: Price,
    pub stock_quantity: i32,
    pub primary_photo_url: Option<String>,
}
