//! Domain types.
//!
//! These types represent validated domain objects separate from database row
//! types. They derive `Serialize` and double as the API's response shapes;
//! anything sensitive (password hashes) never appears on them.

pub mod cart;
pub mod catalog;
pub mod comment;
pub mod order;
pub mod user;

pub use cart::{Cart, CartItem, CartProduct};
pub use catalog::{Category, Product, ProductPhoto};
pub use comment::Comment;
pub use order::{Order, OrderItem, ShippingAddress, ShippingDetails};
pub use user::User;
