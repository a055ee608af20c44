//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (pings the database)
//!
//! # Auth (rate limited)
//! POST /api/auth/register              - Create an account
//! POST /api/auth/login                 - Exchange credentials for a bearer token
//! GET  /api/auth/me                    - Current user (requires auth)
//!
//! # Users
//! GET  /api/users                      - List users
//! GET  /api/users/{id}                 - User detail
//! PATCH /api/users/{id}                - Update own profile (requires auth)
//!
//! # Catalog
//! GET  /api/categories                 - List categories
//! POST /api/categories                 - Create category
//! GET/PATCH/DELETE /api/categories/{id}
//! GET  /api/products                   - List products with photos
//! POST /api/products                   - Create product
//! GET/PATCH/DELETE /api/products/{id}
//! GET  /api/products/slug/{slug}       - Product detail by slug
//! GET  /api/products/{id}/photos       - A product's photos in display order
//!
//! # Product photos
//! POST /api/product-photos             - Append a photo
//! PATCH /api/product-photos/{id}       - Reorder / change primary
//! DELETE /api/product-photos/{id}      - Delete and compact
//!
//! # Cart (requires auth)
//! GET  /api/cart                       - Current cart (created lazily)
//! POST /api/cart/items                 - Add a product
//! PATCH /api/cart/items/{id}           - Change quantity (0 removes)
//! DELETE /api/cart/items/{id}          - Remove a line
//! DELETE /api/cart                     - Clear the cart
//!
//! # Orders
//! POST /api/orders                     - Checkout (requires auth)
//! GET  /api/orders                     - Own orders (requires auth)
//! GET  /api/orders/{id}                - Order detail (requires auth, own orders only)
//! PATCH /api/orders/{id}/status        - Status transition (administrative)
//!
//! # Reviews
//! GET  /api/product-comments           - List, filter by product/rating
//! POST /api/product-comments           - Create (requires auth)
//! GET/PATCH/DELETE /api/product-comments/{id}
//!
//! # Misc
//! POST /api/newsletter                 - Subscribe acknowledgment
//! GET  /api/brands                     - Static brand list
//! ```

pub mod auth;
pub mod brands;
pub mod cart;
pub mod categories;
pub mod comments;
pub mod newsletter;
pub mod orders;
pub mod photos;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Create the auth routes router (rate limited).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me))
        .layer(auth_rate_limiter())
}

/// Create the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index))
        .route("/{id}", get(users::show).patch(users::update))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index).post(categories::create))
        .route(
            "/{id}",
            get(categories::show)
                .patch(categories::update)
                .delete(categories::remove),
        )
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{id}",
            get(products::show)
                .patch(products::update)
                .delete(products::remove),
        )
        .route("/slug/{slug}", get(products::show_by_slug))
        .route("/{id}/photos", get(photos::index_for_product))
}

/// Create the product photo routes router.
pub fn photo_routes() -> Router<AppState> {
    Router::new().route("/", post(photos::create)).route(
        "/{id}",
        patch(photos::update).delete(photos::remove),
    )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}", get(orders::show))
        .route("/{id}/status", patch(orders::update_status))
}

/// Create the comment routes router.
pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(comments::index).post(comments::create))
        .route(
            "/{id}",
            get(comments::show)
                .patch(comments::update)
                .delete(comments::remove),
        )
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/users", user_routes())
        .nest("/api/categories", category_routes())
        .nest("/api/products", product_routes())
        .nest("/api/product-photos", photo_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/product-comments", comment_routes())
        .route("/api/newsletter", post(newsletter::subscribe))
        .route("/api/brands", get(brands::index))
}
