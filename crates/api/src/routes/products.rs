//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use copper_fox_core::{CategoryId, Price, ProductId};

use crate::db::RepositoryError;
use crate::db::photos::PhotoRepository;
use crate::db::products::{NewProduct, ProductRepository, UpdateProduct};
use crate::error::{AppError, Result};
use crate::models::{Product, ProductPhoto};
use crate::state::AppState;

/// Product creation form data.
#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub category_id: i32,
    pub name: String,
    pub slug: String,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub price: Decimal,
    pub stock_quantity: Option<i32>,
    pub primary_photo_url: Option<String>,
}

/// Product update form data.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub category_id: Option<i32>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
}

/// A product with its photo list attached.
#[derive(Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub photos: Vec<ProductPhoto>,
}

fn parse_price(amount: Decimal) -> Result<Price> {
    Price::new(amount).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn validate_stock(stock: i32) -> Result<i32> {
    if stock < 0 {
        return Err(AppError::BadRequest(
            "stock quantity cannot be negative".to_owned(),
        ));
    }
    Ok(stock)
}

async fn with_photos(state: &AppState, product: Product) -> Result<ProductView> {
    let photos = PhotoRepository::new(state.pool())
        .list_for_product(product.id)
        .await?;

    Ok(ProductView { product, photos })
}

/// List all products with their categories and photos.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    let products = ProductRepository::new(state.pool()).list().await?;

    let mut views = Vec::with_capacity(products.len());
    for product in products {
        views.push(with_photos(&state, product).await?);
    }

    Ok(Json(views))
}

/// Get a product by ID.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductView>> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(Json(with_photos(&state, product).await?))
}

/// Get a product by slug.
#[instrument(skip(state))]
pub async fn show_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductView>> {
    let product = ProductRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product '{slug}'")))?;

    Ok(Json(with_photos(&state, product).await?))
}

/// Create a product.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let new = NewProduct {
        category_id: CategoryId::new(form.category_id),
        name: form.name,
        slug: form.slug,
        short_description: form.short_description,
        long_description: form.long_description,
        price: parse_price(form.price)?,
        stock_quantity: validate_stock(form.stock_quantity.unwrap_or(0))?,
        primary_photo_url: form.primary_photo_url,
    };

    let product = ProductRepository::new(state.pool())
        .create(&new)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => {
                AppError::NotFound(format!("category {}", new.category_id))
            }
            other => AppError::Database(other),
        })?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(form): Json<UpdateProductRequest>,
) -> Result<Json<Product>> {
    let changes = UpdateProduct {
        category_id: form.category_id.map(CategoryId::new),
        name: form.name,
        slug: form.slug,
        short_description: form.short_description,
        long_description: form.long_description,
        price: form.price.map(parse_price).transpose()?,
        stock_quantity: form.stock_quantity.map(validate_stock).transpose()?,
    };

    let product = ProductRepository::new(state.pool())
        .update(ProductId::new(id), &changes)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(format!("product {id}")),
            other => AppError::Database(other),
        })?;

    Ok(Json(product))
}

/// Delete a product and everything it owns.
#[instrument(skip(state))]
pub async fn remove(State(state): State<AppState>, Path(id): Path<i32>) -> Result<StatusCode> {
    let deleted = ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await?;

    if !deleted {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}
