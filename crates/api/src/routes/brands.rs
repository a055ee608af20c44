//! Brand route handlers.

use axum::Json;
use serde::Serialize;
use tracing::instrument;

/// A carried brand.
#[derive(Serialize)]
pub struct Brand {
    pub name: &'static str,
}

/// Brands featured on the storefront.
const BRANDS: &[&str] = &["Versace", "Zara", "Gucci", "Prada", "Calvin Klein"];

/// List the featured brands.
#[instrument]
pub async fn index() -> Json<Vec<Brand>> {
    Json(BRANDS.iter().map(|&name| Brand { name }).collect())
}
