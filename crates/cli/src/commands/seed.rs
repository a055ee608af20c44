//! Seed the database with demo data.
//!
//! Inserts a fixed category tree, then demo users, products, photo lists
//! (photo 1 primary), carts, and reviews with randomized quantities. Running
//! twice without `--fresh` upserts categories and users and adds more
//! products on top.
//!
//! # Usage
//!
//! ```bash
//! cf-cli seed
//! cf-cli seed --fresh
//! ```

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use rand::prelude::*;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use super::migrate::database_url;

/// Password for every seeded demo account.
const DEMO_PASSWORD: &str = "copperfox-demo";

const CATEGORIES: &[(&str, &str)] = &[
    ("T-Shirts", "t-shirts"),
    ("Shirts", "shirts"),
    ("Trousers", "trousers"),
    ("Jeans", "jeans"),
    ("Dresses", "dresses"),
    ("Skirts", "skirts"),
    ("Jackets", "jackets"),
    ("Coats", "coats"),
    ("Shoes", "shoes"),
    ("Accessories", "accessories"),
];

const FIRST_NAMES: &[&str] = &[
    "Ada", "Bruno", "Clara", "Deniz", "Elif", "Felix", "Greta", "Hugo", "Iris", "Jonas",
    "Kara", "Leo", "Mira", "Noah", "Olga", "Pavel", "Quinn", "Rosa", "Sven", "Tara",
];

const LAST_NAMES: &[&str] = &[
    "Adler", "Baker", "Castro", "Dietrich", "Evans", "Fischer", "Garcia", "Hansen",
    "Ivanov", "Jensen", "Keller", "Lindgren", "Moreau", "Novak", "Olsen", "Petrov",
];

const PRODUCT_ADJECTIVES: &[&str] = &[
    "Classic", "Relaxed", "Slim", "Vintage", "Boxy", "Cropped", "Oversized", "Tailored",
    "Washed", "Heavy",
];

const PRODUCT_MATERIALS: &[&str] = &[
    "Cotton", "Linen", "Denim", "Wool", "Corduroy", "Twill", "Jersey", "Flannel",
];

/// Errors from the seed command.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error")]
    PasswordHash,
}

/// Turn free text into a URL-safe slug.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut last_dash = true;
    for c in text.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_matches('-').to_owned()
}

/// Seed the database.
///
/// # Errors
///
/// Returns `SeedError` if the database URL is missing or any insert fails.
pub async fn run(fresh: bool) -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url =
        database_url().map_err(|_| SeedError::MissingEnvVar("SHOP_DATABASE_URL"))?;
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    if fresh {
        info!("Clearing existing data");
        sqlx::query(
            "TRUNCATE product_comments, order_items, shipping_addresses, orders,
                      cart_items, carts, product_photos, products, categories, users
             RESTART IDENTITY CASCADE",
        )
        .execute(&pool)
        .await?;
    }

    let mut rng = rand::rng();

    let category_ids = seed_categories(&pool).await?;
    info!(count = category_ids.len(), "Categories seeded");

    let user_ids = seed_users(&pool, &mut rng).await?;
    info!(count = user_ids.len(), "Users seeded");

    let product_ids = seed_products(&pool, &mut rng, &category_ids).await?;
    info!(count = product_ids.len(), "Products seeded");

    seed_photos(&pool, &mut rng, &product_ids).await?;
    info!("Photos seeded");

    seed_carts(&pool, &mut rng, &user_ids, &product_ids).await?;
    info!("Carts seeded");

    seed_comments(&pool, &mut rng, &user_ids, &product_ids).await?;
    info!("Comments seeded");

    info!("Seeding complete!");
    Ok(())
}

async fn seed_categories(pool: &PgPool) -> Result<Vec<i32>, SeedError> {
    let mut ids = Vec::with_capacity(CATEGORIES.len());
    for (position, &(name, slug)) in CATEGORIES.iter().enumerate() {
        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO categories (name, slug, sort_order)
             VALUES ($1, $2, $3)
             ON CONFLICT (slug) DO UPDATE SET name = EXCLUDED.name
             RETURNING id",
        )
        .bind(name)
        .bind(slug)
        .bind(i32::try_from(position).unwrap_or(0) + 1)
        .fetch_one(pool)
        .await?;
        ids.push(id);
    }
    Ok(ids)
}

async fn seed_users(pool: &PgPool, rng: &mut impl Rng) -> Result<Vec<i32>, SeedError> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(DEMO_PASSWORD.as_bytes(), &salt)
        .map_err(|_| SeedError::PasswordHash)?
        .to_string();

    let count = rng.random_range(10..=20);
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let first_name = FIRST_NAMES.choose(rng).copied().unwrap_or("Ada");
        let last_name = LAST_NAMES.choose(rng).copied().unwrap_or("Adler");
        let username = format!("{}-{}-{i}", slugify(first_name), slugify(last_name));
        let email = format!("{username}@example.net");

        let id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO users (first_name, last_name, full_name, username, email, password_hash)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (email) DO UPDATE SET updated_at = NOW()
             RETURNING id",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(format!("{first_name} {last_name}"))
        .bind(&username)
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(pool)
        .await?;
        ids.push(id);
    }
    Ok(ids)
}

async fn seed_products(
    pool: &PgPool,
    rng: &mut impl Rng,
    category_ids: &[i32],
) -> Result<Vec<i32>, SeedError> {
    let mut ids = Vec::new();
    for (category_index, &category_id) in category_ids.iter().enumerate() {
        let count = rng.random_range(5..=10);
        for i in 0..count {
            let adjective = PRODUCT_ADJECTIVES.choose(rng).copied().unwrap_or("Classic");
            let material = PRODUCT_MATERIALS.choose(rng).copied().unwrap_or("Cotton");
            let category_name = CATEGORIES
                .get(category_index)
                .map_or("Piece", |&(name, _)| name);
            let name = format!("{adjective} {material} {category_name}");
            let slug = format!("{}-{category_id}-{i}", slugify(&name));
            let price = Decimal::from(rng.random_range(100_i64..=2000));
            let stock: i32 = rng.random_range(0..=40);

            let id = sqlx::query_scalar::<_, i32>(
                "INSERT INTO products
                     (category_id, name, slug, short_description, long_description,
                      price, stock_quantity)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (slug) DO UPDATE SET updated_at = NOW()
                 RETURNING id",
            )
            .bind(category_id)
            .bind(&name)
            .bind(&slug)
            .bind(format!("A {} staple in {}.", adjective.to_lowercase(), material.to_lowercase()))
            .bind(format!(
                "The {name} pairs a {} silhouette with hard-wearing {} cloth.",
                adjective.to_lowercase(),
                material.to_lowercase()
            ))
            .bind(price)
            .bind(stock)
            .fetch_one(pool)
            .await?;
            ids.push(id);
        }
    }
    Ok(ids)
}

async fn seed_photos(
    pool: &PgPool,
    rng: &mut impl Rng,
    product_ids: &[i32],
) -> Result<(), SeedError> {
    for &product_id in product_ids {
        let count: i32 = rng.random_range(1..=3);
        for position in 1..=count {
            let url = format!("https://img.copperfox.store/products/{product_id}/{position}.jpg");
            let size_bytes: i64 = rng.random_range(100_000..=1_000_000);
            let is_primary = position == 1;

            sqlx::query(
                "INSERT INTO product_photos (product_id, url, size_bytes, sort_order, is_primary)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(product_id)
            .bind(&url)
            .bind(size_bytes)
            .bind(position)
            .bind(is_primary)
            .execute(pool)
            .await?;

            if is_primary {
                sqlx::query("UPDATE products SET primary_photo_url = $2 WHERE id = $1")
                    .bind(product_id)
                    .bind(&url)
                    .execute(pool)
                    .await?;
            }
        }
    }
    Ok(())
}

async fn seed_carts(
    pool: &PgPool,
    rng: &mut impl Rng,
    user_ids: &[i32],
    product_ids: &[i32],
) -> Result<(), SeedError> {
    for &user_id in user_ids {
        let cart_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO carts (user_id) VALUES ($1)
             ON CONFLICT (user_id) DO UPDATE SET updated_at = NOW()
             RETURNING id",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        let count = rng.random_range(1..=5);
        for &product_id in product_ids.choose_multiple(rng, count) {
            let quantity: i32 = rng.random_range(1..=3);
            sqlx::query(
                "INSERT INTO cart_items (cart_id, product_id, quantity)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (cart_id, product_id) DO NOTHING",
            )
            .bind(cart_id)
            .bind(product_id)
            .bind(quantity)
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}

async fn seed_comments(
    pool: &PgPool,
    rng: &mut impl Rng,
    user_ids: &[i32],
    product_ids: &[i32],
) -> Result<(), SeedError> {
    for &user_id in user_ids {
        let count = rng.random_range(0..=3);
        for &product_id in product_ids.choose_multiple(rng, count) {
            let rating: i32 = rng.random_range(1..=5);
            sqlx::query(
                "INSERT INTO product_comments (user_id, product_id, title, content, rating)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(user_id)
            .bind(product_id)
            .bind(format!("{rating} star wear test"))
            .bind("Holds up after a season of regular rotation.")
            .bind(rating)
            .execute(pool)
            .await?;
        }
    }

    // Bring the denormalized review columns in line with what was inserted.
    sqlx::query(
        "UPDATE products p
         SET comment_count = stats.cnt,
             average_rating = stats.avg_rating
         FROM (
             SELECT product_id,
                    COUNT(*) AS cnt,
                    ROUND(AVG(rating), 2) AS avg_rating
             FROM product_comments
             GROUP BY product_id
         ) AS stats
         WHERE p.id = stats.product_id",
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Classic Cotton T-Shirt"), "classic-cotton-t-shirt");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("  Washed -- Denim  "), "washed-denim");
    }

    #[test]
    fn test_slugify_strips_non_ascii() {
        assert_eq!(slugify("Crème Brûlée"), "cr-me-br-l-e");
    }
}
