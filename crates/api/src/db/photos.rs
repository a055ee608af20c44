//! Product photo repository: ordered photo lists with a single primary photo.
//!
//! Every product's photos carry a dense 1-based `sort_order` and exactly one
//! `is_primary = true` row (when any photos exist at all). Neither invariant
//! is backed by a database constraint - the slide-reorder would transiently
//! violate a non-deferrable unique index - so each public operation here runs
//! as one transaction that restores both invariants before committing. The
//! owning product row is locked `FOR UPDATE` first, which serializes
//! concurrent photo operations per product.
//!
//! The product's denormalized `primary_photo_url` is updated in the same
//! transaction whenever the resolved primary changes.

use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use copper_fox_core::{PhotoId, ProductId};

use super::RepositoryError;
use crate::models::ProductPhoto;

/// Errors from photo operations.
#[derive(Debug, Error)]
pub enum PhotoError {
    /// The referenced product does not exist.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The referenced photo does not exist.
    #[error("photo {0} not found")]
    NotFound(PhotoId),

    /// A product with photos must keep exactly one primary photo.
    #[error("at least one photo must be primary")]
    LastPrimary,

    /// Reorder target outside the product's current `1..=N` range.
    #[error("sort order {requested} is outside the valid range 1..={count}")]
    OrderOutOfRange { requested: i32, count: i64 },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PhotoError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Fields accepted when adding a photo.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub product_id: ProductId,
    pub url: String,
    pub size_bytes: i64,
    pub is_primary: bool,
}

/// Changes accepted by [`PhotoRepository::update`].
#[derive(Debug, Clone, Default)]
pub struct UpdatePhoto {
    pub sort_order: Option<i32>,
    pub is_primary: Option<bool>,
}

// =============================================================================
// Pure planning helpers
// =============================================================================

/// Sort order assigned to a photo appended after `current_max` existing
/// positions (0 when the product has no photos yet).
const fn next_sort_order(current_max: i32) -> i32 {
    current_max + 1
}

/// A product's first photo is always primary; later photos only on request.
const fn resolve_create_primary(existing_count: i64, requested: bool) -> bool {
    existing_count == 0 || requested
}

/// Sibling shift that keeps the sequence dense when one photo moves.
///
/// Rows with `lo <= sort_order <= hi` move by `delta`; the moved photo itself
/// is excluded by construction and receives its target in the final write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ReorderShift {
    delta: i32,
    lo: i32,
    hi: i32,
}

impl ReorderShift {
    /// Plan the sibling shift for a move from `old` to `new`.
    ///
    /// Moving to a lower position slides `[new, old)` up by one; moving to a
    /// higher position slides `(old, new]` down by one. `None` when the
    /// position does not change.
    fn plan(old: i32, new: i32) -> Option<Self> {
        match new.cmp(&old) {
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Less => Some(Self {
                delta: 1,
                lo: new,
                hi: old - 1,
            }),
            std::cmp::Ordering::Greater => Some(Self {
                delta: -1,
                lo: old + 1,
                hi: new,
            }),
        }
    }
}

/// Validate a reorder target against the product's photo count.
fn validate_target_order(requested: i32, count: i64) -> Result<(), PhotoError> {
    if requested < 1 || i64::from(requested) > count {
        return Err(PhotoError::OrderOutOfRange { requested, count });
    }
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

const PHOTO_COLUMNS: &str =
    "id, product_id, url, size_bytes, sort_order, is_primary, created_at, updated_at";

/// Repository for product photo operations.
pub struct PhotoRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PhotoRepository<'a> {
    /// Create a new photo repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a photo by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PhotoId) -> Result<Option<ProductPhoto>, RepositoryError> {
        let photo = sqlx::query_as::<_, ProductPhoto>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM product_photos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(photo)
    }

    /// List a product's photos in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductPhoto>, RepositoryError> {
        let photos = sqlx::query_as::<_, ProductPhoto>(&format!(
            "SELECT {PHOTO_COLUMNS} FROM product_photos
             WHERE product_id = $1 ORDER BY sort_order ASC"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(photos)
    }

    /// Append a photo to a product's list.
    ///
    /// The new photo lands at `max(sort_order) + 1`. A product's first photo
    /// is primary regardless of the flag; an explicitly primary later photo
    /// demotes the current primary before insertion.
    ///
    /// # Errors
    ///
    /// Returns `PhotoError::ProductNotFound` if the product doesn't exist.
    pub async fn create(&self, new: &NewPhoto) -> Result<ProductPhoto, PhotoError> {
        let mut tx = self.pool.begin().await?;

        lock_product(&mut tx, new.product_id).await?;

        let current_max = sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(sort_order), 0) FROM product_photos WHERE product_id = $1",
        )
        .bind(new.product_id)
        .fetch_one(&mut *tx)
        .await?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM product_photos WHERE product_id = $1",
        )
        .bind(new.product_id)
        .fetch_one(&mut *tx)
        .await?;

        let sort_order = next_sort_order(current_max);
        let is_primary = resolve_create_primary(existing, new.is_primary);

        if is_primary {
            sqlx::query(
                "UPDATE product_photos SET is_primary = FALSE, updated_at = NOW()
                 WHERE product_id = $1 AND is_primary",
            )
            .bind(new.product_id)
            .execute(&mut *tx)
            .await?;
        }

        let photo = sqlx::query_as::<_, ProductPhoto>(&format!(
            "INSERT INTO product_photos (product_id, url, size_bytes, sort_order, is_primary)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {PHOTO_COLUMNS}"
        ))
        .bind(new.product_id)
        .bind(&new.url)
        .bind(new.size_bytes)
        .bind(sort_order)
        .bind(is_primary)
        .fetch_one(&mut *tx)
        .await?;

        if is_primary {
            set_primary_photo_url(&mut tx, new.product_id, Some(&new.url)).await?;
        }

        tx.commit().await?;

        Ok(photo)
    }

    /// Change a photo's position and/or primary flag.
    ///
    /// Reordering slides the siblings between the old and new position by one
    /// to keep the sequence dense. Promoting demotes the current primary
    /// first; demoting promotes the lowest-ordered other photo, and fails
    /// with [`PhotoError::LastPrimary`] when no other photo exists.
    ///
    /// # Errors
    ///
    /// Returns `PhotoError::NotFound` if the photo doesn't exist.
    /// Returns `PhotoError::OrderOutOfRange` for targets outside `1..=N`.
    /// Returns `PhotoError::LastPrimary` when demoting the sole photo.
    pub async fn update(&self, id: PhotoId, changes: &UpdatePhoto) -> Result<ProductPhoto, PhotoError> {
        let mut tx = self.pool.begin().await?;

        let photo = fetch_photo(&mut tx, id)
            .await?
            .ok_or(PhotoError::NotFound(id))?;

        lock_product(&mut tx, photo.product_id)
            .await
            .map_err(|e| match e {
                // The product row is gone only if the photo was orphaned.
                PhotoError::ProductNotFound(_) => PhotoError::Repository(
                    RepositoryError::DataCorruption(format!(
                        "photo {id} references missing product {}",
                        photo.product_id
                    )),
                ),
                other => other,
            })?;

        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM product_photos WHERE product_id = $1",
        )
        .bind(photo.product_id)
        .fetch_one(&mut *tx)
        .await?;

        // Slide siblings if the photo moves.
        let sort_order = match changes.sort_order {
            Some(target) if target != photo.sort_order => {
                validate_target_order(target, count)?;
                if let Some(shift) = ReorderShift::plan(photo.sort_order, target) {
                    sqlx::query(
                        "UPDATE product_photos
                         SET sort_order = sort_order + $2, updated_at = NOW()
                         WHERE product_id = $1 AND id <> $3
                           AND sort_order BETWEEN $4 AND $5",
                    )
                    .bind(photo.product_id)
                    .bind(shift.delta)
                    .bind(id)
                    .bind(shift.lo)
                    .bind(shift.hi)
                    .execute(&mut *tx)
                    .await?;
                }
                target
            }
            Some(target) => target,
            None => photo.sort_order,
        };

        // Resolve the primary flag, preserving the singleton invariant.
        let mut new_primary_url: Option<Option<String>> = None;
        let is_primary = match changes.is_primary {
            Some(true) if !photo.is_primary => {
                sqlx::query(
                    "UPDATE product_photos SET is_primary = FALSE, updated_at = NOW()
                     WHERE product_id = $1 AND is_primary AND id <> $2",
                )
                .bind(photo.product_id)
                .bind(id)
                .execute(&mut *tx)
                .await?;
                new_primary_url = Some(Some(photo.url.clone()));
                true
            }
            Some(false) if photo.is_primary => {
                let successor = sqlx::query_as::<_, (PhotoId, String)>(
                    "SELECT id, url FROM product_photos
                     WHERE product_id = $1 AND id <> $2
                     ORDER BY sort_order ASC LIMIT 1",
                )
                .bind(photo.product_id)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

                let (successor_id, successor_url) = successor.ok_or(PhotoError::LastPrimary)?;

                sqlx::query(
                    "UPDATE product_photos SET is_primary = TRUE, updated_at = NOW()
                     WHERE id = $1",
                )
                .bind(successor_id)
                .execute(&mut *tx)
                .await?;
                new_primary_url = Some(Some(successor_url));
                false
            }
            Some(explicit) => explicit,
            None => photo.is_primary,
        };

        // The final write always re-asserts the resolved flag.
        let updated = sqlx::query_as::<_, ProductPhoto>(&format!(
            "UPDATE product_photos
             SET sort_order = $2, is_primary = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {PHOTO_COLUMNS}"
        ))
        .bind(id)
        .bind(sort_order)
        .bind(is_primary)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(url) = new_primary_url {
            set_primary_photo_url(&mut tx, photo.product_id, url.as_deref()).await?;
        }

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a photo and compact its siblings' order.
    ///
    /// Deleting the primary promotes the lowest-ordered sibling; deleting the
    /// last photo leaves the product with none, which is valid.
    ///
    /// # Errors
    ///
    /// Returns `PhotoError::NotFound` if the photo doesn't exist.
    pub async fn remove(&self, id: PhotoId) -> Result<(), PhotoError> {
        let mut tx = self.pool.begin().await?;

        let photo = fetch_photo(&mut tx, id)
            .await?
            .ok_or(PhotoError::NotFound(id))?;

        sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
            .bind(photo.product_id)
            .fetch_optional(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM product_photos WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if photo.is_primary {
            let successor = sqlx::query_as::<_, (PhotoId, String)>(
                "SELECT id, url FROM product_photos
                 WHERE product_id = $1
                 ORDER BY sort_order ASC LIMIT 1",
            )
            .bind(photo.product_id)
            .fetch_optional(&mut *tx)
            .await?;

            match successor {
                Some((successor_id, successor_url)) => {
                    sqlx::query(
                        "UPDATE product_photos SET is_primary = TRUE, updated_at = NOW()
                         WHERE id = $1",
                    )
                    .bind(successor_id)
                    .execute(&mut *tx)
                    .await?;
                    set_primary_photo_url(&mut tx, photo.product_id, Some(&successor_url)).await?;
                }
                None => {
                    set_primary_photo_url(&mut tx, photo.product_id, None).await?;
                }
            }
        }

        // Compact: everything after the removed position slides down by one.
        sqlx::query(
            "UPDATE product_photos SET sort_order = sort_order - 1, updated_at = NOW()
             WHERE product_id = $1 AND sort_order > $2",
        )
        .bind(photo.product_id)
        .bind(photo.sort_order)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }
}

/// Lock the owning product row, serializing photo operations per product.
async fn lock_product(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
) -> Result<(), PhotoError> {
    sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?
        .map(|_| ())
        .ok_or(PhotoError::ProductNotFound(product_id))
}

async fn fetch_photo(
    tx: &mut Transaction<'_, Postgres>,
    id: PhotoId,
) -> Result<Option<ProductPhoto>, PhotoError> {
    let photo = sqlx::query_as::<_, ProductPhoto>(&format!(
        "SELECT {PHOTO_COLUMNS} FROM product_photos WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(photo)
}

async fn set_primary_photo_url(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
    url: Option<&str>,
) -> Result<(), PhotoError> {
    sqlx::query("UPDATE products SET primary_photo_url = $2, updated_at = NOW() WHERE id = $1")
        .bind(product_id)
        .bind(url)
        .execute(&mut **tx)
        .await?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_next_sort_order_appends() {
        assert_eq!(next_sort_order(0), 1); // first photo of a product
        assert_eq!(next_sort_order(3), 4);
    }

    #[test]
    fn test_first_photo_is_always_primary() {
        assert!(resolve_create_primary(0, false));
        assert!(resolve_create_primary(0, true));
        assert!(!resolve_create_primary(2, false));
        assert!(resolve_create_primary(2, true));
    }

    #[test]
    fn test_plan_no_move() {
        assert_eq!(ReorderShift::plan(3, 3), None);
    }

    #[test]
    fn test_plan_move_to_lower_shifts_up() {
        // Moving 5 -> 2: photos at 2, 3, 4 each move up by one.
        let shift = ReorderShift::plan(5, 2).unwrap();
        assert_eq!(shift, ReorderShift { delta: 1, lo: 2, hi: 4 });
    }

    #[test]
    fn test_plan_move_to_higher_shifts_down() {
        // Moving 2 -> 5: photos at 3, 4, 5 each move down by one.
        let shift = ReorderShift::plan(2, 5).unwrap();
        assert_eq!(shift, ReorderShift { delta: -1, lo: 3, hi: 5 });
    }

    #[test]
    fn test_plan_adjacent_swap() {
        let shift = ReorderShift::plan(1, 2).unwrap();
        assert_eq!(shift, ReorderShift { delta: -1, lo: 2, hi: 2 });
    }

    #[test]
    fn test_plan_preserves_density() {
        // Applying the planned shift plus the final write yields a permutation
        // of 1..=n for every possible move.
        let n = 6_i32;
        for old in 1..=n {
            for new in 1..=n {
                let mut orders: Vec<i32> = (1..=n).collect();
                if let Some(shift) = ReorderShift::plan(old, new) {
                    for (idx, value) in orders.iter_mut().enumerate() {
                        let original = i32::try_from(idx).unwrap() + 1;
                        if original == old {
                            *value = new; // final write
                        } else if original >= shift.lo && original <= shift.hi {
                            *value += shift.delta;
                        }
                    }
                }
                let mut sorted = orders.clone();
                sorted.sort_unstable();
                let expected: Vec<i32> = (1..=n).collect();
                assert_eq!(sorted, expected, "move {old} -> {new} broke density");
            }
        }
    }

    #[test]
    fn test_validate_target_order() {
        assert!(validate_target_order(1, 3).is_ok());
        assert!(validate_target_order(3, 3).is_ok());
        assert!(matches!(
            validate_target_order(0, 3),
            Err(PhotoError::OrderOutOfRange { requested: 0, count: 3 })
        ));
        assert!(matches!(
            validate_target_order(4, 3),
            Err(PhotoError::OrderOutOfRange { requested: 4, count: 3 })
        ));
    }
}
