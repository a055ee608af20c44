//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use copper_fox_core::{Email, UserId};

/// A registered shopper (domain type).
///
/// The password hash lives only in the database and in the auth service;
/// it is never attached to this type.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Denormalized "first last" display name.
    pub full_name: String,
    /// Unique handle.
    pub username: String,
    /// User's email address.
    pub email: Email,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
