//! Row types and persistence DTOs for the application's entities.
//!
//! `User` and `Contact` mirror the `users` and `contacts` tables. Secret
//! columns (password hash, verification-code pair) are never serialized
//! into API responses.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A registered account.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub gender: String,
    pub profile_pic: Option<String>,
    #[serde(skip_serializing)]
    pub verification_code: Option<String>,
    #[serde(skip_serializing)]
    pub verification_code_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A contact owned by a single user.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new user; the password is already hashed.
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub gender: String,
    pub profile_pic: Option<String>,
}

/// Insert payload for a new contact.
#[derive(Debug)]
pub struct NewContact {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub email: String,
    pub phone: String,
    pub image: Option<String>,
}

/// Partial update for a contact; `None` leaves the column untouched.
///
/// `image` is doubly optional: the outer `None` keeps the current value,
/// `Some(None)` clears it. A replacement upload that fails must not leave
/// the row pointing at an already-deleted object.
#[derive(Debug, Default)]
pub struct ContactChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub image: Option<Option<String>>,
}
