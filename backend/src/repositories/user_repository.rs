//! Database repository for user account persistence.
//!
//! Provides lookup, creation, and credential-state updates for the User
//! entity. Email lookups are exact and case-sensitive as stored.

use crate::database::models::{NewUser, User};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

/// Repository for user database operations.
pub struct UserRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new user row.
    ///
    /// The caller has already hashed the password and checked email
    /// uniqueness; the UNIQUE constraint is the final arbiter.
    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users
                (email, password_hash, first_name, last_name, phone, gender, profile_pic,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.gender)
        .bind(&user.profile_pic)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Retrieves a user by email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool)
            .await?;

        Ok(user)
    }

    /// Checks whether an email is already claimed.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(self.pool)
            .await?;

        Ok(count > 0)
    }

    /// Stores a fresh verification-code pair, replacing any outstanding one.
    ///
    /// A single UPDATE keeps the pair atomic per account; the newest code
    /// is the only one ever on record.
    pub async fn set_verification_code(
        &self,
        user_id: i64,
        code: &str,
        expiry: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET verification_code = ?, verification_code_expiry = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(code)
        .bind(expiry)
        .bind(Utc::now())
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Consumes a verification code and stores a new password hash.
    ///
    /// The stored code is part of the WHERE clause, so a code that was
    /// superseded or consumed by a concurrent request cannot win the race.
    /// Returns `true` if the row was updated.
    pub async fn consume_code_and_set_password(
        &self,
        user_id: i64,
        expected_code: &str,
        password_hash: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?,
                verification_code = NULL,
                verification_code_expiry = NULL,
                updated_at = ?
            WHERE id = ? AND verification_code = ?
            "#,
        )
        .bind(password_hash)
        .bind(Utc::now())
        .bind(user_id)
        .bind(expected_code)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
