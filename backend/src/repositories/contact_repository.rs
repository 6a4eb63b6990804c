//! Database repository for contact persistence.
//!
//! List and search queries are always scoped to the owning user's id in
//! SQL; ownership of single rows is enforced by the service layer.

use crate::api::common::PaginationFilter;
use crate::database::models::{Contact, ContactChanges, NewContact};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;

/// Repository for contact database operations.
pub struct ContactRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> ContactRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates a new contact row.
    pub async fn create_contact(&self, contact: NewContact) -> Result<Contact> {
        let now = Utc::now();
        let created = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts
                (user_id, first_name, last_name, title, email, phone, image,
                 created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(contact.user_id)
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.title)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.image)
        .bind(now)
        .bind(now)
        .fetch_one(self.pool)
        .await?;

        Ok(created)
    }

    /// Retrieves a contact by id, regardless of owner.
    pub async fn get_contact_by_id(&self, id: i64) -> Result<Option<Contact>> {
        let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(contact)
    }

    /// Lists a user's contacts, newest first.
    pub async fn get_contacts_by_user_id(
        &self,
        user_id: i64,
        pagination: &PaginationFilter,
    ) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT * FROM contacts
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(pagination.limit() as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(self.pool)
        .await?;

        Ok(contacts)
    }

    /// Total number of contacts owned by a user.
    pub async fn count_contacts_by_user_id(&self, user_id: i64) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contacts WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count as u64)
    }

    /// Case-insensitive keyword search across name, email, title, and phone,
    /// scoped to the owner.
    pub async fn search_contacts(
        &self,
        user_id: i64,
        keyword: &str,
        pagination: &PaginationFilter,
    ) -> Result<Vec<Contact>> {
        let pattern = like_pattern(keyword);
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT * FROM contacts
            WHERE user_id = ?
              AND (LOWER(first_name) LIKE ?
                OR LOWER(last_name) LIKE ?
                OR LOWER(email) LIKE ?
                OR LOWER(title) LIKE ?
                OR LOWER(phone) LIKE ?)
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(pagination.limit() as i64)
        .bind(pagination.offset() as i64)
        .fetch_all(self.pool)
        .await?;

        Ok(contacts)
    }

    /// Number of matches for a keyword search.
    pub async fn count_search_results(&self, user_id: i64, keyword: &str) -> Result<u64> {
        let pattern = like_pattern(keyword);
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM contacts
            WHERE user_id = ?
              AND (LOWER(first_name) LIKE ?
                OR LOWER(last_name) LIKE ?
                OR LOWER(email) LIKE ?
                OR LOWER(title) LIKE ?
                OR LOWER(phone) LIKE ?)
            "#,
        )
        .bind(user_id)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_one(self.pool)
        .await?;

        Ok(count as u64)
    }

    /// Applies a partial update; absent fields keep their current values.
    ///
    /// The image column is special-cased: when `changes.image` is set, the
    /// inner value is written as-is, `NULL` included.
    pub async fn update_contact(&self, id: i64, changes: ContactChanges) -> Result<Contact> {
        let set_image = changes.image.is_some();
        let image = changes.image.flatten();

        let updated = sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts
            SET first_name = COALESCE(?, first_name),
                last_name = COALESCE(?, last_name),
                title = COALESCE(?, title),
                email = COALESCE(?, email),
                phone = COALESCE(?, phone),
                image = CASE WHEN ? THEN ? ELSE image END,
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.title)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(set_image)
        .bind(&image)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(updated)
    }

    /// Deletes a contact row.
    pub async fn delete_contact(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM contacts WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}

fn like_pattern(keyword: &str) -> String {
    format!("%{}%", keyword.to_lowercase())
}
