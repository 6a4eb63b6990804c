//! Core business logic for contact management.
//!
//! Every single-contact operation checks ownership against the
//! authenticated identity before proceeding; list and search queries are
//! scoped to the owner in SQL instead of filtering after the fact.

use crate::api::common::PaginationFilter;
use crate::api::contact::models::{CreateContactRequest, UpdateContactRequest};
use crate::database::models::{Contact, ContactChanges, NewContact, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::contact_repository::ContactRepository;
use crate::services::storage_service::{ObjectStorage, extract_public_id};
use crate::utils::multipart::UploadedFile;
use sqlx::SqlitePool;
use std::sync::Arc;
use validator::Validate;

pub struct ContactService<'a> {
    pool: &'a SqlitePool,
    storage: Arc<dyn ObjectStorage>,
}

impl<'a> ContactService<'a> {
    pub fn new(pool: &'a SqlitePool, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { pool, storage }
    }

    /// Fetches a contact and asserts it belongs to the given user.
    pub async fn get_contact(&self, id: i64, user: &User) -> ServiceResult<Contact> {
        let repo = ContactRepository::new(self.pool);
        let contact = repo
            .get_contact_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Contact", id.to_string()))?;

        if contact.user_id != user.id {
            return Err(ServiceError::forbidden("Unauthorized access to contact"));
        }

        Ok(contact)
    }

    /// Lists the user's contacts with the total count for pagination.
    pub async fn get_all_contacts(
        &self,
        user: &User,
        pagination: &PaginationFilter,
    ) -> ServiceResult<(Vec<Contact>, u64)> {
        let repo = ContactRepository::new(self.pool);
        let contacts = repo
            .get_contacts_by_user_id(user.id, pagination)
            .await?;
        let total = repo
            .count_contacts_by_user_id(user.id)
            .await?;

        Ok((contacts, total))
    }

    /// Keyword search over the user's contacts.
    pub async fn search_contacts(
        &self,
        user: &User,
        keyword: &str,
        pagination: &PaginationFilter,
    ) -> ServiceResult<(Vec<Contact>, u64)> {
        let repo = ContactRepository::new(self.pool);
        let contacts = repo
            .search_contacts(user.id, keyword, pagination)
            .await?;
        let total = repo
            .count_search_results(user.id, keyword)
            .await?;

        Ok((contacts, total))
    }

    /// Creates a contact, uploading the image first when one was supplied.
    ///
    /// Upload failure degrades to a contact without an image.
    pub async fn create_contact(
        &self,
        user: &User,
        request: CreateContactRequest,
        image: Option<UploadedFile>,
    ) -> ServiceResult<Contact> {
        if let Err(errors) = request.validate() {
            return Err(crate::api::common::validation_error(errors));
        }

        let image_url = match image {
            Some(file) => self.storage.upload(file.bytes, &file.filename).await,
            None => None,
        };

        let repo = ContactRepository::new(self.pool);
        let contact = repo
            .create_contact(NewContact {
                user_id: user.id,
                first_name: request.first_name,
                last_name: request.last_name,
                title: request.title,
                email: request.email,
                phone: request.phone,
                image: image_url,
            })
            .await?;

        Ok(contact)
    }

    /// Applies a partial update; replacing the image deletes the old object
    /// from storage first.
    pub async fn update_contact(
        &self,
        id: i64,
        user: &User,
        request: UpdateContactRequest,
        image: Option<UploadedFile>,
    ) -> ServiceResult<Contact> {
        if let Err(errors) = request.validate() {
            return Err(crate::api::common::validation_error(errors));
        }

        let existing = self.get_contact(id, user).await?;

        // When a replacement was supplied the upload result is written
        // as-is; a failed upload clears the column since the old object
        // is already gone.
        let image_update = match image {
            Some(file) => {
                if let Some(old_url) = &existing.image {
                    if let Some(public_id) = extract_public_id(old_url) {
                        self.storage.delete(&public_id).await;
                    }
                }
                Some(self.storage.upload(file.bytes, &file.filename).await)
            }
            None => None,
        };

        let repo = ContactRepository::new(self.pool);
        let updated = repo
            .update_contact(
                id,
                ContactChanges {
                    first_name: request.first_name,
                    last_name: request.last_name,
                    title: request.title,
                    email: request.email,
                    phone: request.phone,
                    image: image_update,
                },
            )
            .await?;

        Ok(updated)
    }

    /// Deletes a contact and its stored image, if any.
    pub async fn delete_contact(&self, id: i64, user: &User) -> ServiceResult<()> {
        let existing = self.get_contact(id, user).await?;

        if let Some(url) = &existing.image {
            if let Some(public_id) = extract_public_id(url) {
                self.storage.delete(&public_id).await;
            }
        }

        let repo = ContactRepository::new(self.pool);
        repo.delete_contact(id)
            .await?;

        Ok(())
    }
}
