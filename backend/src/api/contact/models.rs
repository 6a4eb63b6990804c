//! Request DTOs for contact endpoints.

use serde::Deserialize;
use validator::Validate;

/// Fields for a new contact, assembled from the multipart form.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateContactRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,

    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,
}

/// Partial update for a contact; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateContactRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    #[validate(email(message = "A valid email is required"))]
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Query parameters for the contact search endpoint.
#[derive(Debug, Deserialize, Validate)]
pub struct SearchFilter {
    #[validate(length(min = 1, message = "Search query is required"))]
    pub query: String,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
}
