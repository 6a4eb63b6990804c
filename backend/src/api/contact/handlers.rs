//! Handler functions for contact CRUD and search endpoints.
//!
//! Every handler resolves the authenticated identity to its account row
//! first; ownership of individual contacts is then enforced by
//! `ContactService` before any mutation.

use crate::api::common::{
    ApiError, ApiResponse, PaginationFilter, PaginationMeta, service_error_to_http,
    validation_error,
};
use crate::api::contact::models::{CreateContactRequest, SearchFilter, UpdateContactRequest};
use crate::auth::middleware::Identity;
use crate::database::models::{Contact, User};
use crate::errors::ServiceError;
use crate::repositories::user_repository::UserRepository;
use crate::services::contact_service::ContactService;
use crate::services::storage_service::ObjectStorage;
use crate::utils::multipart::FormData;
use axum::{
    extract::{Extension, Multipart, Path, Query},
    http::StatusCode,
    response::Json as ResponseJson,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use validator::Validate;

/// Resolves the request identity to its full account row.
async fn current_user(pool: &SqlitePool, identity: &Identity) -> Result<User, ApiError> {
    let repo = UserRepository::new(pool);
    repo.get_user_by_email(&identity.email)
        .await
        .map_err(|e| service_error_to_http(e.into()))?
        .ok_or_else(|| service_error_to_http(ServiceError::not_found("User", &identity.email)))
}

/// List the authenticated user's contacts with pagination.
#[axum::debug_handler]
pub async fn get_contacts(
    Extension(pool): Extension<SqlitePool>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    Extension(identity): Extension<Identity>,
    Query(pagination): Query<PaginationFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Contact>>>, ApiError> {
    if let Err(errors) = pagination.validate() {
        return Err(service_error_to_http(validation_error(errors)));
    }

    let user = current_user(&pool, &identity).await?;

    let contact_service = ContactService::new(&pool, storage);
    let (contacts, total) = contact_service
        .get_all_contacts(&user, &pagination)
        .await
        .map_err(service_error_to_http)?;

    let meta = PaginationMeta::from_filter(&pagination, total);
    Ok(ResponseJson(ApiResponse::paginated(
        contacts,
        meta,
        "Contacts retrieved successfully",
    )))
}

/// Keyword search over the authenticated user's contacts.
#[axum::debug_handler]
pub async fn search_contacts(
    Extension(pool): Extension<SqlitePool>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    Extension(identity): Extension<Identity>,
    Query(filter): Query<SearchFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Contact>>>, ApiError> {
    if let Err(errors) = filter.validate() {
        return Err(service_error_to_http(validation_error(errors)));
    }

    let user = current_user(&pool, &identity).await?;

    let pagination = PaginationFilter {
        page: filter.page,
        per_page: filter.per_page,
    };

    let contact_service = ContactService::new(&pool, storage);
    let (contacts, total) = contact_service
        .search_contacts(&user, &filter.query, &pagination)
        .await
        .map_err(service_error_to_http)?;

    let meta = PaginationMeta::from_filter(&pagination, total);
    Ok(ResponseJson(ApiResponse::paginated(
        contacts,
        meta,
        "Search completed successfully",
    )))
}

/// Retrieve a single contact owned by the authenticated user.
#[axum::debug_handler]
pub async fn get_contact_by_id(
    Extension(pool): Extension<SqlitePool>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<Contact>>, ApiError> {
    let user = current_user(&pool, &identity).await?;

    let contact_service = ContactService::new(&pool, storage);
    match contact_service.get_contact(id, &user).await {
        Ok(contact) => Ok(ResponseJson(ApiResponse::success(
            contact,
            "Contact retrieved successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Create a contact (multipart: fields + optional image).
#[axum::debug_handler]
pub async fn create_contact(
    Extension(pool): Extension<SqlitePool>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    Extension(identity): Extension<Identity>,
    multipart: Multipart,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Contact>>), ApiError> {
    let user = current_user(&pool, &identity).await?;

    let form = FormData::read(multipart)
        .await
        .map_err(service_error_to_http)?;

    let request = CreateContactRequest {
        first_name: form.required("firstName").map_err(service_error_to_http)?,
        last_name: form.required("lastName").map_err(service_error_to_http)?,
        title: form.required("title").map_err(service_error_to_http)?,
        email: form.required("email").map_err(service_error_to_http)?,
        phone: form.required("phone").map_err(service_error_to_http)?,
    };

    let contact_service = ContactService::new(&pool, storage);
    match contact_service.create_contact(&user, request, form.image).await {
        Ok(contact) => Ok((
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(contact, "Contact created successfully")),
        )),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Partially update a contact (multipart; only supplied fields change).
#[axum::debug_handler]
pub async fn update_contact(
    Extension(pool): Extension<SqlitePool>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<ResponseJson<ApiResponse<Contact>>, ApiError> {
    let user = current_user(&pool, &identity).await?;

    let form = FormData::read(multipart)
        .await
        .map_err(service_error_to_http)?;

    let request = UpdateContactRequest {
        first_name: form.optional("firstName"),
        last_name: form.optional("lastName"),
        title: form.optional("title"),
        email: form.optional("email"),
        phone: form.optional("phone"),
    };

    let contact_service = ContactService::new(&pool, storage);
    match contact_service
        .update_contact(id, &user, request, form.image)
        .await
    {
        Ok(contact) => Ok(ResponseJson(ApiResponse::success(
            contact,
            "Contact updated successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}

/// Delete a contact and its stored image.
#[axum::debug_handler]
pub async fn delete_contact(
    Extension(pool): Extension<SqlitePool>,
    Extension(storage): Extension<Arc<dyn ObjectStorage>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let user = current_user(&pool, &identity).await?;

    let contact_service = ContactService::new(&pool, storage);
    match contact_service.delete_contact(id, &user).await {
        Ok(()) => Ok(ResponseJson(ApiResponse::<()>::message(
            "Contact deleted successfully",
        ))),
        Err(error) => Err(service_error_to_http(error)),
    }
}
