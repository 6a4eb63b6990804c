//! Shared API response types and error mapping.
//!
//! Provides the uniform response envelope, pagination support for list
//! endpoints, and the conversion between service-layer errors and HTTP
//! responses.
//!
//! # Response Format
//! Every endpoint returns the same JSON envelope containing:
//! - `success`: whether the request succeeded
//! - `message`: human-readable summary
//! - `data`: payload, when present
//! - `timestamp`: server time of the response
//!
//! # Error Handling Flow
//! 1. Service layer returns a domain `ServiceError`
//! 2. `service_error_to_http` converts it to a status code and envelope
//! 3. Internal/database failures are logged for operators and reported
//!    generically, never as a stack trace to the caller

use crate::errors::ServiceError;
use axum::Json;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// HTTP error shape shared by all handlers; serializes as JSON.
pub type ApiError = (StatusCode, Json<ApiResponse<()>>);

/// Standard API response wrapper for all endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    pub message: String,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Pagination metadata (present for paginated responses)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
    /// Request timestamp
    pub timestamp: String,
}

/// Pagination metadata for list responses
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationMeta {
    /// Current page number (1-indexed)
    pub current_page: u32,
    /// Number of items per page
    pub per_page: u32,
    /// Total number of items across all pages
    pub total_items: u64,
    /// Total number of pages
    pub total_pages: u32,
    /// Whether there is a next page
    pub has_next: bool,
    /// Whether there is a previous page
    pub has_prev: bool,
}

/// Error details for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error type identifier
    pub error_type: String,
    /// Field-specific validation errors when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

/// Field-specific validation error details
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the field with validation error
    pub field: String,
    /// Description of the validation failure
    pub message: String,
}

/// Pagination parameters for requests
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct PaginationFilter {
    /// Page number (1-indexed)
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    /// Number of items per page
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
}

impl PaginationMeta {
    /// Create pagination metadata from page parameters and total count
    pub fn new(current_page: u32, per_page: u32, total_items: u64) -> Self {
        let total_pages = if total_items == 0 {
            1
        } else {
            ((total_items - 1) / per_page as u64 + 1) as u32
        };

        Self {
            current_page,
            per_page,
            total_items,
            total_pages,
            has_next: current_page < total_pages,
            has_prev: current_page > 1,
        }
    }

    pub fn from_filter(filter: &PaginationFilter, total_items: u64) -> Self {
        Self::new(filter.page(), filter.per_page(), total_items)
    }
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            pagination: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a successful response with no payload
    pub fn message(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: true,
            data: None,
            message: message.into(),
            error: None,
            pagination: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create a successful paginated response
    pub fn paginated(data: T, pagination: PaginationMeta, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            pagination: Some(pagination),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create an error response
    pub fn error(
        message: impl Into<String>,
        error_type: impl Into<String>,
        details: Option<Vec<FieldError>>,
    ) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: message.into(),
            error: Some(ErrorDetails {
                error_type: error_type.into(),
                details,
            }),
            pagination: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl PaginationFilter {
    /// Get page number with default
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    /// Get per_page with default
    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(10)
    }

    /// Calculate offset for database queries
    pub fn offset(&self) -> u64 {
        (self.page().saturating_sub(1) as u64) * self.per_page() as u64
    }

    /// Get limit for database queries
    pub fn limit(&self) -> u64 {
        self.per_page() as u64
    }
}

impl Default for PaginationFilter {
    fn default() -> Self {
        Self {
            page: Some(1),
            per_page: Some(10),
        }
    }
}

/// Converts ServiceError to appropriate HTTP response with standard format
pub fn service_error_to_http(error: ServiceError) -> ApiError {
    let (status, error_type, message) = match error {
        ServiceError::Validation { message } => {
            (StatusCode::BAD_REQUEST, "validation_error", message)
        }
        ServiceError::NotFound { entity, identifier } => (
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{entity} '{identifier}' not found"),
        ),
        ServiceError::DuplicateEmail { .. } => (
            StatusCode::CONFLICT,
            "duplicate_email",
            "Email already exists".to_string(),
        ),
        ServiceError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            "invalid_credentials",
            "Invalid email or password".to_string(),
        ),
        ServiceError::InvalidOrExpiredCode => (
            StatusCode::BAD_REQUEST,
            "invalid_code",
            "Invalid or expired verification code".to_string(),
        ),
        ServiceError::InvalidToken { message } => {
            tracing::debug!("Rejected token: {message}");
            (
                StatusCode::UNAUTHORIZED,
                "invalid_token",
                "Invalid or expired token".to_string(),
            )
        }
        ServiceError::Forbidden { message } => (StatusCode::FORBIDDEN, "forbidden", message),
        ServiceError::Upstream { service, message } => {
            tracing::error!("Upstream {service} failure: {message}");
            (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                format!("{service} service is unavailable"),
            )
        }
        ServiceError::Database { source } => {
            tracing::error!("Database error: {source}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "An internal error occurred".to_string(),
            )
        }
        ServiceError::Internal { message } => {
            tracing::error!("Internal error: {message}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            )
        }
    };

    (status, Json(ApiResponse::<()>::error(message, error_type, None)))
}

/// Collapses validator output into a single `Validation` service error.
pub fn validation_error(errors: validator::ValidationErrors) -> ServiceError {
    let messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                format!(
                    "{}: {}",
                    field,
                    error.message.as_ref().unwrap_or(&"Invalid value".into())
                )
            })
        })
        .collect();

    ServiceError::validation(messages.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta_calculation() {
        let meta = PaginationMeta::new(2, 10, 25);
        assert_eq!(meta.current_page, 2);
        assert_eq!(meta.per_page, 10);
        assert_eq!(meta.total_items, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        // Empty result set still reports one page
        let meta = PaginationMeta::new(1, 10, 0);
        assert_eq!(meta.total_pages, 1);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn test_pagination_filter() {
        let filter = PaginationFilter {
            page: Some(2),
            per_page: Some(50),
        };
        assert_eq!(filter.page(), 2);
        assert_eq!(filter.per_page(), 50);
        assert_eq!(filter.offset(), 50);
        assert_eq!(filter.limit(), 50);
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (ServiceError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (ServiceError::InvalidOrExpiredCode, StatusCode::BAD_REQUEST),
            (
                ServiceError::duplicate_email("a@x.com"),
                StatusCode::CONFLICT,
            ),
            (
                ServiceError::not_found("User", "a@x.com"),
                StatusCode::NOT_FOUND,
            ),
            (
                ServiceError::invalid_token("expired"),
                StatusCode::UNAUTHORIZED,
            ),
            (ServiceError::forbidden("nope"), StatusCode::FORBIDDEN),
            (
                ServiceError::upstream("mail", "down"),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (error, expected) in cases {
            let (status, Json(body)) = service_error_to_http(error);
            assert_eq!(status, expected);
            assert!(!body.success);
            assert!(body.error.is_some());
        }
    }

    #[test]
    fn test_internal_errors_are_generic() {
        let (status, Json(body)) = service_error_to_http(ServiceError::internal("secret detail"));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.message.contains("secret detail"));
        assert_eq!(body.message, "An internal error occurred");
    }

    #[test]
    fn test_pagination_filter_rejects_out_of_range() {
        let filter = PaginationFilter {
            page: Some(0),
            per_page: Some(10),
        };
        assert!(filter.validate().is_err());

        let filter = PaginationFilter {
            page: Some(1),
            per_page: Some(10_000),
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_offset_saturates_at_page_zero() {
        let filter = PaginationFilter {
            page: Some(0),
            per_page: Some(10),
        };
        assert_eq!(filter.offset(), 0);
    }
}
