//! Global application error types and handlers.
//!
//! This module defines the error taxonomy used across the entire backend
//! and provides helper constructors for consistent error creation. The
//! mapping to HTTP responses lives in `api::common`.

use thiserror::Error;

/// Generic service error covering every failure the core can surface.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Email already exists: {email}")]
    DuplicateEmail { email: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired verification code")]
    InvalidOrExpiredCode,

    #[error("Invalid token: {message}")]
    InvalidToken { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("{service} error: {message}")]
    Upstream { service: String, message: String },

    #[error("Database error: {source}")]
    Database {
        #[from]
        source: anyhow::Error,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    // Helper constructors for common patterns

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }

    pub fn duplicate_email(email: impl Into<String>) -> Self {
        Self::DuplicateEmail {
            email: email.into(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
