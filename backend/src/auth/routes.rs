//! Defines the HTTP routes specifically for authentication.
//!
//! Registration, login, and the unauthenticated reset flow are public;
//! the code-issuance, password-change, and profile endpoints require an
//! authenticated identity.

use crate::auth::handlers::*;
use crate::auth::middleware::require_auth;
use axum::{
    Router, middleware,
    routing::{get, post},
};

/// Creates the authentication router with all auth-related routes
pub fn auth_router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        .route(
            "/send-verification-code",
            post(send_verification_code).layer(middleware::from_fn(require_auth)),
        )
        .route(
            "/change-password",
            post(change_password).layer(middleware::from_fn(require_auth)),
        )
        .route("/me", get(me).layer(middleware::from_fn(require_auth)))
}
