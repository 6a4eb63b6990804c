//! HTTP routes for contact management.
//!
//! Every route here requires an authenticated identity.

use crate::api::contact::handlers::*;
use crate::auth::middleware::require_auth;
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

/// Creates the contact router; all routes sit behind `require_auth`.
pub fn contact_router() -> Router {
    Router::new()
        .route("/contacts", get(get_contacts))
        .route("/contacts/search", get(search_contacts))
        .route("/contact/{id}", get(get_contact_by_id))
        .route("/contact/create", post(create_contact))
        .route("/update-contact/{id}", put(update_contact))
        .route("/delete-contact/{id}", delete(delete_contact))
        .layer(middleware::from_fn(require_auth))
}
