//! Contact management API domain.

pub mod handlers;
pub mod models;
pub mod routes;
