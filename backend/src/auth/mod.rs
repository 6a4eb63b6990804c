//! Authentication module for account registration, sessions, and the
//! credential lifecycle.
//!
//! This module provides the public interface for login, registration,
//! the verification-code flows, and the identity middleware.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
