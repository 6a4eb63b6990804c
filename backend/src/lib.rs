//! ConnectBase backend library.
//!
//! Exposes the application modules so integration tests can drive the
//! services directly; the binary entry point lives in `main.rs`.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod repositories;
pub mod services;
pub mod utils;
