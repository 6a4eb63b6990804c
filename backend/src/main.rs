//! Main entry point for the ConnectBase backend.
//!
//! This file initializes the Axum web server, sets up the database and the
//! external mail/storage connectors, and registers all API routes and
//! middleware. Connectors are built once at startup and injected as
//! read-only extensions.

use axum::{Extension, Router, middleware, response::Json, routing::get};
use connectbase_backend::api;
use connectbase_backend::api::common::ApiResponse;
use connectbase_backend::auth;
use connectbase_backend::config::Config;
use connectbase_backend::database::Database;
use connectbase_backend::services::email_service::{EmailService, Mailer};
use connectbase_backend::services::storage_service::{ObjectStorage, StorageService};
use connectbase_backend::utils::jwt::JwtUtils;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::init;

#[tokio::main]
async fn main() {
    init();

    let config = Config::from_env().unwrap();
    let db = Database::new(&config).await.unwrap();
    let pool = db.pool().clone();

    let jwt = Arc::new(JwtUtils::new(&config));
    let mailer: Arc<dyn Mailer> = Arc::new(EmailService::new(config.email.clone()).unwrap());
    let storage: Arc<dyn ObjectStorage> = Arc::new(StorageService::new(config.storage.clone()));

    let app = Router::new()
        .route("/", get(root_handler))
        .nest("/auth", auth::routes::auth_router())
        .nest("/api", api::contact::routes::contact_router())
        .layer(middleware::from_fn(auth::middleware::authenticate))
        .layer(Extension(pool))
        .layer(Extension(jwt))
        .layer(Extension(mailer))
        .layer(Extension(storage));

    let bind_address = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&bind_address).await.unwrap();

    info!("Starting ConnectBase server on port {}", config.server_port);
    axum::serve(listener, app).await.unwrap();
}

async fn root_handler() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::success(
        serde_json::json!({
            "service": "ConnectBase Backend",
            "version": "0.1.0"
        }),
        "Welcome to ConnectBase API",
    ))
}
