//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, JWT signing material, and credentials for
//! the outbound SMTP and object-storage collaborators.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub jwt_secret: String,
    pub access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
    pub server_port: u16,
    pub email: EmailConfig,
    pub storage: StorageConfig,
}

/// SMTP settings for the outbound mail sender.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_name: String,
    pub from_email: String,
}

/// Credentials for the Cloudinary-style object-storage API.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub cloud_name: String,
    pub upload_preset: String,
    pub api_key: String,
    pub api_secret: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET not set")?;

        // Access tokens live 15 minutes, refresh tokens 7 days.
        let access_token_ttl_seconds = env::var("ACCESS_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "900".to_string())
            .parse::<u64>()
            .context("ACCESS_TOKEN_TTL_SECONDS must be a valid number")?;

        let refresh_token_ttl_seconds = env::var("REFRESH_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "604800".to_string())
            .parse::<u64>()
            .context("REFRESH_TOKEN_TTL_SECONDS must be a valid number")?;

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let email = EmailConfig {
            smtp_host: env::var("SMTP_HOST").context("SMTP_HOST not set")?,
            smtp_port: env::var("SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse::<u16>()
                .context("SMTP_PORT must be a valid number")?,
            smtp_username: env::var("SMTP_USERNAME").context("SMTP_USERNAME not set")?,
            smtp_password: env::var("SMTP_PASSWORD").context("SMTP_PASSWORD not set")?,
            from_name: env::var("MAIL_FROM_NAME")
                .unwrap_or_else(|_| "ConnectBase Support".to_string()),
            from_email: env::var("MAIL_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@connectbase.com".to_string()),
        };

        let storage = StorageConfig {
            cloud_name: env::var("CLOUDINARY_CLOUD_NAME").context("CLOUDINARY_CLOUD_NAME not set")?,
            upload_preset: env::var("CLOUDINARY_UPLOAD_PRESET")
                .context("CLOUDINARY_UPLOAD_PRESET not set")?,
            api_key: env::var("CLOUDINARY_API_KEY").context("CLOUDINARY_API_KEY not set")?,
            api_secret: env::var("CLOUDINARY_API_SECRET")
                .context("CLOUDINARY_API_SECRET not set")?,
        };

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            jwt_secret,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            server_port,
            email,
            storage,
        })
    }
}
