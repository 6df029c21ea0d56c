//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The
//! `.env` file is used for local development.

use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// Origin allowed by CORS (the web client).
    pub allowed_origin: String,
    /// Upper bound for a single uploaded image, in bytes.
    pub max_upload_bytes: usize,
    /// Region used for building default public object URLs.
    pub s3_region: String,
    /// Overrides the `https://{bucket}.s3.{region}...` public URL scheme,
    /// for S3-compatible stores behind a CDN or custom domain.
    pub s3_public_url_base: Option<String>,
    /// Lifetime of an auth session, in days.
    pub session_days: i64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for
    /// development, but this is skipped in test environments to ensure tests
    /// are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let allowed_origin = std::env::var("ALLOWED_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let max_upload_bytes = match std::env::var("MAX_UPLOAD_BYTES") {
            Ok(raw) => raw.parse::<usize>().map_err(|e| {
                ConfigError::InvalidValue("MAX_UPLOAD_BYTES".to_string(), e.to_string())
            })?,
            Err(_) => gramseva_core::validation::MAX_IMAGE_BYTES,
        };

        let s3_region = std::env::var("S3_REGION").unwrap_or_else(|_| "ap-south-1".to_string());
        let s3_public_url_base = std::env::var("S3_PUBLIC_URL_BASE").ok();

        let session_days = match std::env::var("SESSION_DAYS") {
            Ok(raw) => raw.parse::<i64>().map_err(|e| {
                ConfigError::InvalidValue("SESSION_DAYS".to_string(), e.to_string())
            })?,
            Err(_) => 30,
        };

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            allowed_origin,
            max_upload_bytes,
            s3_region,
            s3_public_url_base,
            session_days,
        })
    }

    /// A config suitable for tests: no environment access, no database.
    pub fn for_tests() -> Self {
        Self {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            database_url: String::new(),
            log_level: Level::WARN,
            allowed_origin: "http://localhost:3000".to_string(),
            max_upload_bytes: gramseva_core::validation::MAX_IMAGE_BYTES,
            s3_region: "ap-south-1".to_string(),
            s3_public_url_base: None,
            session_days: 30,
        }
    }
}
