//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MONGODB_URI` - MongoDB connection string (only for the `mongodb` backend)
//!
//! ## Optional
//! - `MONGODB_DATABASE` - Database name (default: webstore)
//! - `STORE_BACKEND` - `mongodb` or `memory` (default: mongodb)
//! - `API_HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3000)
//! - `APP_ENV` - Environment label for logs and Sentry (default: development)
//! - `CORS_ALLOWED_ORIGINS` - Comma separated origins allowed to call the API
//! - `COLLECTION_ALLOWLIST` - Comma separated collections exposed under
//!   `/collection`, or `*` for any (default: products,orders)
//! - `IMAGES_DIR` - Directory served under `/images` (default: images)
//! - `LOG_FORMAT` - `text` or `json` (default: text)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use activities_core::{CollectionAllowlist, CollectionNameError};
use secrecy::SecretString;
use thiserror::Error;

/// Origins allowed when `CORS_ALLOWED_ORIGINS` is not set.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:8080",
    "https://ahmadjvd.github.io",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Where documents are stored
    pub store: StoreBackend,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Environment label (development, production...)
    pub environment: String,
    /// Origins granted cross-origin access
    pub cors_allowed_origins: Vec<String>,
    /// Collections reachable through the generic gateway
    pub collections: CollectionAllowlist,
    /// Root directory for `/images`
    pub images_dir: PathBuf,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Document store selection.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// MongoDB server or Atlas cluster.
    MongoDb(MongoConfig),
    /// Process-local store, empty at startup.
    Memory,
}

/// MongoDB connection settings.
///
/// Implements `Debug` manually to redact the connection string.
#[derive(Clone)]
pub struct MongoConfig {
    /// Connection string (may embed credentials)
    pub uri: SecretString,
    /// Database holding `products` and `orders`
    pub database: String,
}

impl std::fmt::Debug for MongoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoConfig")
            .field("uri", &"[REDACTED]")
            .field("database", &self.database)
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One flattened JSON object per event
    Json,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store = StoreBackend::from_env()?;
        let host = get_env_or_default("API_HOST", "0.0.0.0")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("API_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let environment = get_env_or_default("APP_ENV", "development");
        let cors_allowed_origins = get_optional_env("CORS_ALLOWED_ORIGINS")
            .map(|value| parse_cors_origins(&value))
            .transpose()?
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.iter().map(ToString::to_string).collect());
        let collections = get_optional_env("COLLECTION_ALLOWLIST")
            .map(|value| parse_allowlist(&value))
            .transpose()?
            .unwrap_or_default();
        let images_dir = PathBuf::from(get_env_or_default("IMAGES_DIR", "images"));
        let log_format = parse_log_format(&get_env_or_default("LOG_FORMAT", "text"))?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            store,
            host,
            port,
            environment,
            cors_allowed_origins,
            collections,
            images_dir,
            log_format,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Configuration for tests and local tooling: in-memory store, defaults
    /// everywhere else.
    #[must_use]
    pub fn for_memory_store() -> Self {
        Self {
            store: StoreBackend::Memory,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            environment: "test".to_string(),
            cors_allowed_origins: DEFAULT_CORS_ORIGINS.iter().map(ToString::to_string).collect(),
            collections: CollectionAllowlist::default(),
            images_dir: PathBuf::from("images"),
            log_format: LogFormat::Text,
            sentry_dsn: None,
        }
    }
}

impl StoreBackend {
    fn from_env() -> Result<Self, ConfigError> {
        match get_env_or_default("STORE_BACKEND", "mongodb").as_str() {
            "mongodb" => Ok(Self::MongoDb(MongoConfig {
                uri: get_required_secret("MONGODB_URI")?,
                database: get_env_or_default("MONGODB_DATABASE", "webstore"),
            })),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::InvalidEnvVar(
                "STORE_BACKEND".to_string(),
                format!("expected mongodb or memory, got {other}"),
            )),
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MongoDb(_) => "mongodb",
            Self::Memory => "memory",
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Split a comma separated value, dropping blank entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Explicit origins only; credentialed CORS cannot be granted to `*`.
fn parse_cors_origins(value: &str) -> Result<Vec<String>, ConfigError> {
    let origins = split_list(value);
    if origins.iter().any(|origin| origin == "*") {
        return Err(ConfigError::InvalidEnvVar(
            "CORS_ALLOWED_ORIGINS".to_string(),
            "wildcard origin is not allowed with credentials; list origins explicitly".to_string(),
        ));
    }
    Ok(origins)
}

fn parse_allowlist(value: &str) -> Result<CollectionAllowlist, ConfigError> {
    CollectionAllowlist::parse(value).map_err(|e: CollectionNameError| {
        ConfigError::InvalidEnvVar("COLLECTION_ALLOWLIST".to_string(), e.to_string())
    })
}

fn parse_log_format(value: &str) -> Result<LogFormat, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "text" => Ok(LogFormat::Text),
        "json" => Ok(LogFormat::Json),
        other => Err(ConfigError::InvalidEnvVar(
            "LOG_FORMAT".to_string(),
            format!("expected text or json, got {other}"),
        )),
    }
}
