//! Application settings loaded from `config.toml`.
//!
//! Every section and field has a default, so a missing or empty file still
//! yields a usable configuration. A handful of values can be overridden from
//! the environment (usually via `.env`): `DATABASE_URL` and `JWT_SECRET`.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "ORDER_SERVER_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and version settings
    pub server: ServerConfig,
    /// Storage settings
    pub database: DatabaseConfig,
    /// Secret generation and token settings
    pub security: SecurityConfig,
    /// Catalog feed settings
    pub catalog: CatalogConfig,
    /// Event policy settings
    pub events: EventPolicyConfig,
}

/// `[server]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// Version string reported by `/version`
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// `[database]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SeaORM connection string
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://data/orders.sqlite?mode=rwc".to_string(),
        }
    }
}

/// `[security]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Length of generated secrets and passwords
    pub secret_length: usize,
    /// Characters generated secrets are drawn from
    pub character_list: String,
    /// Token lifetime in hours
    pub token_lifetime_hours: i64,
    /// Fixed signing secret; a random one is generated per run when absent
    pub jwt_secret: Option<String>,
    /// `iss` claim of issued tokens
    pub jwt_issuer: String,
    /// Where the bootstrap administrator credentials are written
    pub admin_credentials_path: PathBuf,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_length: 32,
            character_list: "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789"
                .to_string(),
            token_lifetime_hours: 24,
            jwt_secret: None,
            jwt_issuer: "order-server".to_string(),
            admin_credentials_path: PathBuf::from("admin_credentials.txt"),
        }
    }
}

/// `[catalog]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path of the JSON product feed
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./static/products.json"),
        }
    }
}

/// `[events]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventPolicyConfig {
    /// Seed a default event at startup when none is active
    pub seed_default: bool,
    /// Activating an event deactivates every other event
    pub exclusive_activation: bool,
    /// Ceiling used for events created without one
    pub default_max_order_price: f64,
    /// Days until a new event ends
    pub default_duration_days: i64,
    /// Days until a new event stops taking orders
    pub default_deadline_days: i64,
}

impl Default for EventPolicyConfig {
    fn default() -> Self {
        Self {
            seed_default: true,
            exclusive_activation: true,
            default_max_order_price: 20.0,
            default_duration_days: 7,
            default_deadline_days: 4,
        }
    }
}

/// Loads the configuration from a TOML file.
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load configuration from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    let config: AppConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Loads the application configuration and applies environment overrides.
///
/// The file path comes from `ORDER_SERVER_CONFIG`, falling back to
/// `./config.toml`. A missing file is not an error; defaults are used.
///
/// # Errors
/// Returns an error if the file exists but cannot be parsed.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path =
        std::env::var(CONFIG_PATH_ENV).map_or_else(|_| PathBuf::from("config.toml"), PathBuf::from);

    let mut config = if path.exists() {
        let config = load_config(&path)?;
        tracing::info!("Loaded configuration from {}", path.display());
        config
    } else {
        tracing::warn!(
            "No configuration file at {}, using defaults",
            path.display()
        );
        AppConfig::default()
    };

    if let Ok(url) = std::env::var("DATABASE_URL") {
        config.database.url = url;
    }
    if let Ok(secret) = std::env::var("JWT_SECRET") {
        config.security.jwt_secret = Some(secret);
    }

    Ok(config)
}
