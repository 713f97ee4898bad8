//! Database configuration for maintenance runs.
//!
//! The connection string is resolved once, up front, and then handed to
//! [`crate::session::with_store`] explicitly. Sources, later ones override:
//!
//! 1. `config/config.toml` (`[database] url = "..."`), optional
//! 2. `BIZDIR__DATABASE__URL` / `BIZDIR__DATABASE__TABLE`
//!
//! `DATABASE_URL` is consulted only when neither sets a URL.

use crate::catalog::CatalogError;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/config.toml";
const FALLBACK_ENV_VAR: &str = "DATABASE_URL";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    /// Catalog table the maintenance operations target.
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    "categories".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            table: default_table(),
        }
    }
}

impl DatabaseConfig {
    /// Build a configuration for an explicit connection string.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            table: default_table(),
        }
    }

    /// Load the database configuration from `config/config.toml`, falling back to env vars.
    ///
    /// A missing URL is reported as [`CatalogError::Configuration`] before any
    /// store access is attempted.
    pub fn load() -> Result<Self, CatalogError> {
        Self::load_with_url(None)
    }

    /// Like [`DatabaseConfig::load`], with `url` replacing whatever URL the
    /// sources carry. Every other setting still comes from the sources.
    pub fn load_with_url(url: Option<&str>) -> Result<Self, CatalogError> {
        let mut db_config = Self::load_sources().map_err(|e| {
            CatalogError::Configuration(format!("failed to read configuration: {}", e))
        })?;

        if let Some(url) = url {
            db_config.url = Some(url.to_string());
        }

        if db_config.url.as_deref().map_or(true, str::is_empty) {
            db_config.url = std::env::var(FALLBACK_ENV_VAR).ok();
        }

        db_config.connection_string()?;
        Ok(db_config)
    }

    fn load_sources() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix("BIZDIR").separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // An unreadable file should not hide a usable environment.
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!(
                        "failed to load {}, falling back to environment: {}",
                        CONFIG_FILE,
                        err
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix("BIZDIR").separator("__"))
                    .build()?
            }
        };

        match settings.get::<DatabaseConfig>("database") {
            Ok(cfg) => Ok(cfg),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// The configured connection string.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Configuration`] when no non-empty URL is set.
    pub fn connection_string(&self) -> Result<&str, CatalogError> {
        match self.url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => Err(CatalogError::Configuration(format!(
                "database URL not provided; set {} or BIZDIR__DATABASE__URL, or add [database] url to {}",
                FALLBACK_ENV_VAR, CONFIG_FILE
            ))),
        }
    }
}
