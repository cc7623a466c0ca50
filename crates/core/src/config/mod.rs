//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHOPEDGE_*)
//! 2. TOML config file (if SHOPEDGE_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! List-valued settings are kept in their raw admin form (newline- or
//! comma-separated text) and split by the accessor methods.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHOPEDGE_*)
/// 2. TOML config file (if SHOPEDGE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Whether the edge cache feature is enabled.
    ///
    /// Set via SHOPEDGE_ENABLED environment variable. When false, neither
    /// cookies nor purges are issued.
    #[serde(default)]
    pub enabled: bool,

    /// Regex patterns matched against the request path and query string,
    /// one per line.
    ///
    /// Set via SHOPEDGE_EXCLUDED_URLS environment variable.
    #[serde(default)]
    pub excluded_urls: String,

    /// Route names that are never cached, one per line.
    ///
    /// Set via SHOPEDGE_EXCLUDED_ROUTES environment variable.
    #[serde(default)]
    pub excluded_routes: String,

    /// Edge node hostnames, comma-separated.
    ///
    /// Set via SHOPEDGE_SERVERS environment variable.
    #[serde(default)]
    pub servers: String,

    /// Connect timeout for purge requests in milliseconds.
    ///
    /// Set via SHOPEDGE_CONNECT_TIMEOUT_MS environment variable.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// User-Agent string for purge requests.
    ///
    /// Set via SHOPEDGE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Path to a TOML catalog snapshot.
    ///
    /// Set via SHOPEDGE_CATALOG_PATH environment variable.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_user_agent() -> String {
    "shopedge/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            excluded_urls: String::new(),
            excluded_routes: String::new(),
            servers: String::new(),
            connect_timeout_ms: default_connect_timeout_ms(),
            user_agent: default_user_agent(),
            catalog_path: None,
        }
    }
}

/// Split a newline-separated admin field, dropping blank lines.
fn non_blank_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

impl AppConfig {
    /// Connect timeout as Duration for use with reqwest.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Excluded URL patterns in configured order.
    pub fn excluded_url_patterns(&self) -> Vec<String> {
        non_blank_lines(&self.excluded_urls)
    }

    /// Excluded route names in configured order.
    pub fn excluded_route_names(&self) -> Vec<String> {
        non_blank_lines(&self.excluded_routes)
    }

    /// Edge node hosts. Empty entries are skipped.
    pub fn edge_nodes(&self) -> Vec<String> {
        self.servers
            .split(',')
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHOPEDGE_`
    /// 2. TOML file from `SHOPEDGE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHOPEDGE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHOPEDGE_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Catalog snapshot path, required by commands that resolve entities.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if no catalog path is configured.
    pub fn require_catalog_path(&self) -> Result<&PathBuf, ConfigError> {
        self.catalog_path.as_ref().ok_or_else(|| ConfigError::Missing {
            field: "catalog_path".into(),
            hint: "Set SHOPEDGE_CATALOG_PATH environment variable".into(),
        })
    }
}
