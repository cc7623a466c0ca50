//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::classifier::ExclusionRules;
use crate::config::AppConfig;
use crate::error::Error;

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `connect_timeout_ms` is less than 100ms or exceeds 60 seconds
    /// - `user_agent` is empty
    /// - any excluded URL pattern is not a valid regex
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "connect_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }
        if self.connect_timeout_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "connect_timeout_ms".into(),
                reason: "must not exceed 60 seconds (60000ms)".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if let Err(Error::InvalidPattern { pattern, reason }) = ExclusionRules::from_config(self) {
            return Err(ConfigError::Invalid { field: "excluded_urls".into(), reason: format!("{pattern}: {reason}") });
        }

        if self.enabled && self.edge_nodes().is_empty() {
            tracing::warn!("edge cache is enabled but no servers are configured; purges will be skipped");
        }

        Ok(())
    }
}
