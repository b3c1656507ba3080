//! Layered configuration for the dissemination engine binaries.
//!
//! [`Config`] is assembled by `ortho_config` from, in increasing precedence:
//! the built-in defaults, a TOML file named by `--config-path` or
//! `DISSEM_CONFIG_PATH`, `DISSEM_*` environment variables, and command-line
//! flags. A malformed source fails the whole load with the aggregated error.

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_DISSEMINATOR, DEFAULT_LOG_FILTER, DEFAULT_REPOSITORY_BASE_URL, default_log_filter,
    default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved settings shared by the CLI and embedding services.
///
/// # Example
///
/// ```
/// use dissem_config::{Config, LogFormat};
///
/// let config = Config::default();
/// assert_eq!(config.log_filter(), "info");
/// assert_eq!(config.log_format(), LogFormat::Json);
/// assert_eq!(config.default_disseminator(), "fedora-system:3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "DISSEM")]
pub struct Config {
    /// Tracing filter expression, for example `info` or `dissem-core=debug`.
    #[serde(default = "defaults::default_log_filter_string")]
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[serde(default)]
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
    /// Service definition bound to the built-in default disseminator.
    #[serde(default = "defaults::default_disseminator_string")]
    #[ortho_config(default = defaults::default_disseminator_string())]
    pub default_disseminator: String,
    /// Base URL of the repository, used for `LOCAL` addresses and content links.
    #[serde(default = "defaults::default_repository_base_url_string")]
    #[ortho_config(default = defaults::default_repository_base_url_string())]
    pub repository_base_url: String,
}

impl Config {
    /// Returns the tracing filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the service definition of the built-in default disseminator.
    #[must_use]
    pub fn default_disseminator(&self) -> &str {
        &self.default_disseminator
    }

    /// Returns the repository base URL.
    #[must_use]
    pub fn repository_base_url(&self) -> &str {
        &self.repository_base_url
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: defaults::default_log_filter_string(),
            log_format: defaults::default_log_format(),
            default_disseminator: defaults::default_disseminator_string(),
            repository_base_url: defaults::default_repository_base_url_string(),
        }
    }
}
