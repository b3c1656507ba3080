//! Built-in values used when no configuration source sets a field.

use crate::logging::LogFormat;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Service definition served by the built-in default disseminator.
pub const DEFAULT_DISSEMINATOR: &str = "fedora-system:3";

/// Base URL substituted for `LOCAL` service addresses.
pub const DEFAULT_REPOSITORY_BASE_URL: &str = "http://local.fedora.server/fedora";

/// Default log filter expression.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Owned default disseminator identifier.
#[must_use]
pub fn default_disseminator_string() -> String {
    DEFAULT_DISSEMINATOR.to_owned()
}

/// Owned default repository base URL.
#[must_use]
pub fn default_repository_base_url_string() -> String {
    DEFAULT_REPOSITORY_BASE_URL.to_owned()
}
