//! Error type for the CLI runtime and its exit-code mapping.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use dissem_core::registry::RegistryError;
use dissem_core::{DisseminationError, StatusClass};

use crate::telemetry::TelemetryError;

/// Exit status for failures without a more specific class.
pub(crate) const EXIT_INTERNAL: u8 = 1;
/// Exit status for malformed requests and command lines.
pub(crate) const EXIT_BAD_REQUEST: u8 = 2;
/// Exit status when the object, service, or method does not exist.
pub(crate) const EXIT_NOT_FOUND: u8 = 3;
/// Exit status when the caller is not allowed to disseminate.
pub(crate) const EXIT_NOT_PERMITTED: u8 = 4;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("failed to read snapshot {path}: {source}")]
    ReadSnapshot { path: String, source: io::Error },
    #[error("failed to parse snapshot {path}: {source}")]
    ParseSnapshot {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid default disseminator: {0}")]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Dissemination(#[from] DisseminationError),
    #[error("failed to serialise method listing: {0}")]
    SerialiseMethods(serde_json::Error),
    #[error("failed to write output: {0}")]
    WriteOutput(io::Error),
}

impl AppError {
    /// Maps the failure to the process exit status.
    pub(crate) const fn exit_status(&self) -> u8 {
        match self {
            Self::CliUsage(_) => EXIT_BAD_REQUEST,
            Self::Dissemination(error) => match error.status() {
                StatusClass::BadRequest => EXIT_BAD_REQUEST,
                StatusClass::NotFound => EXIT_NOT_FOUND,
                StatusClass::Unauthorized | StatusClass::Forbidden => EXIT_NOT_PERMITTED,
                StatusClass::Internal => EXIT_INTERNAL,
            },
            Self::LoadConfiguration(_)
            | Self::Telemetry(_)
            | Self::ReadSnapshot { .. }
            | Self::ParseSnapshot { .. }
            | Self::Registry(_)
            | Self::SerialiseMethods(_)
            | Self::WriteOutput(_) => EXIT_INTERNAL,
        }
    }
}
