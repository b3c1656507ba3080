//! Read-only access to the object store.
//!
//! The engine never persists anything. It reads objects, datastreams, and
//! service objects through [`RepositoryReader`], which production code backs
//! with the real object store and tests back with doubles or the
//! [`MemoryRepository`](crate::memory::MemoryRepository).

use thiserror::Error;
use time::OffsetDateTime;

use crate::error::StatusClass;
use crate::model::{Datastream, DigitalObject, ServiceDefinition, ServiceDeployment};

/// Failures reported by the object store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The object does not exist at the requested time.
    #[error("object '{pid}' not found")]
    ObjectNotFound {
        /// Requested object.
        pid: String,
    },
    /// The service definition does not exist.
    #[error("service definition '{pid}' not found")]
    ServiceDefinitionNotFound {
        /// Requested service definition.
        pid: String,
    },
    /// The service deployment does not exist.
    #[error("service deployment '{pid}' not found")]
    ServiceDeploymentNotFound {
        /// Requested deployment.
        pid: String,
    },
    /// The store itself failed.
    #[error("object store failure: {message}")]
    Backend {
        /// Description of the failure.
        message: String,
    },
}

impl RepositoryError {
    /// Classifies the error for the wrapping transport layer.
    #[must_use]
    pub const fn status(&self) -> StatusClass {
        match self {
            Self::ObjectNotFound { .. }
            | Self::ServiceDefinitionNotFound { .. }
            | Self::ServiceDeploymentNotFound { .. } => StatusClass::NotFound,
            Self::Backend { .. } => StatusClass::Internal,
        }
    }

    /// Creates an object-not-found error.
    #[must_use]
    pub fn object_not_found(pid: impl Into<String>) -> Self {
        Self::ObjectNotFound { pid: pid.into() }
    }
}

/// Read access to objects and service objects.
///
/// Every lookup that takes `as_of` answers for that point in time; `None`
/// means "current".
///
/// # Example
///
/// ```
/// use dissem_core::memory::{MemoryRepository, RepositorySnapshot};
/// use dissem_core::repository::RepositoryReader;
///
/// let repository = MemoryRepository::new(RepositorySnapshot::default());
/// assert!(repository.object("demo:1", None).is_err());
/// ```
pub trait RepositoryReader {
    /// Reads an object and its current datastream versions.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::ObjectNotFound`] when the object does not
    /// exist at the requested time.
    fn object(
        &self,
        pid: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Result<DigitalObject, RepositoryError>;

    /// Reads one datastream version, or `None` when it does not exist then.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store fails.
    fn datastream(
        &self,
        pid: &str,
        datastream_id: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Result<Option<Datastream>, RepositoryError>;

    /// Reads the content of a repository-held datastream version.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store fails.
    fn datastream_content(
        &self,
        pid: &str,
        datastream_id: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Result<Option<Vec<u8>>, RepositoryError>;

    /// Lists the service definitions a content model declares.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store fails.
    fn services_for_model(&self, content_model: &str) -> Result<Vec<String>, RepositoryError>;

    /// Lists every deployment serving a service definition for a content
    /// model. More than one entry is a configuration conflict for the caller
    /// to report.
    ///
    /// # Errors
    ///
    /// Returns an error only when the store fails.
    fn lookup_deployments(
        &self,
        content_model: &str,
        service_definition: &str,
    ) -> Result<Vec<String>, RepositoryError>;

    /// Reads a service definition.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::ServiceDefinitionNotFound`] when absent.
    fn service_definition(
        &self,
        pid: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Result<ServiceDefinition, RepositoryError>;

    /// Reads a service deployment.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::ServiceDeploymentNotFound`] when absent.
    fn service_deployment(
        &self,
        pid: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Result<ServiceDeployment, RepositoryError>;
}
