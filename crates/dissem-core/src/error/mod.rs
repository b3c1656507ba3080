//! Domain errors raised while resolving and executing disseminations.
//!
//! Every failure is terminal for the request: nothing is retried and no
//! partial result is returned. [`DisseminationError::status`] classifies each
//! error so the layer wrapping the engine can map it to a transport status.

use thiserror::Error;

use crate::authorization::AuthorizationError;
use crate::executor::ExecutionError;
use crate::repository::RepositoryError;

/// Errors surfaced by the dissemination engine.
#[derive(Debug, Error)]
pub enum DisseminationError {
    /// Two content models of the object resolve to different deployments.
    #[error(
        "more than one deployment ({first}, {second}) found for service \
         '{service_definition}' in model '{content_model}'"
    )]
    AmbiguousDeployment {
        /// Requested service definition.
        service_definition: String,
        /// Content model that produced the second candidate.
        content_model: String,
        /// Deployment found first.
        first: String,
        /// Conflicting deployment.
        second: String,
    },

    /// No deployment implements the service for the object.
    #[error("deployment not found: {reason}")]
    DeploymentNotFound {
        /// Which of the two not-found cases applies.
        reason: DeploymentNotFoundReason,
    },

    /// The deployment has no operation binding for the method.
    #[error("method '{method}' is not bound by deployment '{deployment}'")]
    MethodNotFound {
        /// Requested method.
        method: String,
        /// Resolved deployment.
        deployment: String,
    },

    /// Caller-supplied parameters violate the method contract.
    #[error(
        "invalid parameters for method '{method}': {}",
        join_violations(.violations)
    )]
    InvalidParameters {
        /// Requested method.
        method: String,
        /// Every violation found, in detection order.
        violations: Vec<ParameterViolation>,
    },

    /// The authorization collaborator refused the request.
    #[error(transparent)]
    AuthorizationDenied(#[from] AuthorizationError),

    /// A dynamic dispatch was attempted for an unregistered identifier.
    #[error("service definition '{service_definition}' has no dynamic handler")]
    DynamicServiceNotRegistered {
        /// Requested service definition.
        service_definition: String,
    },

    /// The dynamic handler does not implement the method.
    #[error("dynamic service '{service_definition}' does not implement method '{method}'")]
    DynamicMethodNotFound {
        /// Requested service definition.
        service_definition: String,
        /// Requested method.
        method: String,
    },

    /// A datastream required by a built-in handler is absent.
    #[error("datastream '{datastream}' not found in object '{pid}'")]
    DatastreamNotFound {
        /// Object that was searched.
        pid: String,
        /// Missing datastream id.
        datastream: String,
    },

    /// A built-in handler could not encode its output.
    #[error("failed to encode dissemination output: {0}")]
    EncodeOutput(#[source] serde_json::Error),

    /// The object store failed or lacked a requested object.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The dissemination executor failed.
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl DisseminationError {
    /// Classifies the error for the wrapping transport layer.
    #[must_use]
    pub const fn status(&self) -> StatusClass {
        match self {
            Self::DeploymentNotFound { .. }
            | Self::MethodNotFound { .. }
            | Self::DatastreamNotFound { .. } => StatusClass::NotFound,
            Self::InvalidParameters { .. } => StatusClass::BadRequest,
            Self::AuthorizationDenied(error) => error.status(),
            Self::Repository(error) => error.status(),
            Self::AmbiguousDeployment { .. }
            | Self::DynamicServiceNotRegistered { .. }
            | Self::DynamicMethodNotFound { .. }
            | Self::EncodeOutput(_)
            | Self::Execution(_) => StatusClass::Internal,
        }
    }

    /// Creates an invalid-parameters error.
    pub fn invalid_parameters(
        method: impl Into<String>,
        violations: Vec<ParameterViolation>,
    ) -> Self {
        Self::InvalidParameters {
            method: method.into(),
            violations,
        }
    }

    /// Creates a method-not-found error.
    pub fn method_not_found(method: impl Into<String>, deployment: impl Into<String>) -> Self {
        Self::MethodNotFound {
            method: method.into(),
            deployment: deployment.into(),
        }
    }

    /// Creates a dynamic method-not-found error.
    pub fn dynamic_method_not_found(
        service_definition: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self::DynamicMethodNotFound {
            service_definition: service_definition.into(),
            method: method.into(),
        }
    }
}

/// Why no deployment could be found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeploymentNotFoundReason {
    /// None of the object's content models declares the service.
    #[error("object '{pid}' does not have a model with service '{service_definition}'")]
    NoModelWithService {
        /// Disseminated object.
        pid: String,
        /// Requested service definition.
        service_definition: String,
    },
    /// A content model declares the service but no deployment serves it.
    #[error("no deployment found for service '{service_definition}' in model '{content_model}'")]
    NoDeploymentForModel {
        /// Requested service definition.
        service_definition: String,
        /// Content model declaring the service.
        content_model: String,
    },
}

/// A single breach of a method's parameter contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParameterViolation {
    /// A required parameter was not supplied.
    #[error("the required parameter \"{name}\" was not supplied")]
    MissingRequired {
        /// Parameter name.
        name: String,
    },
    /// A parameter was supplied to a method that declares none.
    #[error("the parameter \"{name}\" is not valid: the method declares no user parameters")]
    Unexpected {
        /// Parameter name.
        name: String,
    },
    /// A parameter name matches no declared parameter.
    #[error("the parameter \"{name}\" is not declared by the method")]
    Unknown {
        /// Parameter name.
        name: String,
    },
    /// A value lies outside the declared domain.
    #[error(
        "the value \"{value}\" is not allowed for parameter \"{name}\"; allowed values are: {}",
        .allowed.join(", ")
    )]
    OutOfDomain {
        /// Parameter name.
        name: String,
        /// Rejected value.
        value: String,
        /// Declared domain.
        allowed: Vec<String>,
    },
}

impl ParameterViolation {
    /// Returns the name of the offending parameter.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::MissingRequired { name }
            | Self::Unexpected { name }
            | Self::Unknown { name }
            | Self::OutOfDomain { name, .. } => name,
        }
    }
}

fn join_violations(violations: &[ParameterViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Transport-neutral status classes for engine errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// The request was malformed.
    BadRequest,
    /// The caller must authenticate.
    Unauthorized,
    /// The caller is not permitted.
    Forbidden,
    /// A referenced entity does not exist.
    NotFound,
    /// Repository misconfiguration or internal failure.
    Internal,
}

impl StatusClass {
    /// Returns the equivalent HTTP status code.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::Internal => 500,
        }
    }
}

#[cfg(test)]
mod tests;
