//! Authorization hook for dissemination requests.
//!
//! Decisions belong to an external policy engine. The engine calls it once
//! per request and passes any denial through untouched.

use thiserror::Error;
use time::OffsetDateTime;

use crate::error::StatusClass;
use crate::model::{ObjectState, RequestContext};

/// Deployment identifier reported to the authorizer on the dynamic route,
/// where no deployment is looked up.
pub const DYNAMIC_DEPLOYMENT_PLACEHOLDER: &str = "fedora-system:4";

/// A denial from the authorization collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    /// The subject is known but not permitted.
    #[error("authorization denied: {reason}")]
    Denied {
        /// Reason given by the policy engine.
        reason: String,
    },
    /// The request must be authenticated first.
    #[error("authentication required: {reason}")]
    AuthenticationRequired {
        /// Reason given by the policy engine.
        reason: String,
    },
}

impl AuthorizationError {
    /// Classifies the denial.
    #[must_use]
    pub const fn status(&self) -> StatusClass {
        match self {
            Self::Denied { .. } => StatusClass::Forbidden,
            Self::AuthenticationRequired { .. } => StatusClass::Unauthorized,
        }
    }
}

/// Attributes describing one dissemination for the policy engine.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationRequest<'a> {
    /// Caller context.
    pub context: &'a RequestContext,
    /// Disseminated object.
    pub pid: &'a str,
    /// Requested service definition.
    pub service_definition: &'a str,
    /// Requested method.
    pub method: &'a str,
    /// Requested version time.
    pub as_of: Option<OffsetDateTime>,
    /// State of the object.
    pub object_state: ObjectState,
    /// State of the service definition.
    pub service_definition_state: ObjectState,
    /// Resolved deployment.
    pub deployment: &'a str,
    /// State of the deployment.
    pub deployment_state: ObjectState,
    /// State of the dissemination itself; `None` when unknown.
    pub dissemination_state: Option<ObjectState>,
}

/// Policy enforcement point consulted before any dissemination runs.
pub trait DisseminationAuthorizer {
    /// Permits or denies a dissemination.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthorizationError`] when the request is not permitted.
    fn enforce_dissemination(
        &self,
        request: &AuthorizationRequest<'_>,
    ) -> Result<(), AuthorizationError>;

    /// Permits or denies listing the methods of an object.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthorizationError`] when the request is not permitted.
    fn enforce_list_methods(
        &self,
        _context: &RequestContext,
        _pid: &str,
        _as_of: Option<OffsetDateTime>,
    ) -> Result<(), AuthorizationError> {
        Ok(())
    }
}

/// Authorizer that permits every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermitAll;

impl DisseminationAuthorizer for PermitAll {
    fn enforce_dissemination(
        &self,
        _request: &AuthorizationRequest<'_>,
    ) -> Result<(), AuthorizationError> {
        Ok(())
    }
}
