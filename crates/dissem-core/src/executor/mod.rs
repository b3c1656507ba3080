//! Hand-off point to the component that produces dissemination content.
//!
//! Once a request is fully resolved the orchestrator passes a
//! [`DisseminationRequest`] to a [`DisseminationExecutor`]. The engine ships
//! one executor, [`InvocationPlanner`](crate::assembly::InvocationPlanner),
//! which assembles the service invocation URL without calling the service.

use thiserror::Error;
use time::OffsetDateTime;

use crate::binding::DatastreamBindingInfo;
use crate::model::{
    DigitalObject, MimeTypedStream, OperationBinding, RequestContext, ServiceDeployment,
};
use crate::params::ResolvedParameters;

/// Failures raised while executing a resolved dissemination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// The operation binding uses a protocol the executor cannot drive.
    #[error("protocol '{protocol}' is not supported for method '{method}'")]
    UnsupportedProtocol {
        /// Declared protocol.
        protocol: String,
        /// Method being executed.
        method: String,
    },
    /// The executor failed.
    #[error("dissemination execution failed: {message}")]
    Failed {
        /// Description of the failure.
        message: String,
    },
}

/// A fully resolved dissemination.
#[derive(Debug, Clone, Copy)]
pub struct DisseminationRequest<'a> {
    /// Caller context.
    pub context: &'a RequestContext,
    /// Disseminated object.
    pub object: &'a DigitalObject,
    /// Requested service definition.
    pub service_definition: &'a str,
    /// Requested method.
    pub method: &'a str,
    /// Requested version time.
    pub as_of: Option<OffsetDateTime>,
    /// Validated caller parameters.
    pub parameters: &'a ResolvedParameters,
    /// Datastream bindings in bind-rule order.
    pub bindings: &'a [DatastreamBindingInfo],
    /// Resolved deployment.
    pub deployment: &'a ServiceDeployment,
    /// Operation binding of the method.
    pub operation: &'a OperationBinding,
}

/// Produces the output stream of a resolved dissemination.
pub trait DisseminationExecutor {
    /// Executes the dissemination.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutionError`] when the content cannot be produced.
    fn execute(&self, request: &DisseminationRequest<'_>)
    -> Result<MimeTypedStream, ExecutionError>;
}
