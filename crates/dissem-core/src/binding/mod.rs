//! Datastream binding for a resolved deployment.
//!
//! Each bind rule of the deployment names a datastream, either on the
//! disseminated object or on an explicit target object. The resolver fetches
//! that datastream as of the requested time and produces one
//! [`DatastreamBindingInfo`] per rule that could be satisfied. Rules whose
//! datastream does not exist at that time are skipped without error.

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::DISSEMINATION_TARGET;
use crate::error::DisseminationError;
use crate::model::{
    ControlGroup, Datastream, DatastreamBindRule, DigitalObject, MethodParameterDefinition,
    ObjectState, OperationBinding, ServiceDeployment,
};
use crate::repository::RepositoryReader;

/// A bind rule joined with the datastream it resolved to.
///
/// Every record produced for one call carries the same method parameters,
/// address, operation location, and protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatastreamBindingInfo {
    /// Binding key from the rule.
    pub key: String,
    /// Object the datastream was read from.
    pub pid: String,
    /// Datastream id.
    pub datastream_id: String,
    /// Datastream version id.
    pub version_id: String,
    /// Content location.
    pub location: String,
    /// Content control group.
    pub control_group: ControlGroup,
    /// Datastream state.
    pub state: ObjectState,
    /// MIME type of the content.
    pub mime_type: String,
    /// Version creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// Formal parameters of the method.
    pub method_parameters: Vec<MethodParameterDefinition>,
    /// Service address from the operation binding.
    pub address: String,
    /// Operation path template.
    pub operation_location: String,
    /// Invocation protocol.
    pub protocol: String,
}

impl DatastreamBindingInfo {
    fn new(
        rule: &DatastreamBindRule,
        pid: &str,
        datastream: Datastream,
        op: &OperationBinding,
    ) -> Self {
        Self {
            key: rule.key.clone(),
            pid: pid.to_owned(),
            datastream_id: datastream.id,
            version_id: datastream.version_id,
            location: datastream.location,
            control_group: datastream.control_group,
            state: datastream.state,
            mime_type: datastream.mime_type,
            created: datastream.created,
            method_parameters: op.parameters.clone(),
            address: op.address.clone(),
            operation_location: op.operation_location.clone(),
            protocol: op.protocol.clone(),
        }
    }
}

/// Turns a deployment's bind rules into concrete binding records.
#[derive(Debug)]
pub struct DatastreamBindingResolver<'r, R: ?Sized> {
    reader: &'r R,
}

impl<'r, R: RepositoryReader + ?Sized> DatastreamBindingResolver<'r, R> {
    /// Creates a resolver over the given store.
    #[must_use]
    pub const fn new(reader: &'r R) -> Self {
        Self { reader }
    }

    /// Builds the binding records for `method` in bind-rule order.
    ///
    /// # Errors
    ///
    /// Returns [`DisseminationError::MethodNotFound`] when the deployment does
    /// not bind `method`, or a repository error when a lookup fails.
    pub fn build_bindings(
        &self,
        object: &DigitalObject,
        deployment: &ServiceDeployment,
        method: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Result<Vec<DatastreamBindingInfo>, DisseminationError> {
        let operation = deployment
            .operation(method)
            .ok_or_else(|| DisseminationError::method_not_found(method, &deployment.pid))?;

        let mut bindings = Vec::with_capacity(deployment.bind_rules.len());
        for rule in &deployment.bind_rules {
            let target = rule.target_pid.as_deref().unwrap_or(&object.pid);
            match self.reader.datastream(target, &rule.key, as_of)? {
                Some(datastream) => {
                    bindings.push(DatastreamBindingInfo::new(
                        rule, target, datastream, operation,
                    ));
                }
                None => {
                    warn!(
                        target: DISSEMINATION_TARGET,
                        deployment = %deployment.pid,
                        key = %rule.key,
                        pid = target,
                        "bound datastream absent; skipping rule"
                    );
                }
            }
        }

        debug!(
            target: DISSEMINATION_TARGET,
            deployment = %deployment.pid,
            method,
            rules = deployment.bind_rules.len(),
            bound = bindings.len(),
            "datastream bindings assembled"
        );
        Ok(bindings)
    }
}
