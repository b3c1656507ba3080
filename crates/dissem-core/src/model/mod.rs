//! Data model for disseminations.
//!
//! Objects, service definitions, and service deployments are owned by the
//! object store and read-only here. They derive `serde` so snapshots can be
//! loaded from JSON.

mod object;
mod service;
mod stream;


pub use self::object::{ControlGroup, Datastream, DigitalObject, ObjectState};
pub use self::service::{
    DatastreamBindRule, MethodDefinition, MethodParameterDefinition, ObjectMethods,
    OperationBinding, ParameterKind, ServiceDefinition, ServiceDeployment,
};
pub use self::stream::{MimeTypedStream, RequestContext};

/// Caller-supplied method parameters. An empty value stands for "no value".
pub type ParameterMap = std::collections::BTreeMap<String, String>;

/// Prefix carried by content-model URIs.
pub const PID_URI_PREFIX: &str = "info:fedora/";

/// Namespace reserved for system content models.
pub const SYSTEM_NAMESPACE: &str = "fedora-system:";

/// Strips the `info:fedora/` prefix from an identifier.
///
/// # Example
///
/// ```
/// use dissem_core::model::normalize_pid;
///
/// assert_eq!(normalize_pid("info:fedora/demo:Model"), "demo:Model");
/// assert_eq!(normalize_pid("demo:Model"), "demo:Model");
/// ```
#[must_use]
pub fn normalize_pid(identifier: &str) -> &str {
    identifier
        .strip_prefix(PID_URI_PREFIX)
        .unwrap_or(identifier)
        .trim()
}

/// Returns `true` for system content models that never carry deployments.
#[must_use]
pub fn is_reserved_model(pid: &str) -> bool {
    normalize_pid(pid).starts_with(SYSTEM_NAMESPACE)
}
