//! Service definitions, service deployments, and their method contracts.
//!
//! A service definition declares abstract methods. A service deployment
//! implements one service definition for one or more content models: it maps
//! every method to an operation binding and declares which datastreams feed
//! the operation.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::ObjectState;

/// Where a method parameter's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterKind {
    /// Supplied by the caller.
    #[serde(rename = "U", alias = "user")]
    UserInput,
    /// Filled from a bound datastream.
    #[serde(rename = "D", alias = "datastream")]
    DatastreamInput,
    /// Fixed by the deployment.
    #[serde(rename = "C", alias = "default")]
    DefaultInput,
}

impl ParameterKind {
    /// Returns the single-letter kind code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UserInput => "U",
            Self::DatastreamInput => "D",
            Self::DefaultInput => "C",
        }
    }
}

/// Formal declaration of one method parameter.
///
/// # Example
///
/// ```
/// use dissem_core::model::{MethodParameterDefinition, ParameterKind};
///
/// let param = MethodParameterDefinition::user_input("format")
///     .required()
///     .with_default("png")
///     .with_domain(["png", "jpeg"]);
/// assert_eq!(param.kind, ParameterKind::UserInput);
/// assert_eq!(param.default_value.as_deref(), Some("png"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodParameterDefinition {
    /// Parameter name.
    pub name: String,
    /// Value source.
    pub kind: ParameterKind,
    /// Whether the caller must supply the parameter.
    #[serde(default)]
    pub required: bool,
    /// Value substituted when the supplied value is empty.
    #[serde(default)]
    pub default_value: Option<String>,
    /// Allowed values; a leading `"null"` entry accepts anything.
    #[serde(default)]
    pub domain_values: Vec<String>,
    /// Human-readable label.
    #[serde(default)]
    pub label: Option<String>,
}

impl MethodParameterDefinition {
    /// Creates an optional parameter of the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default_value: None,
            domain_values: Vec::new(),
            label: None,
        }
    }

    /// Creates an optional caller-supplied parameter.
    #[must_use]
    pub fn user_input(name: impl Into<String>) -> Self {
        Self::new(name, ParameterKind::UserInput)
    }

    /// Marks the parameter as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets the allowed values.
    #[must_use]
    pub fn with_domain<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domain_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Returns `true` when callers may set this parameter.
    #[must_use]
    pub fn is_user_input(&self) -> bool {
        self.kind == ParameterKind::UserInput
    }
}

/// Abstract method declared by a service definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDefinition {
    /// Method name.
    pub name: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: Option<String>,
    /// Formal parameters.
    #[serde(default)]
    pub parameters: Vec<MethodParameterDefinition>,
}

impl MethodDefinition {
    /// Creates a method with no parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            parameters: Vec::new(),
        }
    }

    /// Sets the formal parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<MethodParameterDefinition>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// A service definition object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// Persistent identifier.
    pub pid: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// Lifecycle state.
    #[serde(default)]
    pub state: ObjectState,
    /// Declared methods.
    #[serde(default)]
    pub methods: Vec<MethodDefinition>,
}

impl ServiceDefinition {
    /// Looks up a method by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodDefinition> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// How one method is invoked on a deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationBinding {
    /// Method name.
    pub method: String,
    /// Service base address, or `LOCAL` for the repository itself.
    pub address: String,
    /// Operation path template, with `(NAME)` placeholders.
    pub operation_location: String,
    /// Invocation protocol, for example `http`.
    pub protocol: String,
    /// Formal parameters the deployment accepts for this method.
    #[serde(default)]
    pub parameters: Vec<MethodParameterDefinition>,
}

/// One datastream input declared by a deployment.
///
/// The binding key is also the datastream id looked up on the target object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatastreamBindRule {
    /// Binding key and datastream id.
    pub key: String,
    /// Object supplying the datastream; the disseminated object when absent.
    #[serde(default)]
    pub target_pid: Option<String>,
    /// Human-readable label.
    #[serde(default)]
    pub label: Option<String>,
}

impl DatastreamBindRule {
    /// Creates a rule bound to the disseminated object.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target_pid: None,
            label: None,
        }
    }

    /// Binds the rule to an explicit object.
    #[must_use]
    pub fn targeting(mut self, pid: impl Into<String>) -> Self {
        self.target_pid = Some(pid.into());
        self
    }
}

/// A service deployment object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDeployment {
    /// Persistent identifier.
    pub pid: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// Lifecycle state.
    #[serde(default)]
    pub state: ObjectState,
    /// Service definition this deployment implements.
    pub service_definition: String,
    /// Content models this deployment serves.
    #[serde(default)]
    pub content_models: Vec<String>,
    /// Operation-binding table.
    #[serde(default)]
    pub operations: Vec<OperationBinding>,
    /// Datastream bind rules in declaration order.
    #[serde(default)]
    pub bind_rules: Vec<DatastreamBindRule>,
}

impl ServiceDeployment {
    /// Looks up the operation binding for a method.
    #[must_use]
    pub fn operation(&self, method: &str) -> Option<&OperationBinding> {
        self.operations.iter().find(|op| op.method == method)
    }
}

/// One method available on an object, as reported by method listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMethods {
    /// Object the method applies to.
    pub pid: String,
    /// Service definition declaring the method.
    pub service_definition: String,
    /// Method name.
    pub method: String,
    /// Formal parameters.
    pub parameters: Vec<MethodParameterDefinition>,
    /// Time the listing applies to.
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub as_of: Option<OffsetDateTime>,
}
