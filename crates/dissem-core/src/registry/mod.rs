//! Registry of built-in ("dynamic") service implementations.
//!
//! A small, fixed table maps well-known service-definition identifiers to
//! handlers compiled into the engine. Requests for a registered identifier
//! bypass deployment resolution entirely. The table is filled once at start
//! up and only read afterwards, so it can be shared across threads freely.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;

use crate::builtin::DefaultDisseminator;
use crate::error::DisseminationError;
use crate::model::{
    DigitalObject, MethodDefinition, MimeTypedStream, ObjectMethods, RequestContext, normalize_pid,
};
use crate::params::ResolvedParameters;
use crate::repository::RepositoryReader;

/// Errors raised while filling the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The identifier is already bound.
    #[error("service definition '{service_definition}' is already bound to a dynamic handler")]
    Duplicate {
        /// Offending identifier.
        service_definition: String,
    },
    /// The identifier is blank.
    #[error("dynamic service identifier must not be empty")]
    EmptyIdentifier,
}

/// Lists every method available on an object.
///
/// Handlers that describe an object's capabilities use this to reach the
/// method listing without depending on the orchestrator type.
pub trait MethodIndex {
    /// Lists the static and dynamic methods of an object.
    ///
    /// # Errors
    ///
    /// Returns the error raised while reading the object or its models.
    fn list_methods(
        &self,
        context: &RequestContext,
        pid: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Result<Vec<ObjectMethods>, DisseminationError>;
}

/// State a dynamic handler is bound to for one call.
#[derive(Clone, Copy)]
pub struct DynamicContext<'a> {
    /// Caller context.
    pub request: &'a RequestContext,
    /// Disseminated object as of `as_of`.
    pub object: &'a DigitalObject,
    /// Requested version time.
    pub as_of: Option<OffsetDateTime>,
    /// Object store.
    pub reader: &'a dyn RepositoryReader,
    /// Method listing for the object.
    pub methods: &'a dyn MethodIndex,
}

impl std::fmt::Debug for DynamicContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicContext")
            .field("pid", &self.object.pid)
            .field("as_of", &self.as_of)
            .finish_non_exhaustive()
    }
}

/// A built-in service implementation.
///
/// # Example
///
/// ```
/// use dissem_core::error::DisseminationError;
/// use dissem_core::model::{MethodDefinition, MimeTypedStream};
/// use dissem_core::params::ResolvedParameters;
/// use dissem_core::registry::{DynamicContext, DynamicService, DynamicServiceRegistry};
///
/// struct Echo;
///
/// impl DynamicService for Echo {
///     fn methods(&self) -> Vec<MethodDefinition> {
///         vec![MethodDefinition::new("echo")]
///     }
///
///     fn invoke(
///         &self,
///         _method: &str,
///         _parameters: &ResolvedParameters,
///         context: &DynamicContext<'_>,
///     ) -> Result<MimeTypedStream, DisseminationError> {
///         Ok(MimeTypedStream::from_bytes("text/plain", context.object.pid.clone().into_bytes()))
///     }
/// }
///
/// let mut registry = DynamicServiceRegistry::new();
/// registry.register("demo:EchoService", Echo).expect("register");
/// assert!(registry.is_dynamic("demo:EchoService"));
/// ```
pub trait DynamicService: Send + Sync {
    /// Declares the methods the handler implements.
    fn methods(&self) -> Vec<MethodDefinition>;

    /// Invokes one method.
    ///
    /// # Errors
    ///
    /// Returns a [`DisseminationError`] when the method fails.
    fn invoke(
        &self,
        method: &str,
        parameters: &ResolvedParameters,
        context: &DynamicContext<'_>,
    ) -> Result<MimeTypedStream, DisseminationError>;
}

/// Table of dynamic service handlers keyed by service-definition id.
#[derive(Clone, Default)]
pub struct DynamicServiceRegistry {
    services: HashMap<String, Arc<dyn DynamicService>>,
}

impl DynamicServiceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry binding `service_definition` to the
    /// [`DefaultDisseminator`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyIdentifier`] for a blank identifier.
    pub fn with_default_disseminator(service_definition: &str) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.register(service_definition, DefaultDisseminator)?;
        Ok(registry)
    }

    /// Binds a handler to a service-definition identifier. The
    /// `info:fedora/` prefix is stripped before binding.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyIdentifier`] for a blank identifier and
    /// [`RegistryError::Duplicate`] when the identifier is already bound.
    pub fn register(
        &mut self,
        service_definition: impl Into<String>,
        service: impl DynamicService + 'static,
    ) -> Result<(), RegistryError> {
        let raw = service_definition.into();
        let id = normalize_pid(&raw).to_owned();
        if id.is_empty() {
            return Err(RegistryError::EmptyIdentifier);
        }
        if self.services.contains_key(&id) {
            return Err(RegistryError::Duplicate {
                service_definition: id,
            });
        }
        self.services.insert(id, Arc::new(service));
        Ok(())
    }

    /// Returns `true` when the identifier is bound to a handler.
    #[must_use]
    pub fn is_dynamic(&self, service_definition: &str) -> bool {
        self.services.contains_key(normalize_pid(service_definition))
    }

    /// Returns the declaration of a dynamic method.
    #[must_use]
    pub fn method(&self, service_definition: &str, method: &str) -> Option<MethodDefinition> {
        self.services
            .get(normalize_pid(service_definition))?
            .methods()
            .into_iter()
            .find(|m| m.name == method)
    }

    /// Invokes a dynamic method.
    ///
    /// # Errors
    ///
    /// Returns [`DisseminationError::DynamicServiceNotRegistered`] for an
    /// unbound identifier, [`DisseminationError::DynamicMethodNotFound`] when
    /// the handler lacks the method, or the handler's own error.
    pub fn dispatch(
        &self,
        service_definition: &str,
        method: &str,
        parameters: &ResolvedParameters,
        context: &DynamicContext<'_>,
    ) -> Result<MimeTypedStream, DisseminationError> {
        let service = self.services.get(normalize_pid(service_definition)).ok_or_else(|| {
            DisseminationError::DynamicServiceNotRegistered {
                service_definition: service_definition.to_owned(),
            }
        })?;
        if !service.methods().iter().any(|m| m.name == method) {
            return Err(DisseminationError::dynamic_method_not_found(
                service_definition,
                method,
            ));
        }
        service.invoke(method, parameters, context)
    }

    /// Lists the dynamic methods available on an object, ordered by
    /// service-definition id.
    #[must_use]
    pub fn list_methods(&self, pid: &str, as_of: Option<OffsetDateTime>) -> Vec<ObjectMethods> {
        let mut entries: Vec<_> = self.services.iter().collect();
        entries.sort_by(|left, right| left.0.cmp(right.0));
        entries
            .into_iter()
            .flat_map(|(id, service)| {
                service.methods().into_iter().map(move |m| ObjectMethods {
                    pid: pid.to_owned(),
                    service_definition: id.clone(),
                    method: m.name,
                    parameters: m.parameters,
                    as_of,
                })
            })
            .collect()
    }

    /// Returns the number of bound identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` when nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl std::fmt::Debug for DynamicServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&String> = self.services.keys().collect();
        ids.sort();
        f.debug_struct("DynamicServiceRegistry")
            .field("services", &ids)
            .finish()
    }
}
