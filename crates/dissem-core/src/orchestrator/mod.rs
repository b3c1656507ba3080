//! The dissemination state machine.
//!
//! [`Disseminator`] is the public entry point. A request moves through
//! [`Stage`]s in order:
//!
//! ```text
//! RouteCheck -> DynamicInvoke -> Authorize -> ParamValidate -> Execute
//! RouteCheck -> StaticResolve -> Authorize -> ParamValidate
//!            -> BindingAssemble -> Execute
//! ```
//!
//! The first failing stage ends the request with its typed error. Nothing is
//! retried and nothing is cached between calls.

use std::borrow::Cow;

use time::OffsetDateTime;
use tracing::debug;

use crate::DISSEMINATION_TARGET;
use crate::authorization::{
    AuthorizationRequest, DYNAMIC_DEPLOYMENT_PLACEHOLDER, DisseminationAuthorizer,
};
use crate::binding::DatastreamBindingResolver;
use crate::error::DisseminationError;
use crate::executor::{DisseminationExecutor, DisseminationRequest};
use crate::model::{
    MimeTypedStream, ObjectMethods, ObjectState, ParameterMap, RequestContext, normalize_pid,
};
use crate::params::validate_parameters;
use crate::registry::{DynamicContext, DynamicServiceRegistry, MethodIndex};
use crate::repository::RepositoryReader;
use crate::resolver::{DeploymentResolver, candidate_models};

/// Steps of a dissemination request, reported in debug events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Deciding between the dynamic and static routes.
    RouteCheck,
    /// Handing the call to a built-in handler.
    DynamicInvoke,
    /// Resolving the deployment through the content models.
    StaticResolve,
    /// Consulting the authorization collaborator.
    Authorize,
    /// Validating caller parameters.
    ParamValidate,
    /// Binding deployment inputs to datastreams.
    BindingAssemble,
    /// Running the executor or handler.
    Execute,
}

impl Stage {
    /// Returns the label used in log events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RouteCheck => "route-check",
            Self::DynamicInvoke => "dynamic-invoke",
            Self::StaticResolve => "static-resolve",
            Self::Authorize => "authorize",
            Self::ParamValidate => "param-validate",
            Self::BindingAssemble => "binding-assemble",
            Self::Execute => "execute",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dissemination request.
///
/// # Example
///
/// ```
/// use dissem_core::orchestrator::DisseminationQuery;
///
/// let query = DisseminationQuery::new("demo:1", "demo:ImageService", "resize")
///     .with_parameter("width", "200");
/// assert_eq!(query.parameters.get("width").map(String::as_str), Some("200"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisseminationQuery {
    /// Disseminated object.
    pub pid: String,
    /// Requested service definition.
    pub service_definition: String,
    /// Requested method.
    pub method: String,
    /// Caller-supplied parameters; an empty value means "no value".
    pub parameters: ParameterMap,
    /// Version time; `None` for the current version.
    pub as_of: Option<OffsetDateTime>,
}

impl DisseminationQuery {
    /// Creates a query without parameters for the current version.
    #[must_use]
    pub fn new(
        pid: impl Into<String>,
        service_definition: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        Self {
            pid: pid.into(),
            service_definition: service_definition.into(),
            method: method.into(),
            parameters: ParameterMap::new(),
            as_of: None,
        }
    }

    /// Adds one parameter.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Replaces the parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: ParameterMap) -> Self {
        self.parameters = parameters;
        self
    }

    /// Targets the version current at `as_of`.
    #[must_use]
    pub const fn as_of(mut self, as_of: Option<OffsetDateTime>) -> Self {
        self.as_of = as_of;
        self
    }
}

/// Resolves and executes disseminations over injected collaborators.
///
/// # Example
///
/// ```
/// use dissem_core::authorization::PermitAll;
/// use dissem_core::assembly::InvocationPlanner;
/// use dissem_core::memory::{MemoryRepository, RepositorySnapshot};
/// use dissem_core::model::RequestContext;
/// use dissem_core::orchestrator::{Disseminator, DisseminationQuery};
/// use dissem_core::registry::DynamicServiceRegistry;
///
/// let registry = DynamicServiceRegistry::with_default_disseminator("fedora-system:3")
///     .expect("registry");
/// let disseminator = Disseminator::new(
///     MemoryRepository::new(RepositorySnapshot::default()),
///     PermitAll,
///     InvocationPlanner::new("http://localhost:8080/fedora"),
///     registry,
/// );
/// let query = DisseminationQuery::new("demo:missing", "demo:Service", "view");
/// let error = disseminator
///     .get_dissemination(&RequestContext::anonymous(), &query)
///     .expect_err("object is absent");
/// assert_eq!(error.status().http_status(), 404);
/// ```
#[derive(Debug)]
pub struct Disseminator<R, A, X> {
    reader: R,
    authorizer: A,
    executor: X,
    registry: DynamicServiceRegistry,
}

impl<R, A, X> Disseminator<R, A, X> {
    /// Wires the engine to its collaborators.
    #[must_use]
    pub const fn new(
        reader: R,
        authorizer: A,
        executor: X,
        registry: DynamicServiceRegistry,
    ) -> Self {
        Self {
            reader,
            authorizer,
            executor,
            registry,
        }
    }

    /// Returns the dynamic service table.
    #[must_use]
    pub const fn registry(&self) -> &DynamicServiceRegistry {
        &self.registry
    }

    /// Returns the object store.
    #[must_use]
    pub const fn reader(&self) -> &R {
        &self.reader
    }
}

impl<R, A, X> Disseminator<R, A, X>
where
    R: RepositoryReader,
    A: DisseminationAuthorizer,
    X: DisseminationExecutor,
{
    /// Produces the content of one dissemination.
    ///
    /// # Errors
    ///
    /// Returns the typed error of the first stage that fails; see
    /// [`DisseminationError`] for the kinds.
    pub fn get_dissemination(
        &self,
        context: &RequestContext,
        query: &DisseminationQuery,
    ) -> Result<MimeTypedStream, DisseminationError> {
        let routed = normalized(query);
        trace_stage(Stage::RouteCheck, &routed);
        if self.registry.is_dynamic(&routed.service_definition) {
            self.invoke_dynamic(context, &routed)
        } else {
            self.invoke_static(context, &routed)
        }
    }

    /// Lists the methods available on an object: those of every service its
    /// content models declare, followed by the dynamic methods.
    ///
    /// # Errors
    ///
    /// Returns an authorization error, or a repository error when the object
    /// or one of its service definitions cannot be read.
    pub fn list_available_methods(
        &self,
        context: &RequestContext,
        pid: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Result<Vec<ObjectMethods>, DisseminationError> {
        self.authorizer.enforce_list_methods(context, pid, as_of)?;
        let object = self.reader.object(pid, as_of)?;

        let mut seen: Vec<String> = Vec::new();
        let mut methods = Vec::new();
        for model in candidate_models(&object) {
            for declared in self.reader.services_for_model(model)? {
                let sdef = normalize_pid(&declared).to_owned();
                if seen.contains(&sdef) || self.registry.is_dynamic(&sdef) {
                    continue;
                }
                let definition = self.reader.service_definition(&sdef, as_of)?;
                methods.extend(definition.methods.into_iter().map(|m| ObjectMethods {
                    pid: object.pid.clone(),
                    service_definition: sdef.clone(),
                    method: m.name,
                    parameters: m.parameters,
                    as_of,
                }));
                seen.push(sdef);
            }
        }
        methods.extend(self.registry.list_methods(&object.pid, as_of));

        debug!(
            target: DISSEMINATION_TARGET,
            pid = %object.pid,
            services = seen.len(),
            methods = methods.len(),
            "listed available methods"
        );
        Ok(methods)
    }

    fn invoke_dynamic(
        &self,
        context: &RequestContext,
        query: &DisseminationQuery,
    ) -> Result<MimeTypedStream, DisseminationError> {
        trace_stage(Stage::DynamicInvoke, query);
        trace_stage(Stage::Authorize, query);
        self.authorizer.enforce_dissemination(&AuthorizationRequest {
            context,
            pid: &query.pid,
            service_definition: &query.service_definition,
            method: &query.method,
            as_of: query.as_of,
            object_state: ObjectState::Active,
            service_definition_state: ObjectState::Active,
            deployment: DYNAMIC_DEPLOYMENT_PLACEHOLDER,
            deployment_state: ObjectState::Active,
            dissemination_state: None,
        })?;

        let declaration = self
            .registry
            .method(&query.service_definition, &query.method)
            .ok_or_else(|| {
                DisseminationError::dynamic_method_not_found(
                    &query.service_definition,
                    &query.method,
                )
            })?;

        trace_stage(Stage::ParamValidate, query);
        let parameters =
            validate_parameters(&query.method, &declaration.parameters, &query.parameters)?;

        let object = self.reader.object(&query.pid, query.as_of)?;
        let dynamic = DynamicContext {
            request: context,
            object: &object,
            as_of: query.as_of,
            reader: &self.reader,
            methods: self,
        };

        trace_stage(Stage::Execute, query);
        self.registry
            .dispatch(&query.service_definition, &query.method, &parameters, &dynamic)
    }

    fn invoke_static(
        &self,
        context: &RequestContext,
        query: &DisseminationQuery,
    ) -> Result<MimeTypedStream, DisseminationError> {
        trace_stage(Stage::StaticResolve, query);
        let object = self.reader.object(&query.pid, query.as_of)?;
        let deployment_pid =
            DeploymentResolver::new(&self.reader).resolve(&object, &query.service_definition)?;
        let definition = self
            .reader
            .service_definition(&query.service_definition, query.as_of)?;
        let deployment = self.reader.service_deployment(&deployment_pid, query.as_of)?;

        trace_stage(Stage::Authorize, query);
        self.authorizer.enforce_dissemination(&AuthorizationRequest {
            context,
            pid: &object.pid,
            service_definition: &query.service_definition,
            method: &query.method,
            as_of: query.as_of,
            object_state: object.state,
            service_definition_state: definition.state,
            deployment: &deployment.pid,
            deployment_state: deployment.state,
            dissemination_state: None,
        })?;

        let operation = deployment
            .operation(&query.method)
            .ok_or_else(|| DisseminationError::method_not_found(&query.method, &deployment.pid))?;

        trace_stage(Stage::ParamValidate, query);
        let parameters =
            validate_parameters(&query.method, &operation.parameters, &query.parameters)?;

        trace_stage(Stage::BindingAssemble, query);
        let bindings = DatastreamBindingResolver::new(&self.reader).build_bindings(
            &object,
            &deployment,
            &query.method,
            query.as_of,
        )?;

        trace_stage(Stage::Execute, query);
        let request = DisseminationRequest {
            context,
            object: &object,
            service_definition: &query.service_definition,
            method: &query.method,
            as_of: query.as_of,
            parameters: &parameters,
            bindings: &bindings,
            deployment: &deployment,
            operation,
        };
        Ok(self.executor.execute(&request)?)
    }
}

impl<R, A, X> MethodIndex for Disseminator<R, A, X>
where
    R: RepositoryReader,
    A: DisseminationAuthorizer,
    X: DisseminationExecutor,
{
    fn list_methods(
        &self,
        context: &RequestContext,
        pid: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Result<Vec<ObjectMethods>, DisseminationError> {
        self.list_available_methods(context, pid, as_of)
    }
}

/// Strips the `info:fedora/` prefix from the requested service definition so
/// every later stage compares bare identifiers.
fn normalized(query: &DisseminationQuery) -> Cow<'_, DisseminationQuery> {
    let service_definition = normalize_pid(&query.service_definition);
    if service_definition == query.service_definition {
        Cow::Borrowed(query)
    } else {
        Cow::Owned(DisseminationQuery {
            service_definition: service_definition.to_owned(),
            ..query.clone()
        })
    }
}

fn trace_stage(stage: Stage, query: &DisseminationQuery) {
    debug!(
        target: DISSEMINATION_TARGET,
        stage = stage.as_str(),
        pid = %query.pid,
        sdef = %query.service_definition,
        method = %query.method,
        "dissemination stage entered"
    );
}
