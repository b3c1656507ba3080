//! Shared fixtures, collaborator doubles, and crate-level tests.

use std::cell::RefCell;
use std::rc::Rc;

use mockall::mock;
use time::OffsetDateTime;
use time::macros::datetime;

use crate::authorization::{
    AuthorizationError, AuthorizationRequest, DisseminationAuthorizer, PermitAll,
};
use crate::error::DisseminationError;
use crate::executor::{DisseminationExecutor, DisseminationRequest, ExecutionError};
use crate::memory::{
    ContentModel, MemoryRepository, RepositorySnapshot, StoredDatastream, StoredObject,
};
use crate::model::{
    ControlGroup, Datastream, DatastreamBindRule, DigitalObject, MethodDefinition,
    MethodParameterDefinition, MimeTypedStream, ObjectState, OperationBinding, ParameterKind,
    RequestContext, ServiceDefinition, ServiceDeployment,
};
use crate::orchestrator::{DisseminationQuery, Disseminator};
use crate::registry::DynamicServiceRegistry;
use crate::repository::{RepositoryError, RepositoryReader};


pub(crate) const DEFAULT_SDEF: &str = "fedora-system:3";
pub(crate) const IMAGE_PID: &str = "demo:1";
pub(crate) const IMAGE_MODEL: &str = "demo:ImageModel";
pub(crate) const IMAGE_SDEF: &str = "demo:ImageService";
pub(crate) const IMAGE_DEPLOYMENT: &str = "demo:ImageDeployment";
pub(crate) const BASE_URL: &str = "http://repo.example.org/fedora";

pub(crate) const CREATED: OffsetDateTime = datetime!(2024-01-01 00:00 UTC);
pub(crate) const REVISED: OffsetDateTime = datetime!(2024-06-01 00:00 UTC);

mock! {
    pub Reader {}
    impl RepositoryReader for Reader {
        fn object(
            &self,
            pid: &str,
            as_of: Option<OffsetDateTime>,
        ) -> Result<DigitalObject, RepositoryError>;
        fn datastream(
            &self,
            pid: &str,
            datastream_id: &str,
            as_of: Option<OffsetDateTime>,
        ) -> Result<Option<Datastream>, RepositoryError>;
        fn datastream_content(
            &self,
            pid: &str,
            datastream_id: &str,
            as_of: Option<OffsetDateTime>,
        ) -> Result<Option<Vec<u8>>, RepositoryError>;
        fn services_for_model(&self, content_model: &str) -> Result<Vec<String>, RepositoryError>;
        fn lookup_deployments(
            &self,
            content_model: &str,
            service_definition: &str,
        ) -> Result<Vec<String>, RepositoryError>;
        fn service_definition(
            &self,
            pid: &str,
            as_of: Option<OffsetDateTime>,
        ) -> Result<ServiceDefinition, RepositoryError>;
        fn service_deployment(
            &self,
            pid: &str,
            as_of: Option<OffsetDateTime>,
        ) -> Result<ServiceDeployment, RepositoryError>;
    }
}

// ---------------------------------------------------------------------------
// Model builders
// ---------------------------------------------------------------------------

pub(crate) fn object(pid: &str, models: &[&str]) -> DigitalObject {
    DigitalObject {
        pid: pid.to_owned(),
        label: format!("Object {pid}"),
        state: ObjectState::Active,
        owner_id: Some("fedoraAdmin".to_owned()),
        created: CREATED,
        last_modified: REVISED,
        content_models: models.iter().map(|m| (*m).to_owned()).collect(),
        datastreams: Vec::new(),
    }
}

pub(crate) fn datastream(
    id: &str,
    control_group: ControlGroup,
    location: &str,
    created: OffsetDateTime,
) -> Datastream {
    Datastream {
        id: id.to_owned(),
        version_id: format!("{id}.{}", created.year()),
        label: format!("{id} datastream"),
        mime_type: "image/png".to_owned(),
        control_group,
        location: location.to_owned(),
        state: ObjectState::Active,
        created,
    }
}

pub(crate) fn operation(
    method: &str,
    address: &str,
    location: &str,
    parameters: Vec<MethodParameterDefinition>,
) -> OperationBinding {
    OperationBinding {
        method: method.to_owned(),
        address: address.to_owned(),
        operation_location: location.to_owned(),
        protocol: "http".to_owned(),
        parameters,
    }
}

pub(crate) fn deployment(
    pid: &str,
    sdef: &str,
    models: &[&str],
    operations: Vec<OperationBinding>,
    bind_rules: Vec<DatastreamBindRule>,
) -> ServiceDeployment {
    ServiceDeployment {
        pid: pid.to_owned(),
        label: format!("Deployment {pid}"),
        state: ObjectState::Active,
        service_definition: sdef.to_owned(),
        content_models: models.iter().map(|m| (*m).to_owned()).collect(),
        operations,
        bind_rules,
    }
}

pub(crate) fn resize_parameters() -> Vec<MethodParameterDefinition> {
    vec![
        MethodParameterDefinition::user_input("width").required(),
        MethodParameterDefinition::user_input("format")
            .with_default("png")
            .with_domain(["png", "jpeg"]),
        MethodParameterDefinition::new("IMAGE", ParameterKind::DatastreamInput),
        MethodParameterDefinition::new("quality", ParameterKind::DefaultInput).with_default("85"),
    ]
}

pub(crate) fn image_deployment() -> ServiceDeployment {
    deployment(
        IMAGE_DEPLOYMENT,
        IMAGE_SDEF,
        &[IMAGE_MODEL],
        vec![
            operation(
                "resize",
                "http://imaging.example.org/",
                "/resize?src=(IMAGE)&width=(width)&format=(format)&q=(quality)",
                resize_parameters(),
            ),
            operation(
                "thumbnail",
                "LOCAL",
                "/viewer?src=(THUMB)",
                Vec::new(),
            ),
        ],
        vec![
            DatastreamBindRule::new("IMAGE"),
            DatastreamBindRule::new("THUMB"),
        ],
    )
}

fn stored(datastream: Datastream, content: Option<&str>) -> StoredDatastream {
    StoredDatastream {
        datastream,
        content: content.map(str::to_owned),
    }
}

/// Repository holding one image object whose model has one deployment.
pub(crate) fn image_snapshot() -> RepositorySnapshot {
    let image = object(
        IMAGE_PID,
        &[
            "info:fedora/fedora-system:FedoraObject-3.0",
            "info:fedora/demo:ImageModel",
        ],
    );
    let mut dc = datastream("DC", ControlGroup::InlineXml, "demo:1+DC+DC.0", CREATED);
    dc.mime_type = "text/xml".to_owned();
    RepositorySnapshot {
        objects: vec![StoredObject {
            pid: image.pid,
            label: image.label,
            state: image.state,
            owner_id: image.owner_id,
            created: image.created,
            last_modified: image.last_modified,
            content_models: image.content_models,
            datastreams: vec![
                stored(dc, Some("<oai_dc:dc><dc:title>Demo</dc:title></oai_dc:dc>")),
                stored(
                    datastream("IMAGE", ControlGroup::Managed, "demo:1+IMAGE+IMAGE.0", CREATED),
                    Some("v1"),
                ),
                stored(
                    datastream("IMAGE", ControlGroup::Managed, "demo:1+IMAGE+IMAGE.1", REVISED),
                    Some("v2"),
                ),
            ],
        }],
        content_models: vec![ContentModel {
            pid: IMAGE_MODEL.to_owned(),
            services: vec![format!("info:fedora/{IMAGE_SDEF}")],
        }],
        service_definitions: vec![ServiceDefinition {
            pid: IMAGE_SDEF.to_owned(),
            label: "Image service".to_owned(),
            state: ObjectState::Active,
            methods: vec![
                MethodDefinition::new("resize").with_parameters(vec![
                    MethodParameterDefinition::user_input("width").required(),
                    MethodParameterDefinition::user_input("format")
                        .with_default("png")
                        .with_domain(["png", "jpeg"]),
                ]),
                MethodDefinition::new("thumbnail"),
            ],
        }],
        service_deployments: vec![image_deployment()],
    }
}

// ---------------------------------------------------------------------------
// Collaborator doubles
// ---------------------------------------------------------------------------

/// Owned copy of the attributes passed to the authorizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AuthorizationRecord {
    pub(crate) pid: String,
    pub(crate) service_definition: String,
    pub(crate) method: String,
    pub(crate) deployment: String,
    pub(crate) object_state: ObjectState,
    pub(crate) deployment_state: ObjectState,
}

/// Authorizer that records every request and answers with a fixed verdict.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingAuthorizer {
    pub(crate) log: Rc<RefCell<Vec<AuthorizationRecord>>>,
    pub(crate) denial: Option<AuthorizationError>,
}

impl RecordingAuthorizer {
    pub(crate) fn denying(reason: &str) -> Self {
        Self {
            log: Rc::default(),
            denial: Some(AuthorizationError::Denied {
                reason: reason.to_owned(),
            }),
        }
    }
}

impl DisseminationAuthorizer for RecordingAuthorizer {
    fn enforce_dissemination(
        &self,
        request: &AuthorizationRequest<'_>,
    ) -> Result<(), AuthorizationError> {
        self.log.borrow_mut().push(AuthorizationRecord {
            pid: request.pid.to_owned(),
            service_definition: request.service_definition.to_owned(),
            method: request.method.to_owned(),
            deployment: request.deployment.to_owned(),
            object_state: request.object_state,
            deployment_state: request.deployment_state,
        });
        self.denial.clone().map_or(Ok(()), Err)
    }
}

/// What the executor was handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExecutionRecord {
    pub(crate) deployment: String,
    pub(crate) binding_keys: Vec<String>,
    pub(crate) parameters: Vec<(String, String)>,
}

/// Executor that records every request and returns a plain-text marker.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingExecutor {
    pub(crate) log: Rc<RefCell<Vec<ExecutionRecord>>>,
}

impl DisseminationExecutor for RecordingExecutor {
    fn execute(
        &self,
        request: &DisseminationRequest<'_>,
    ) -> Result<MimeTypedStream, ExecutionError> {
        self.log.borrow_mut().push(ExecutionRecord {
            deployment: request.deployment.pid.clone(),
            binding_keys: request.bindings.iter().map(|b| b.key.clone()).collect(),
            parameters: request
                .parameters
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        });
        Ok(MimeTypedStream::from_bytes("text/plain", b"executed".to_vec()))
    }
}

pub(crate) fn default_registry() -> DynamicServiceRegistry {
    DynamicServiceRegistry::with_default_disseminator(DEFAULT_SDEF).expect("default registry")
}

pub(crate) fn read_all(stream: MimeTypedStream) -> String {
    String::from_utf8(stream.into_bytes().expect("read stream")).expect("utf-8 output")
}

// ---------------------------------------------------------------------------
// End-to-end over the memory repository
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_static_dissemination_plans_invocation_url() {
    let disseminator = Disseminator::new(
        MemoryRepository::new(image_snapshot()),
        PermitAll,
        crate::assembly::InvocationPlanner::new(BASE_URL),
        default_registry(),
    );
    let query = DisseminationQuery::new(IMAGE_PID, IMAGE_SDEF, "resize")
        .with_parameter("width", "200")
        .with_parameter("format", "");

    let stream = disseminator
        .get_dissemination(&RequestContext::anonymous(), &query)
        .expect("dissemination");

    assert_eq!(stream.mime_type(), "text/uri-list");
    assert_eq!(
        read_all(stream),
        "http://imaging.example.org/resize?src=http://repo.example.org/fedora/get/demo:1/IMAGE\
         &width=200&format=png&q=85\r\n"
    );
}

#[test]
fn end_to_end_dynamic_dissemination_reads_dublin_core() {
    let disseminator = Disseminator::new(
        MemoryRepository::new(image_snapshot()),
        PermitAll,
        RecordingExecutor::default(),
        default_registry(),
    );
    let query = DisseminationQuery::new(IMAGE_PID, DEFAULT_SDEF, "viewDublinCore");

    let stream = disseminator
        .get_dissemination(&RequestContext::anonymous(), &query)
        .expect("dissemination");

    assert_eq!(stream.mime_type(), "text/xml");
    assert!(read_all(stream).contains("<dc:title>Demo</dc:title>"));
}

#[test]
fn end_to_end_error_statuses() {
    let disseminator = Disseminator::new(
        MemoryRepository::new(image_snapshot()),
        PermitAll,
        RecordingExecutor::default(),
        default_registry(),
    );
    let context = RequestContext::anonymous();

    let missing_width = DisseminationQuery::new(IMAGE_PID, IMAGE_SDEF, "resize");
    let invalid = disseminator
        .get_dissemination(&context, &missing_width)
        .expect_err("width is required");
    assert_eq!(invalid.status().http_status(), 400);

    let unknown_service = DisseminationQuery::new(IMAGE_PID, "demo:Nothing", "view");
    let missing = disseminator
        .get_dissemination(&context, &unknown_service)
        .expect_err("no deployment");
    assert!(matches!(missing, DisseminationError::DeploymentNotFound { .. }));
    assert_eq!(missing.status().http_status(), 404);
}

#[test]
fn end_to_end_two_deployments_for_one_model_are_ambiguous() {
    let mut snapshot = image_snapshot();
    let mut alternate = image_deployment();
    alternate.pid = "demo:AlternateDeployment".to_owned();
    snapshot.service_deployments.push(alternate);
    let disseminator = Disseminator::new(
        MemoryRepository::new(snapshot),
        PermitAll,
        RecordingExecutor::default(),
        default_registry(),
    );
    let query =
        DisseminationQuery::new(IMAGE_PID, IMAGE_SDEF, "resize").with_parameter("width", "200");

    let error = disseminator
        .get_dissemination(&RequestContext::anonymous(), &query)
        .expect_err("two deployments serve the image model");

    assert!(matches!(
        error,
        DisseminationError::AmbiguousDeployment { ref content_model, .. }
            if content_model == IMAGE_MODEL
    ));
    assert_eq!(error.status().http_status(), 500);
}

#[test]
fn end_to_end_prefixed_service_definitions_route_like_bare_ones() {
    let executor = RecordingExecutor::default();
    let disseminator = Disseminator::new(
        MemoryRepository::new(image_snapshot()),
        PermitAll,
        executor.clone(),
        default_registry(),
    );
    let context = RequestContext::anonymous();

    let static_query = DisseminationQuery::new(
        IMAGE_PID,
        format!("info:fedora/{IMAGE_SDEF}"),
        "resize",
    )
    .with_parameter("width", "200");
    disseminator
        .get_dissemination(&context, &static_query)
        .expect("static dissemination");
    assert_eq!(executor.log.borrow().len(), 1);

    let dynamic_query = DisseminationQuery::new(
        IMAGE_PID,
        format!("info:fedora/{DEFAULT_SDEF}"),
        "viewDublinCore",
    );
    let stream = disseminator
        .get_dissemination(&context, &dynamic_query)
        .expect("dynamic dissemination");
    assert_eq!(stream.mime_type(), "text/xml");
    assert_eq!(executor.log.borrow().len(), 1);
}
