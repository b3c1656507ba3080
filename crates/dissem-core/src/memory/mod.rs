//! In-memory object store loaded from a JSON snapshot.
//!
//! Datastreams are versioned: a snapshot may hold several entries with the
//! same id, and a lookup as of time `T` sees the newest entry created at or
//! before `T`. Service definitions and deployments are not versioned here, so
//! their lookups ignore the requested time.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::model::{
    Datastream, DigitalObject, ObjectState, ServiceDefinition, ServiceDeployment, normalize_pid,
};
use crate::repository::{RepositoryError, RepositoryReader};

/// Serialised form of a whole repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySnapshot {
    /// Digital objects with every datastream version.
    #[serde(default)]
    pub objects: Vec<StoredObject>,
    /// Content models and the services they declare.
    #[serde(default)]
    pub content_models: Vec<ContentModel>,
    /// Service definitions.
    #[serde(default)]
    pub service_definitions: Vec<ServiceDefinition>,
    /// Service deployments.
    #[serde(default)]
    pub service_deployments: Vec<ServiceDeployment>,
}

/// A content model's declared services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentModel {
    /// Content-model identifier.
    pub pid: String,
    /// Service definitions the model declares.
    #[serde(default)]
    pub services: Vec<String>,
}

/// A digital object as held in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredObject {
    /// Persistent identifier.
    pub pid: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// Lifecycle state.
    #[serde(default)]
    pub state: ObjectState,
    /// Owner identifier.
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// Last modification time.
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
    /// Content-model identifiers.
    #[serde(default)]
    pub content_models: Vec<String>,
    /// Every datastream version, in any order.
    #[serde(default)]
    pub datastreams: Vec<StoredDatastream>,
}

impl StoredObject {
    /// Returns the version of `datastream_id` current at `as_of`.
    #[must_use]
    pub fn version(
        &self,
        datastream_id: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Option<&StoredDatastream> {
        self.datastreams
            .iter()
            .filter(|stored| stored.datastream.id == datastream_id)
            .filter(|stored| as_of.is_none_or(|at| stored.datastream.created <= at))
            .max_by_key(|stored| stored.datastream.created)
    }

    fn view(&self, as_of: Option<OffsetDateTime>) -> DigitalObject {
        let mut ids: Vec<&str> = Vec::new();
        for stored in &self.datastreams {
            if !ids.contains(&stored.datastream.id.as_str()) {
                ids.push(&stored.datastream.id);
            }
        }
        DigitalObject {
            pid: self.pid.clone(),
            label: self.label.clone(),
            state: self.state,
            owner_id: self.owner_id.clone(),
            created: self.created,
            last_modified: self.last_modified,
            content_models: self.content_models.clone(),
            datastreams: ids
                .into_iter()
                .filter_map(|id| self.version(id, as_of))
                .map(|stored| stored.datastream.clone())
                .collect(),
        }
    }
}

/// One datastream version with its inline content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDatastream {
    /// Version metadata.
    #[serde(flatten)]
    pub datastream: Datastream,
    /// Content of repository-held versions.
    #[serde(default)]
    pub content: Option<String>,
}

/// [`RepositoryReader`] over a [`RepositorySnapshot`].
///
/// # Example
///
/// ```
/// use dissem_core::memory::MemoryRepository;
/// use dissem_core::repository::RepositoryReader;
///
/// let repository = MemoryRepository::from_json(
///     r#"{"content_models": [{"pid": "demo:Model", "services": ["demo:Service"]}]}"#,
/// )
/// .expect("valid snapshot");
/// let services = repository.services_for_model("demo:Model").expect("lookup");
/// assert_eq!(services, vec!["demo:Service".to_owned()]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    snapshot: RepositorySnapshot,
}

impl MemoryRepository {
    /// Wraps a snapshot.
    #[must_use]
    pub const fn new(snapshot: RepositorySnapshot) -> Self {
        Self { snapshot }
    }

    /// Parses a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the document is not a valid snapshot.
    pub fn from_json(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document).map(Self::new)
    }

    /// Returns the underlying snapshot.
    #[must_use]
    pub const fn snapshot(&self) -> &RepositorySnapshot {
        &self.snapshot
    }

    fn stored(&self, pid: &str) -> Option<&StoredObject> {
        self.snapshot.objects.iter().find(|object| object.pid == pid)
    }
}

impl RepositoryReader for MemoryRepository {
    fn object(
        &self,
        pid: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Result<DigitalObject, RepositoryError> {
        self.stored(pid)
            .filter(|stored| as_of.is_none_or(|at| stored.created <= at))
            .map(|stored| stored.view(as_of))
            .ok_or_else(|| RepositoryError::object_not_found(pid))
    }

    fn datastream(
        &self,
        pid: &str,
        datastream_id: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Result<Option<Datastream>, RepositoryError> {
        Ok(self
            .stored(pid)
            .and_then(|stored| stored.version(datastream_id, as_of))
            .map(|stored| stored.datastream.clone()))
    }

    fn datastream_content(
        &self,
        pid: &str,
        datastream_id: &str,
        as_of: Option<OffsetDateTime>,
    ) -> Result<Option<Vec<u8>>, RepositoryError> {
        Ok(self
            .stored(pid)
            .and_then(|stored| stored.version(datastream_id, as_of))
            .and_then(|stored| stored.content.clone())
            .map(String::into_bytes))
    }

    fn services_for_model(&self, content_model: &str) -> Result<Vec<String>, RepositoryError> {
        let model = normalize_pid(content_model);
        Ok(self
            .snapshot
            .content_models
            .iter()
            .find(|candidate| normalize_pid(&candidate.pid) == model)
            .map(|found| found.services.clone())
            .unwrap_or_default())
    }

    fn lookup_deployments(
        &self,
        content_model: &str,
        service_definition: &str,
    ) -> Result<Vec<String>, RepositoryError> {
        let model = normalize_pid(content_model);
        let sdef = normalize_pid(service_definition);
        let mut matches: Vec<String> = self
            .snapshot
            .service_deployments
            .iter()
            .filter(|deployment| deployment.state != ObjectState::Deleted)
            .filter(|deployment| normalize_pid(&deployment.service_definition) == sdef)
            .filter(|deployment| {
                deployment
                    .content_models
                    .iter()
                    .any(|served| normalize_pid(served) == model)
            })
            .map(|deployment| deployment.pid.clone())
            .collect();
        matches.sort_unstable();
        Ok(matches)
    }

    fn service_definition(
        &self,
        pid: &str,
        _as_of: Option<OffsetDateTime>,
    ) -> Result<ServiceDefinition, RepositoryError> {
        self.snapshot
            .service_definitions
            .iter()
            .find(|definition| normalize_pid(&definition.pid) == normalize_pid(pid))
            .cloned()
            .ok_or_else(|| RepositoryError::ServiceDefinitionNotFound {
                pid: pid.to_owned(),
            })
    }

    fn service_deployment(
        &self,
        pid: &str,
        _as_of: Option<OffsetDateTime>,
    ) -> Result<ServiceDeployment, RepositoryError> {
        self.snapshot
            .service_deployments
            .iter()
            .find(|deployment| normalize_pid(&deployment.pid) == normalize_pid(pid))
            .cloned()
            .ok_or_else(|| RepositoryError::ServiceDeploymentNotFound {
                pid: pid.to_owned(),
            })
    }
}
