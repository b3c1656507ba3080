//! Digital objects and their datastreams as read from the object store.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Lifecycle state shared by objects, datastreams, and service objects.
///
/// # Example
///
/// ```
/// use dissem_core::model::ObjectState;
///
/// assert_eq!(ObjectState::Inactive.code(), "I");
/// assert_eq!(ObjectState::default(), ObjectState::Active);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectState {
    /// Visible and disseminable.
    #[default]
    #[serde(rename = "A", alias = "active")]
    Active,
    /// Hidden from ordinary access.
    #[serde(rename = "I", alias = "inactive")]
    Inactive,
    /// Marked for removal.
    #[serde(rename = "D", alias = "deleted")]
    Deleted,
}

impl ObjectState {
    /// Returns the single-letter state code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Active => "A",
            Self::Inactive => "I",
            Self::Deleted => "D",
        }
    }
}

impl std::fmt::Display for ObjectState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// How a datastream's content is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlGroup {
    /// XML content stored inline in the object.
    #[serde(rename = "X")]
    InlineXml,
    /// Content managed by the repository.
    #[serde(rename = "M")]
    Managed,
    /// Content referenced by an external URL.
    #[serde(rename = "E")]
    External,
    /// Content the client is redirected to.
    #[serde(rename = "R")]
    Redirect,
}

impl ControlGroup {
    /// Returns the single-letter control group code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InlineXml => "X",
            Self::Managed => "M",
            Self::External => "E",
            Self::Redirect => "R",
        }
    }

    /// Returns `true` when the repository serves the content itself.
    #[must_use]
    pub const fn is_repository_managed(self) -> bool {
        matches!(self, Self::InlineXml | Self::Managed)
    }
}

impl std::fmt::Display for ControlGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// One version of a datastream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Datastream {
    /// Datastream identifier, unique within its object.
    pub id: String,
    /// Identifier of this particular version.
    pub version_id: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// MIME type of the content.
    pub mime_type: String,
    /// How the content is held.
    pub control_group: ControlGroup,
    /// Content location: an internal reference or an external URL.
    #[serde(default)]
    pub location: String,
    /// Lifecycle state.
    #[serde(default)]
    pub state: ObjectState,
    /// When this version was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
}

/// A digital object as seen at a point in time.
///
/// `datastreams` holds one entry per datastream id: the version current at
/// the time the object was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalObject {
    /// Persistent identifier.
    pub pid: String,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// Lifecycle state.
    #[serde(default)]
    pub state: ObjectState,
    /// Owner identifier, when recorded.
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    /// Last modification time.
    #[serde(with = "time::serde::rfc3339")]
    pub last_modified: OffsetDateTime,
    /// Content-model identifiers, as bare PIDs or `info:fedora/` URIs.
    #[serde(default)]
    pub content_models: Vec<String>,
    /// Current datastream versions.
    #[serde(default)]
    pub datastreams: Vec<Datastream>,
}

impl DigitalObject {
    /// Looks up a datastream by id.
    #[must_use]
    pub fn datastream(&self, id: &str) -> Option<&Datastream> {
        self.datastreams.iter().find(|ds| ds.id == id)
    }
}
