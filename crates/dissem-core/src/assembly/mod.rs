//! Invocation-URL assembly for resolved disseminations.
//!
//! [`InvocationPlanner`] is the engine's reference executor. It turns the
//! operation binding of a resolved request into the URL of the back-end
//! service call and returns that URL as a `text/uri-list` stream. Calling the
//! service is left to the embedding transport layer.
//!
//! The operation location is a template. Each `(NAME)` token is replaced by,
//! in order of preference:
//!
//! 1. the locations of the datastreams bound under key `NAME`, joined by `+`;
//! 2. the caller's value for parameter `NAME`, percent-encoded;
//! 3. the declared default of parameter `NAME`, percent-encoded;
//! 4. nothing.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::DISSEMINATION_TARGET;
use crate::binding::DatastreamBindingInfo;
use crate::executor::{DisseminationExecutor, DisseminationRequest, ExecutionError};
use crate::model::MimeTypedStream;

/// Address standing for the repository itself.
pub const LOCAL_ADDRESS: &str = "LOCAL";

/// MIME type of the planner's output.
pub const URI_LIST_MIME: &str = "text/uri-list";

const SUPPORTED_PROTOCOL: &str = "http";

/// Everything but RFC 3986 unreserved characters.
const PARAMETER_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Builds back-end invocation URLs.
///
/// # Example
///
/// ```
/// use dissem_core::assembly::InvocationPlanner;
///
/// let planner = InvocationPlanner::new("http://localhost:8080/fedora/");
/// assert_eq!(planner.base_url(), "http://localhost:8080/fedora");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationPlanner {
    base_url: String,
}

impl InvocationPlanner {
    /// Creates a planner addressing the repository at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Returns the repository base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Assembles the invocation URL for a resolved request.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::UnsupportedProtocol`] for anything but
    /// `http`, or [`ExecutionError::Failed`] when the version date cannot be
    /// formatted.
    pub fn plan(&self, request: &DisseminationRequest<'_>) -> Result<String, ExecutionError> {
        let operation = request.operation;
        if !operation.protocol.eq_ignore_ascii_case(SUPPORTED_PROTOCOL) {
            return Err(ExecutionError::UnsupportedProtocol {
                protocol: operation.protocol.clone(),
                method: request.method.to_owned(),
            });
        }

        let address = if operation.address.eq_ignore_ascii_case(LOCAL_ADDRESS) {
            self.base_url.as_str()
        } else {
            operation.address.as_str()
        };
        let template = join_path(address, &operation.operation_location);

        let mut url = String::with_capacity(template.len());
        let mut rest = template.as_str();
        while let Some((head, tail)) = rest.split_once('(') {
            let Some((token, after)) = tail.split_once(')') else {
                break;
            };
            url.push_str(head);
            url.push_str(&self.token_value(request, token)?);
            rest = after;
        }
        url.push_str(rest);

        debug!(
            target: DISSEMINATION_TARGET,
            pid = %request.object.pid,
            method = request.method,
            deployment = %request.deployment.pid,
            url = %url,
            "invocation url assembled"
        );
        Ok(url)
    }

    fn token_value(
        &self,
        request: &DisseminationRequest<'_>,
        token: &str,
    ) -> Result<String, ExecutionError> {
        let bound: Vec<&DatastreamBindingInfo> =
            request.bindings.iter().filter(|b| b.key == token).collect();
        if !bound.is_empty() {
            let locations = bound
                .into_iter()
                .map(|binding| self.datastream_location(binding, request.as_of))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(locations.join("+"));
        }

        if let Some(value) = request.parameters.get(token).filter(|v| !v.is_empty()) {
            return Ok(encode(value));
        }

        let default = request
            .operation
            .parameters
            .iter()
            .find(|p| p.name == token)
            .and_then(|p| p.default_value.as_deref());
        Ok(default.map(encode).unwrap_or_default())
    }

    fn datastream_location(
        &self,
        binding: &DatastreamBindingInfo,
        as_of: Option<OffsetDateTime>,
    ) -> Result<String, ExecutionError> {
        if !binding.control_group.is_repository_managed() {
            return Ok(binding.location.clone());
        }
        let mut location = format!(
            "{}/get/{}/{}",
            self.base_url, binding.pid, binding.datastream_id
        );
        if let Some(at) = as_of {
            let stamp = at.format(&Rfc3339).map_err(|error| ExecutionError::Failed {
                message: error.to_string(),
            })?;
            location.push('/');
            location.push_str(&stamp);
        }
        Ok(location)
    }
}

impl DisseminationExecutor for InvocationPlanner {
    fn execute(
        &self,
        request: &DisseminationRequest<'_>,
    ) -> Result<MimeTypedStream, ExecutionError> {
        let url = self.plan(request)?;
        Ok(MimeTypedStream::from_bytes(
            URI_LIST_MIME,
            format!("{url}\r\n").into_bytes(),
        ))
    }
}

fn join_path(address: &str, location: &str) -> String {
    match location.strip_prefix('/') {
        Some(relative) if address.ends_with('/') => format!("{address}{relative}"),
        _ => format!("{address}{location}"),
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, PARAMETER_VALUE).to_string()
}
