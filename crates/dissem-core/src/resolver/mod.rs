//! Deployment resolution across an object's content models.
//!
//! Each non-system content model of the object is asked for a deployment of
//! the requested service definition. The answers are folded into a
//! [`DeploymentMatch`]: no candidate, a unique candidate, or a conflict
//! between two distinct candidates, whether they come from different models
//! or from one model served twice. A conflict is a repository configuration
//! error and is never settled by picking one.

use tracing::debug;

use crate::DISSEMINATION_TARGET;
use crate::error::{DeploymentNotFoundReason, DisseminationError};
use crate::model::{DigitalObject, is_reserved_model, normalize_pid};
use crate::repository::{RepositoryError, RepositoryReader};

/// Outcome of folding deployment lookups over content models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentMatch {
    /// No content model has a deployment for the service.
    Unmatched,
    /// Every content model with a deployment agrees on it.
    Unique {
        /// Resolved deployment.
        deployment: String,
        /// First content model that produced it.
        content_model: String,
    },
    /// Two different deployments were found.
    Conflict {
        /// Deployment found first.
        first: String,
        /// Conflicting deployment.
        second: String,
        /// Content model that produced `second`.
        content_model: String,
    },
}

impl DeploymentMatch {
    /// Folds one lookup result into the running outcome.
    #[must_use]
    pub fn absorb(self, content_model: &str, found: Option<String>) -> Self {
        let Some(candidate) = found else {
            return self;
        };
        match self {
            Self::Unmatched => Self::Unique {
                deployment: candidate,
                content_model: content_model.to_owned(),
            },
            Self::Unique { deployment, .. } if deployment != candidate => Self::Conflict {
                first: deployment,
                second: candidate,
                content_model: content_model.to_owned(),
            },
            unchanged => unchanged,
        }
    }

    /// Returns `true` for a conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Finds the deployment implementing a service definition for an object.
///
/// # Example
///
/// ```
/// use dissem_core::memory::{MemoryRepository, RepositorySnapshot};
/// use dissem_core::resolver::DeploymentResolver;
///
/// let repository = MemoryRepository::new(RepositorySnapshot::default());
/// let resolver = DeploymentResolver::new(&repository);
/// # let _ = resolver;
/// ```
#[derive(Debug)]
pub struct DeploymentResolver<'r, R: ?Sized> {
    reader: &'r R,
}

impl<'r, R: RepositoryReader + ?Sized> DeploymentResolver<'r, R> {
    /// Creates a resolver over the given store.
    #[must_use]
    pub const fn new(reader: &'r R) -> Self {
        Self { reader }
    }

    /// Resolves the unique deployment for `service_definition` on `object`.
    ///
    /// # Errors
    ///
    /// Returns [`DisseminationError::AmbiguousDeployment`] when two distinct
    /// deployments match, [`DisseminationError::DeploymentNotFound`] when none
    /// has a deployment, or a repository error when a lookup fails.
    pub fn resolve(
        &self,
        object: &DigitalObject,
        service_definition: &str,
    ) -> Result<String, DisseminationError> {
        match self.match_deployment(object, service_definition)? {
            DeploymentMatch::Unique {
                deployment,
                content_model,
            } => {
                debug!(
                    target: DISSEMINATION_TARGET,
                    pid = %object.pid,
                    sdef = service_definition,
                    deployment = %deployment,
                    model = %content_model,
                    "deployment resolved"
                );
                Ok(deployment)
            }
            DeploymentMatch::Conflict {
                first,
                second,
                content_model,
            } => Err(DisseminationError::AmbiguousDeployment {
                service_definition: service_definition.to_owned(),
                content_model,
                first,
                second,
            }),
            DeploymentMatch::Unmatched => Err(DisseminationError::DeploymentNotFound {
                reason: self.diagnose_not_found(object, service_definition)?,
            }),
        }
    }

    /// Folds deployment lookups over the object's content models.
    ///
    /// # Errors
    ///
    /// Returns a repository error when a lookup fails.
    pub fn match_deployment(
        &self,
        object: &DigitalObject,
        service_definition: &str,
    ) -> Result<DeploymentMatch, RepositoryError> {
        let mut outcome = DeploymentMatch::Unmatched;
        for model in candidate_models(object) {
            for found in self.reader.lookup_deployments(model, service_definition)? {
                outcome = outcome.absorb(model, Some(found));
                if outcome.is_conflict() {
                    return Ok(outcome);
                }
            }
        }
        Ok(outcome)
    }

    fn diagnose_not_found(
        &self,
        object: &DigitalObject,
        service_definition: &str,
    ) -> Result<DeploymentNotFoundReason, RepositoryError> {
        for model in candidate_models(object) {
            let services = self.reader.services_for_model(model)?;
            if services
                .iter()
                .any(|sdef| normalize_pid(sdef) == service_definition)
            {
                return Ok(DeploymentNotFoundReason::NoDeploymentForModel {
                    service_definition: service_definition.to_owned(),
                    content_model: model.to_owned(),
                });
            }
        }
        Ok(DeploymentNotFoundReason::NoModelWithService {
            pid: object.pid.clone(),
            service_definition: service_definition.to_owned(),
        })
    }
}

/// Returns the object's content models eligible for deployment lookup, in
/// declaration order, normalised and without duplicates.
pub fn candidate_models(object: &DigitalObject) -> impl Iterator<Item = &str> {
    let mut seen: Vec<&str> = Vec::new();
    object
        .content_models
        .iter()
        .map(|model| normalize_pid(model))
        .filter(|model| !model.is_empty() && !is_reserved_model(model))
        .filter(move |model| {
            if seen.contains(model) {
                false
            } else {
                seen.push(*model);
                true
            }
        })
}
