//! Dissemination resolution and parameter binding for a digital-object
//! repository.
//!
//! A dissemination is a view of a digital object produced by a service
//! method. The caller names the object, a service definition, and a method;
//! the engine works out which service deployment implements that method for
//! the object, checks the caller's parameters against the method contract,
//! binds the deployment's datastream inputs, and hands the resolved request
//! to an executor.
//!
//! # Architecture
//!
//! [`Disseminator`] drives the request through its stages. It owns three
//! injected collaborators: a [`RepositoryReader`] for objects and service
//! objects, a [`DisseminationAuthorizer`] consulted once per request, and a
//! [`DisseminationExecutor`] that produces the output. Well-known service
//! definitions registered in the [`DynamicServiceRegistry`] skip deployment
//! resolution and run built-in handlers instead.
//!
//! # Example
//!
//! ```
//! use dissem_core::authorization::PermitAll;
//! use dissem_core::assembly::InvocationPlanner;
//! use dissem_core::memory::MemoryRepository;
//! use dissem_core::model::RequestContext;
//! use dissem_core::orchestrator::{Disseminator, DisseminationQuery};
//! use dissem_core::registry::DynamicServiceRegistry;
//!
//! let repository = MemoryRepository::from_json(
//!     r#"{"objects": [{
//!         "pid": "demo:1",
//!         "label": "Demo",
//!         "created": "2024-01-01T00:00:00Z",
//!         "last_modified": "2024-01-01T00:00:00Z"
//!     }]}"#,
//! )
//! .expect("valid snapshot");
//! let disseminator = Disseminator::new(
//!     repository,
//!     PermitAll,
//!     InvocationPlanner::new("http://localhost:8080/fedora"),
//!     DynamicServiceRegistry::with_default_disseminator("fedora-system:3").expect("registry"),
//! );
//!
//! let query = DisseminationQuery::new("demo:1", "fedora-system:3", "viewObjectProfile");
//! let stream = disseminator
//!     .get_dissemination(&RequestContext::anonymous(), &query)
//!     .expect("dissemination");
//! assert_eq!(stream.mime_type(), "application/json");
//! ```

pub mod assembly;
pub mod authorization;
pub mod binding;
pub mod builtin;
pub mod error;
pub mod executor;
pub mod memory;
pub mod model;
pub mod orchestrator;
pub mod params;
pub mod registry;
pub mod repository;
pub mod resolver;

#[cfg(test)]
mod tests;

pub use self::authorization::{DisseminationAuthorizer, PermitAll};
pub use self::error::{DisseminationError, ParameterViolation, StatusClass};
pub use self::executor::DisseminationExecutor;
pub use self::orchestrator::{DisseminationQuery, Disseminator};
pub use self::registry::{DynamicService, DynamicServiceRegistry};
pub use self::repository::{RepositoryError, RepositoryReader};

/// Tracing target shared by every engine component.
pub(crate) const DISSEMINATION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dissemination");
