//! Validation of caller-supplied method parameters.
//!
//! Only user-input parameters are settable by callers. Validation runs in two
//! passes over the declared user-input parameters:
//!
//! 1. Required parameters must be present. The first absent one aborts
//!    validation immediately.
//! 2. Every supplied name is checked against the declarations. Unknown names
//!    and out-of-domain values are collected and reported together; empty
//!    values take the declared default.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::DISSEMINATION_TARGET;
use crate::error::{DisseminationError, ParameterViolation};
use crate::model::{MethodParameterDefinition, ParameterMap};

/// Domain entry that accepts any value.
pub const DOMAIN_WILDCARD: &str = "null";

/// Final parameter values after validation and default substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedParameters {
    values: BTreeMap<String, String>,
}

impl ResolvedParameters {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for a parameter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Iterates over the parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn insert(&mut self, name: &str, value: &str) {
        self.values.insert(name.to_owned(), value.to_owned());
    }
}

/// Validates `supplied` against the formal parameters of `method`.
///
/// # Errors
///
/// Returns [`DisseminationError::InvalidParameters`] carrying either the
/// first missing required parameter or every violation of the second pass.
///
/// # Example
///
/// ```
/// use dissem_core::model::{MethodParameterDefinition, ParameterMap};
/// use dissem_core::params::validate_parameters;
///
/// let formal = vec![MethodParameterDefinition::user_input("size").with_default("large")];
/// let supplied = ParameterMap::from([("size".to_owned(), String::new())]);
/// let resolved = validate_parameters("resize", &formal, &supplied).expect("valid");
/// assert_eq!(resolved.get("size"), Some("large"));
/// ```
pub fn validate_parameters(
    method: &str,
    formal: &[MethodParameterDefinition],
    supplied: &ParameterMap,
) -> Result<ResolvedParameters, DisseminationError> {
    ParameterValidator::new(method, formal).validate(supplied)
}

/// Two-pass validator bound to one method's user-input declarations.
#[derive(Debug)]
pub struct ParameterValidator<'a> {
    method: &'a str,
    declared: Vec<&'a MethodParameterDefinition>,
}

impl<'a> ParameterValidator<'a> {
    /// Keeps only the user-input declarations of `formal`.
    #[must_use]
    pub fn new(method: &'a str, formal: &'a [MethodParameterDefinition]) -> Self {
        Self {
            method,
            declared: formal.iter().filter(|p| p.is_user_input()).collect(),
        }
    }

    /// Runs both passes.
    ///
    /// # Errors
    ///
    /// See [`validate_parameters`].
    pub fn validate(
        &self,
        supplied: &ParameterMap,
    ) -> Result<ResolvedParameters, DisseminationError> {
        if self.declared.is_empty() {
            return self.reject_all(supplied);
        }
        if let Some(violation) = self.missing_required(supplied) {
            return Err(DisseminationError::invalid_parameters(
                self.method,
                vec![violation],
            ));
        }
        let (resolved, violations) = self.resolve(supplied);
        if violations.is_empty() {
            Ok(resolved)
        } else {
            Err(DisseminationError::invalid_parameters(self.method, violations))
        }
    }

    /// First pass: returns the first required parameter absent from
    /// `supplied`.
    #[must_use]
    pub fn missing_required(&self, supplied: &ParameterMap) -> Option<ParameterViolation> {
        self.declared
            .iter()
            .find(|p| p.required && !supplied.contains_key(&p.name))
            .map(|p| ParameterViolation::MissingRequired {
                name: p.name.clone(),
            })
    }

    /// Second pass: substitutes defaults and collects every violation.
    #[must_use]
    pub fn resolve(
        &self,
        supplied: &ParameterMap,
    ) -> (ResolvedParameters, Vec<ParameterViolation>) {
        let mut resolved = ResolvedParameters::new();
        let mut violations = Vec::new();
        for (name, value) in supplied {
            let Some(declaration) = self.declaration(name) else {
                violations.push(ParameterViolation::Unknown { name: name.clone() });
                continue;
            };
            if value.is_empty() {
                resolved.insert(name, self.empty_value(declaration));
            } else if let Some(violation) = check_domain(declaration, value) {
                violations.push(violation);
            } else {
                resolved.insert(name, value);
            }
        }
        (resolved, violations)
    }

    fn reject_all(
        &self,
        supplied: &ParameterMap,
    ) -> Result<ResolvedParameters, DisseminationError> {
        if supplied.is_empty() {
            return Ok(ResolvedParameters::new());
        }
        let violations = supplied
            .keys()
            .map(|name| ParameterViolation::Unexpected { name: name.clone() })
            .collect();
        Err(DisseminationError::invalid_parameters(self.method, violations))
    }

    fn declaration(&self, name: &str) -> Option<&'a MethodParameterDefinition> {
        self.declared.iter().copied().find(|p| p.name == name)
    }

    fn empty_value(&self, declaration: &'a MethodParameterDefinition) -> &'a str {
        declaration.default_value.as_deref().map_or_else(
            || {
                warn!(
                    target: DISSEMINATION_TARGET,
                    method = self.method,
                    parameter = %declaration.name,
                    "parameter supplied without value and has no default"
                );
                ""
            },
            |default| {
                debug!(
                    target: DISSEMINATION_TARGET,
                    method = self.method,
                    parameter = %declaration.name,
                    default,
                    "substituted default value"
                );
                default
            },
        )
    }
}

/// Checks a non-empty value against the declared domain.
fn check_domain(
    declaration: &MethodParameterDefinition,
    value: &str,
) -> Option<ParameterViolation> {
    let domain = &declaration.domain_values;
    let unrestricted = domain
        .first()
        .is_none_or(|first| first.eq_ignore_ascii_case(DOMAIN_WILDCARD));
    if unrestricted {
        return None;
    }
    let accepted = domain.iter().any(|allowed| {
        allowed.eq_ignore_ascii_case(value) || allowed.eq_ignore_ascii_case(DOMAIN_WILDCARD)
    });
    if accepted {
        None
    } else {
        Some(ParameterViolation::OutOfDomain {
            name: declaration.name.clone(),
            value: value.to_owned(),
            allowed: domain.clone(),
        })
    }
}
