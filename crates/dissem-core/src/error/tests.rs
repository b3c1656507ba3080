//! Unit tests for error classification and messages.

use rstest::rstest;

use super::*;

fn denied() -> AuthorizationError {
    AuthorizationError::Denied {
        reason: "policy".to_owned(),
    }
}

#[rstest]
#[case(
    DisseminationError::DeploymentNotFound {
        reason: DeploymentNotFoundReason::NoModelWithService {
            pid: "demo:1".to_owned(),
            service_definition: "demo:S".to_owned(),
        },
    },
    StatusClass::NotFound
)]
#[case(DisseminationError::method_not_found("view", "demo:D"), StatusClass::NotFound)]
#[case(DisseminationError::invalid_parameters("view", Vec::new()), StatusClass::BadRequest)]
#[case(DisseminationError::from(denied()), StatusClass::Forbidden)]
#[case(
    DisseminationError::from(AuthorizationError::AuthenticationRequired {
        reason: "login".to_owned(),
    }),
    StatusClass::Unauthorized
)]
#[case(
    DisseminationError::from(RepositoryError::object_not_found("demo:1")),
    StatusClass::NotFound
)]
#[case(
    DisseminationError::from(RepositoryError::Backend { message: "io".to_owned() }),
    StatusClass::Internal
)]
#[case(
    DisseminationError::AmbiguousDeployment {
        service_definition: "demo:S".to_owned(),
        content_model: "demo:B".to_owned(),
        first: "demo:D1".to_owned(),
        second: "demo:D2".to_owned(),
    },
    StatusClass::Internal
)]
#[case(
    DisseminationError::dynamic_method_not_found("fedora-system:3", "nope"),
    StatusClass::Internal
)]
#[case(
    DisseminationError::DatastreamNotFound {
        pid: "demo:1".to_owned(),
        datastream: "DC".to_owned(),
    },
    StatusClass::NotFound
)]
fn errors_map_to_status_classes(#[case] error: DisseminationError, #[case] expected: StatusClass) {
    assert_eq!(error.status(), expected);
}

#[rstest]
#[case(StatusClass::BadRequest, 400)]
#[case(StatusClass::Unauthorized, 401)]
#[case(StatusClass::Forbidden, 403)]
#[case(StatusClass::NotFound, 404)]
#[case(StatusClass::Internal, 500)]
fn status_classes_have_http_equivalents(#[case] class: StatusClass, #[case] code: u16) {
    assert_eq!(class.http_status(), code);
}

#[test]
fn ambiguous_deployment_names_both_candidates() {
    let error = DisseminationError::AmbiguousDeployment {
        service_definition: "demo:S".to_owned(),
        content_model: "demo:B".to_owned(),
        first: "demo:D1".to_owned(),
        second: "demo:D2".to_owned(),
    };
    let message = error.to_string();
    assert!(message.contains("demo:D1"), "{message}");
    assert!(message.contains("demo:D2"), "{message}");
}

#[test]
fn deployment_not_found_reasons_are_distinguishable() {
    let wrong_model = DeploymentNotFoundReason::NoModelWithService {
        pid: "demo:1".to_owned(),
        service_definition: "demo:S".to_owned(),
    };
    let missing_deployment = DeploymentNotFoundReason::NoDeploymentForModel {
        service_definition: "demo:S".to_owned(),
        content_model: "demo:M".to_owned(),
    };
    assert!(wrong_model.to_string().contains("does not have a model"));
    assert!(missing_deployment.to_string().contains("no deployment found"));
}

#[test]
fn invalid_parameters_lists_every_violation() {
    let error = DisseminationError::invalid_parameters(
        "resize",
        vec![
            ParameterViolation::Unknown {
                name: "colour".to_owned(),
            },
            ParameterViolation::OutOfDomain {
                name: "format".to_owned(),
                value: "gif".to_owned(),
                allowed: vec!["png".to_owned(), "jpeg".to_owned()],
            },
        ],
    );
    let message = error.to_string();
    assert!(message.contains("\"colour\""), "{message}");
    assert!(message.contains("\"gif\""), "{message}");
    assert!(message.contains("png, jpeg"), "{message}");
    assert!(message.contains("; "), "{message}");
}

#[test]
fn authorization_denial_passes_through_unchanged() {
    let error = DisseminationError::from(denied());
    assert_eq!(error.to_string(), denied().to_string());
}

#[test]
fn violation_reports_parameter_name() {
    let violation = ParameterViolation::MissingRequired {
        name: "width".to_owned(),
    };
    assert_eq!(violation.name(), "width");
}
