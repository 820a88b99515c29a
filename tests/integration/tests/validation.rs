//! Ticket validation against the mock CAS server, per protocol version.

use std::time::Duration;

use axum::http::StatusCode;
use cas_integration_tests::{Grant, MockCas};
use cas_protocol::{
    AuthenticationFailure, CasError, ProtocolVersion, ServiceTicketValidator, ValidationOutcome,
};
use chrono::{TimeZone, Utc};
use url::Url;

fn service() -> Url {
    Url::parse("https://app.example.com/reports?year=2024&ticket=ST-stale").unwrap()
}

fn validator(cas: &MockCas, version: ProtocolVersion) -> ServiceTicketValidator {
    ServiceTicketValidator::new(cas.cas_url(), version).unwrap()
}

#[tokio::test]
async fn cas1_yes_and_no() {
    let cas = MockCas::start().await.unwrap();
    cas.issue("ST-1", Grant::new("alice"));
    let validator = validator(&cas, ProtocolVersion::V1);

    let outcome = validator.validate(&service(), "ST-1").await.unwrap();
    let response = outcome.into_response().unwrap();
    assert_eq!(response.user(), "alice");
    assert!(response.attributes().is_empty());
    assert!(response.authentication_date().is_none());

    let outcome = validator.validate(&service(), "ST-unknown").await.unwrap();
    assert_eq!(outcome, ValidationOutcome::Rejected(None));
    assert_eq!(cas.seen()[0].path, "/cas/validate");
}

#[tokio::test]
async fn cas2_success_and_failure() {
    let cas = MockCas::start().await.unwrap();
    cas.issue("ST-2", Grant::new("bob"));
    let validator = validator(&cas, ProtocolVersion::V2);

    let response = validator
        .validate(&service(), "ST-2")
        .await
        .unwrap()
        .into_response()
        .unwrap();
    assert_eq!(response.user(), "bob");
    assert!(response.authentication_date().is_none());

    let outcome = validator.validate(&service(), "ST-nope").await.unwrap();
    assert_eq!(
        outcome,
        ValidationOutcome::Rejected(Some(AuthenticationFailure::new(
            "INVALID_TICKET",
            "Ticket ST-nope not recognized"
        )))
    );
    assert_eq!(cas.seen()[0].path, "/cas/serviceValidate");
}

#[tokio::test]
async fn cas3_attributes_and_zoned_date() {
    let cas = MockCas::start().await.unwrap();
    cas.issue(
        "ST-123",
        Grant::new("alice")
            .with_attribute("uid", "42")
            .with_attribute("memberOf", "staff")
            .with_attribute("memberOf", "admins"),
    );
    let validator = validator(&cas, ProtocolVersion::V3);

    let response = validator
        .validate(&service(), "ST-123")
        .await
        .unwrap()
        .into_response()
        .unwrap();

    assert_eq!(response.user(), "alice");
    assert_eq!(response.user_id().unwrap(), 42);
    assert_eq!(response.attributes().get("uid").unwrap(), ["42".to_string()]);
    assert_eq!(response.member_of(), ["staff".to_string(), "admins".to_string()]);
    assert_eq!(response.is_new_login(), Some(true));
    assert_eq!(response.is_remembered_login(), Some(false));

    let expected = Utc.with_ymd_and_hms(2024, 5, 1, 8, 15, 30).unwrap()
        + chrono::Duration::milliseconds(123);
    assert_eq!(response.authentication_date(), Some(expected));
    assert_eq!(cas.seen()[0].path, "/cas/p3/serviceValidate");
}

#[tokio::test]
async fn service_parameter_never_carries_a_ticket() {
    let cas = MockCas::start().await.unwrap();
    cas.issue("ST-5", Grant::new("alice"));
    validator(&cas, ProtocolVersion::V3)
        .validate(&service(), "ST-5")
        .await
        .unwrap();

    let seen = cas.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].ticket, "ST-5");
    assert_eq!(seen[0].service, "https://app.example.com/reports?year=2024");
}

#[tokio::test]
async fn second_validation_of_a_ticket_fails() {
    let cas = MockCas::start().await.unwrap();
    cas.issue("ST-once", Grant::new("alice"));
    let validator = validator(&cas, ProtocolVersion::V3);

    assert!(validator
        .validate(&service(), "ST-once")
        .await
        .unwrap()
        .is_authenticated());
    assert!(!validator
        .validate(&service(), "ST-once")
        .await
        .unwrap()
        .is_authenticated());
    assert_eq!(cas.seen().len(), 2);
}

#[tokio::test]
async fn non_success_status_is_a_validation_error() {
    let cas = MockCas::start().await.unwrap();
    cas.issue("ST-6", Grant::new("alice"));
    cas.fail_with(StatusCode::INTERNAL_SERVER_ERROR);

    let err = validator(&cas, ProtocolVersion::V2)
        .validate(&service(), "ST-6")
        .await
        .unwrap_err();
    match err {
        CasError::Validation { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "CAS is unwell");
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_server_times_out() {
    let cas = MockCas::start().await.unwrap();
    cas.issue("ST-7", Grant::new("alice"));
    cas.delay(Duration::from_secs(5));

    let err = validator(&cas, ProtocolVersion::V3)
        .validate_with_timeout(&service(), "ST-7", Duration::from_millis(100))
        .await
        .unwrap_err();
    assert!(matches!(err, CasError::Timeout));
    assert!(err.is_transport());
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let cas_url = {
        let cas = MockCas::start().await.unwrap();
        cas.cas_url()
    };
    // The mock is gone; give the listener a moment to close.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = ServiceTicketValidator::new(cas_url, ProtocolVersion::V3)
        .unwrap()
        .with_timeout(Duration::from_secs(2))
        .validate(&service(), "ST-8")
        .await
        .unwrap_err();
    assert!(err.is_transport());
}
