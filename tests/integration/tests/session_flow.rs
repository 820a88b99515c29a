//! Login flow through the demo router, validating against the mock CAS.

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{COOKIE, HOST, LOCATION, SET_COOKIE},
        Request, StatusCode,
    },
    response::Response,
    Router,
};
use cas_client::{CasClient, ClientConfig, ValidationErrorPolicy};
use cas_integration_tests::{Grant, MockCas};
use cas_protocol::ProtocolVersion;
use cas_server::create_router;
use tower::ServiceExt;

pub(crate) fn client_for(cas: &MockCas) -> CasClient {
    let config = ClientConfig::new(cas.cas_url())
        .unwrap()
        .with_protocol(ProtocolVersion::V3);
    CasClient::new(config).unwrap()
}

pub(crate) fn get(uri: &str) -> axum::http::request::Builder {
    Request::builder().uri(uri).header(HOST, "app.example.com")
}

pub(crate) async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub(crate) async fn json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The session id carried by a `Set-Cookie` header.
pub(crate) fn cookie_value(response: &Response) -> String {
    let header = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    let pair = header.split(';').next().unwrap();
    let (name, value) = pair.split_once('=').unwrap();
    assert_eq!(name, "_cas_session");
    value.to_string()
}

/// Logs in through `/me?ticket=...` and returns the new session id.
pub(crate) async fn login(app: &Router, ticket: &str) -> String {
    let response = send(
        app,
        get(&format!("/me?ticket={ticket}")).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    cookie_value(&response)
}

#[tokio::test]
async fn ticket_login_creates_session() {
    let cas = MockCas::start().await.unwrap();
    cas.issue("ST-123", Grant::new("alice").with_attribute("uid", "42"));
    let client = client_for(&cas);
    let app = create_router(client.clone());

    let response = send(&app, get("/me?ticket=ST-123").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/"));
    let cookie = cookie_value(&response);
    assert!(!cookie.is_empty());

    let body = json(response).await;
    assert_eq!(body["user"], "alice");
    assert_eq!(body["user_id"], 42);
    assert_eq!(body["is_new_login"], true);
    assert_eq!(body["authentication_date"], "2024-05-01T08:15:30.123Z");

    let by_cookie = client.sessions().get(&cookie).await.unwrap().unwrap();
    let by_ticket = client.sessions().get_by_ticket("ST-123").await.unwrap().unwrap();
    assert_eq!(by_cookie.cookie(), by_ticket.cookie());
    assert_eq!(by_ticket.ticket(), "ST-123");
    assert_eq!(by_ticket.response().user(), "alice");

    let seen = cas.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].service, "http://app.example.com/me");
}

#[tokio::test]
async fn cookie_reuses_session_without_contacting_cas() {
    let cas = MockCas::start().await.unwrap();
    cas.issue("ST-123", Grant::new("alice"));
    let app = create_router(client_for(&cas));
    let cookie = login(&app, "ST-123").await;

    for _ in 0..3 {
        let response = send(
            &app,
            get("/me")
                .header(COOKIE, format!("_cas_session={cookie}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(json(response).await["user"], "alice");
    }

    assert_eq!(cas.seen().len(), 1);
}

#[tokio::test]
async fn rejected_ticket_leaves_request_anonymous() {
    let cas = MockCas::start().await.unwrap();
    let app = create_router(client_for(&cas));

    let response = send(&app, get("/me?ticket=ST-bogus").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(response.headers().get(SET_COOKIE).is_none());

    let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
    assert!(location.starts_with(&format!("{}/login?service=", cas.cas_url())));
    assert!(!location.contains("ST-bogus"));
}

#[tokio::test]
async fn cas_outage_is_tolerated_by_default() {
    let cas = MockCas::start().await.unwrap();
    cas.fail_with(StatusCode::INTERNAL_SERVER_ERROR);
    let app = create_router(client_for(&cas));

    let response = send(&app, get("/?ticket=ST-1").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await["authenticated"], false);
}

#[tokio::test]
async fn cas_outage_is_reported_under_reject_policy() {
    let cas = MockCas::start().await.unwrap();
    cas.fail_with(StatusCode::INTERNAL_SERVER_ERROR);
    let config = ClientConfig::new(cas.cas_url())
        .unwrap()
        .with_validation_error_policy(ValidationErrorPolicy::Reject);
    let app = create_router(CasClient::new(config).unwrap());

    let response = send(&app, get("/?ticket=ST-1").body(Body::empty()).unwrap()).await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn concurrent_logins_get_distinct_sessions() {
    let cas = MockCas::start().await.unwrap();
    for i in 0..16 {
        cas.issue(&format!("ST-{i}"), Grant::new(&format!("user{i}")));
    }
    let client = client_for(&cas);
    let app = create_router(client.clone());

    let logins: Vec<_> = (0..16)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move { login(&app, &format!("ST-{i}")).await })
        })
        .collect();
    let mut cookies = Vec::new();
    for task in logins {
        cookies.push(task.await.unwrap());
    }

    cookies.sort();
    cookies.dedup();
    assert_eq!(cookies.len(), 16);
    assert_eq!(client.sessions().count().await.unwrap(), 16);
}
