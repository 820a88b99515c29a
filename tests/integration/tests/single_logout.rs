//! Single Logout notifications posted by the CAS server.

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Method, StatusCode,
    },
    response::Response,
    Router,
};
use cas_integration_tests::{logout_request, Grant, MockCas};
use cas_server::create_router;

use crate::session_flow::{client_for, get, login, send};

fn notification(path: &str, ticket: &str) -> axum::http::Request<Body> {
    let form = serde_urlencoded::to_string([("logoutRequest", logout_request(ticket))]).unwrap();
    get(path)
        .method(Method::POST)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap()
}

async fn text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn me_with(app: &Router, cookie: &str) -> Response {
    send(
        app,
        get("/me")
            .header(COOKIE, format!("_cas_session={cookie}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

#[tokio::test]
async fn logout_notification_ends_session() {
    let cas = MockCas::start().await.unwrap();
    cas.issue("ST-123", Grant::new("alice").with_attribute("uid", "42"));
    let client = client_for(&cas);
    let app = create_router(client.clone());
    let cookie = login(&app, "ST-123").await;

    let response = send(&app, notification("/", "ST-123")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "OK");

    assert!(client.sessions().get(&cookie).await.unwrap().is_none());
    assert!(client.sessions().get_by_ticket("ST-123").await.unwrap().is_none());

    let response = me_with(&app, &cookie).await;
    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(response
        .headers()
        .get(LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("/cas/login?service="));
    let cleared = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with("_cas_session=;"));
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn repeated_notification_is_an_error() {
    let cas = MockCas::start().await.unwrap();
    cas.issue("ST-123", Grant::new("alice"));
    let app = create_router(client_for(&cas));
    login(&app, "ST-123").await;

    assert_eq!(send(&app, notification("/", "ST-123")).await.status(), StatusCode::OK);

    let response = send(&app, notification("/", "ST-123")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(text(response).await.contains("ST-123"));
}

#[tokio::test]
async fn notification_is_accepted_on_any_protected_path() {
    let cas = MockCas::start().await.unwrap();
    cas.issue("ST-9", Grant::new("bob"));
    let client = client_for(&cas);
    let app = create_router(client.clone());
    login(&app, "ST-9").await;

    let response = send(&app, notification("/me", "ST-9")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(client.sessions().count().await.unwrap(), 0);
}

#[tokio::test]
async fn logout_only_touches_the_named_session() {
    let cas = MockCas::start().await.unwrap();
    cas.issue("ST-a", Grant::new("alice"));
    cas.issue("ST-b", Grant::new("bob"));
    let client = client_for(&cas);
    let app = create_router(client.clone());
    let alice = login(&app, "ST-a").await;
    let bob = login(&app, "ST-b").await;

    assert_eq!(send(&app, notification("/", "ST-a")).await.status(), StatusCode::OK);

    assert_eq!(me_with(&app, &alice).await.status(), StatusCode::FOUND);
    let response = me_with(&app, &bob).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(client.sessions().count().await.unwrap(), 1);
}

#[tokio::test]
async fn malformed_notification_is_rejected() {
    let cas = MockCas::start().await.unwrap();
    let app = create_router(client_for(&cas));

    let form = serde_urlencoded::to_string([("logoutRequest", "<not-saml/>")]).unwrap();
    let response = send(
        &app,
        get("/")
            .method(Method::POST)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn ordinary_form_posts_pass_through() {
    let cas = MockCas::start().await.unwrap();
    let app = create_router(client_for(&cas));

    let response = send(
        &app,
        get("/")
            .method(Method::POST)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("comment=hello"))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text(response).await.contains("\"authenticated\":false"));
}
