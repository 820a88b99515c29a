//! Router configuration.
//!
//! Every route except `/health` runs behind the CAS middleware, so Single
//! Logout notifications are accepted on any of them.

use std::collections::BTreeMap;

use axum::{
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use cas_client::{cas_middleware, CasClient, CasContext};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::trace::TraceLayer;

/// Creates the demo application router.
pub fn create_router(client: CasClient) -> Router {
    let protected = Router::new()
        .route("/", get(root).post(root))
        .route("/me", get(me))
        .route("/logout", get(logout))
        .layer(axum::middleware::from_fn_with_state(client, cas_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
}

/// Server information response.
#[derive(Serialize)]
pub struct ServerInfo {
    name: &'static str,
    version: &'static str,
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

/// The authenticated user, as reported by `/me`.
#[derive(Serialize)]
pub struct MeResponse {
    user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<i64>,
    attributes: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    authentication_date: Option<DateTime<Utc>>,
    is_new_login: bool,
    is_remembered_login: bool,
    member_of: Vec<String>,
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Root endpoint handler.
async fn root(ctx: CasContext) -> Json<ServerInfo> {
    Json(ServerInfo {
        name: "CAS demo",
        version: env!("CARGO_PKG_VERSION"),
        authenticated: ctx.is_authenticated(),
        user: ctx.user().map(str::to_string),
    })
}

/// Returns the caller's identity, sending anonymous callers to CAS.
async fn me(ctx: CasContext) -> Response {
    let Some(response) = ctx.response() else {
        return ctx.redirect_to_login();
    };

    Json(MeResponse {
        user: response.user().to_string(),
        user_id: response.user_id().ok(),
        attributes: response
            .attributes()
            .iter()
            .map(|(name, values)| (name.to_string(), values.to_vec()))
            .collect(),
        authentication_date: ctx.authentication_date(),
        is_new_login: ctx.is_new_login(),
        is_remembered_login: ctx.is_remembered_login(),
        member_of: ctx.member_of().to_vec(),
    })
    .into_response()
}

/// Drops the local session and sends the caller to CAS logout.
async fn logout(ctx: CasContext) -> Response {
    ctx.redirect_to_logout().await
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
