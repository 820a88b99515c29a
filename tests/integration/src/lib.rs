//! Test harness: an in-process mock CAS server.
//!
//! Serves the three validation endpoints under `/cas` on a random local
//! port. Tickets are registered up front and consumed on first validation,
//! as a real CAS server does.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Date sent in CAS 3.0 responses, with the zone suffix some servers add.
pub const AUTHENTICATION_DATE: &str = "2024-05-01T10:15:30.123+02:00[Europe/Berlin]";

/// A user a ticket was issued for.
#[derive(Debug, Clone)]
pub struct Grant {
    /// Principal.
    pub user: String,
    /// Attributes released under CAS 3.0.
    pub attributes: Vec<(String, String)>,
}

impl Grant {
    /// A grant for `user` with no attributes.
    pub fn new(user: &str) -> Self {
        Self {
            user: user.to_string(),
            attributes: Vec::new(),
        }
    }

    /// Adds an attribute value.
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.push((name.to_string(), value.to_string()));
        self
    }
}

/// A validation request as seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    /// Endpoint path.
    pub path: String,
    /// `service` parameter.
    pub service: String,
    /// `ticket` parameter.
    pub ticket: String,
}

#[derive(Default)]
struct MockState {
    tickets: Mutex<HashMap<String, Grant>>,
    seen: Mutex<Vec<SeenRequest>>,
    failure_status: Mutex<Option<StatusCode>>,
    delay: Mutex<Option<Duration>>,
}

#[derive(Debug, Deserialize)]
struct ValidateParams {
    service: String,
    ticket: String,
}

/// A running mock CAS server.
pub struct MockCas {
    cas_url: Url,
    state: Arc<MockState>,
    task: JoinHandle<()>,
}

impl MockCas {
    /// Starts a mock on `127.0.0.1:0`.
    pub async fn start() -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("cas_client=debug,cas_protocol=debug,cas_session=debug")
            .with_test_writer()
            .try_init();

        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/cas/validate", get(validate_v1))
            .route("/cas/serviceValidate", get(validate_v2))
            .route("/cas/p3/serviceValidate", get(validate_v3))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Mock CAS server error: {}", e);
            }
        });

        let cas_url = Url::parse(&format!("http://{addr}/cas"))?;
        Ok(Self {
            cas_url,
            state,
            task,
        })
    }

    /// Base URL of the mock, including the `/cas` prefix.
    pub fn cas_url(&self) -> Url {
        self.cas_url.clone()
    }

    /// Registers a ticket that validates once for `grant`.
    pub fn issue(&self, ticket: &str, grant: Grant) {
        self.state.tickets.lock().insert(ticket.to_string(), grant);
    }

    /// Makes every validation call answer with `status`.
    pub fn fail_with(&self, status: StatusCode) {
        *self.state.failure_status.lock() = Some(status);
    }

    /// Delays every validation answer.
    pub fn delay(&self, delay: Duration) {
        *self.state.delay.lock() = Some(delay);
    }

    /// Validation requests received so far.
    pub fn seen(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().clone()
    }
}

impl Drop for MockCas {
    fn drop(&mut self) {
        self.task.abort();
    }
}

enum Answer {
    Fault(StatusCode),
    Granted(Grant),
    Unknown(String),
}

async fn answer(state: &MockState, path: &str, params: ValidateParams) -> Answer {
    state.seen.lock().push(SeenRequest {
        path: path.to_string(),
        service: params.service.clone(),
        ticket: params.ticket.clone(),
    });

    let delay = *state.delay.lock();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let failure = *state.failure_status.lock();
    if let Some(status) = failure {
        return Answer::Fault(status);
    }

    let grant = state.tickets.lock().remove(&params.ticket);
    match grant {
        Some(grant) => Answer::Granted(grant),
        None => Answer::Unknown(params.ticket),
    }
}

async fn validate_v1(
    State(state): State<Arc<MockState>>,
    Query(params): Query<ValidateParams>,
) -> Response {
    match answer(&state, "/cas/validate", params).await {
        Answer::Fault(status) => (status, "CAS is unwell").into_response(),
        Answer::Granted(grant) => format!("yes\n{}\n", grant.user).into_response(),
        Answer::Unknown(_) => "no\n\n".into_response(),
    }
}

async fn validate_v2(
    State(state): State<Arc<MockState>>,
    Query(params): Query<ValidateParams>,
) -> Response {
    match answer(&state, "/cas/serviceValidate", params).await {
        Answer::Fault(status) => (status, "CAS is unwell").into_response(),
        Answer::Granted(grant) => xml(success(&grant, false)),
        Answer::Unknown(ticket) => xml(failure(&ticket)),
    }
}

async fn validate_v3(
    State(state): State<Arc<MockState>>,
    Query(params): Query<ValidateParams>,
) -> Response {
    match answer(&state, "/cas/p3/serviceValidate", params).await {
        Answer::Fault(status) => (status, "CAS is unwell").into_response(),
        Answer::Granted(grant) => xml(success(&grant, true)),
        Answer::Unknown(ticket) => xml(failure(&ticket)),
    }
}

fn xml(body: String) -> Response {
    ([("content-type", "application/xml;charset=UTF-8")], body).into_response()
}

fn success(grant: &Grant, with_attributes: bool) -> String {
    let mut attributes = String::new();
    if with_attributes {
        attributes.push_str("<cas:attributes>");
        attributes.push_str(&format!(
            "<cas:authenticationDate>{AUTHENTICATION_DATE}</cas:authenticationDate>"
        ));
        attributes.push_str("<cas:isFromNewLogin>true</cas:isFromNewLogin>");
        attributes.push_str(
            "<cas:longTermAuthenticationRequestTokenUsed>false</cas:longTermAuthenticationRequestTokenUsed>",
        );
        for (name, value) in &grant.attributes {
            attributes.push_str(&format!("<cas:{name}>{value}</cas:{name}>"));
        }
        attributes.push_str("</cas:attributes>");
    }

    format!(
        r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
    <cas:authenticationSuccess>
        <cas:user>{}</cas:user>
        {attributes}
    </cas:authenticationSuccess>
</cas:serviceResponse>"#,
        grant.user
    )
}

fn failure(ticket: &str) -> String {
    format!(
        r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
    <cas:authenticationFailure code="INVALID_TICKET">Ticket {ticket} not recognized</cas:authenticationFailure>
</cas:serviceResponse>"#
    )
}

/// Builds a SAML logout notification naming `ticket`.
pub fn logout_request(ticket: &str) -> String {
    format!(
        r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="LR-{ticket}" Version="2.0" IssueInstant="2024-05-01T08:30:00Z"><saml:NameID>@NOT_USED@</saml:NameID><samlp:SessionIndex>{ticket}</samlp:SessionIndex></samlp:LogoutRequest>"#
    )
}
