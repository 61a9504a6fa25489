//! Integration tests for the Shopie client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopie-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog_screen` - catalog loading, search and cart controls
//! - `admin_products` - product administration through the shared form
//! - `admin_orders` - order filtering and status updates
//! - `session_lifecycle` - sign-in, sign-out and screen teardown
//! - `http_transport` - the `reqwest` transport against a local stub server
//!
//! Screen tests run against [`MockTransport`]; only `http_transport` opens
//! sockets, and only on the loopback interface.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use shopie_core::{OrderStatus, Role};
use shopie_storefront::AppState;
use shopie_storefront::presenter::Presenter;
use shopie_storefront::testing::{
    MockTransport, RecordingPresenter, order_json, product_json, signed_in_state,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// ============================================================================
// Screen harness
// ============================================================================

/// Signed-in application state over a scripted transport.
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub app: AppState,
    pub presenter: Arc<RecordingPresenter>,
}

impl Harness {
    pub async fn signed_in(role: Role) -> Self {
        let transport = MockTransport::new();
        let app = signed_in_state(&transport, role).await;
        Self {
            transport,
            app,
            presenter: RecordingPresenter::new(),
        }
    }

    pub async fn customer() -> Self {
        Self::signed_in(Role::Customer).await
    }

    pub async fn admin() -> Self {
        Self::signed_in(Role::Admin).await
    }

    /// The recording presenter as screens take it.
    #[must_use]
    pub fn presenter(&self) -> Arc<dyn Presenter> {
        self.presenter.clone()
    }
}

/// A product listing of `count` products with ids `1..=count`.
#[must_use]
pub fn products(count: i64) -> Value {
    let items: Vec<Value> = (1..=count)
        .map(|id| product_json(id, &format!("Product {id}"), 10.0, 5))
        .collect();
    Value::Array(items)
}

/// An order listing with one order per status, ids from 1.
#[must_use]
pub fn orders(statuses: &[OrderStatus]) -> Value {
    let items: Vec<Value> = statuses
        .iter()
        .zip(1..)
        .map(|(&status, id)| order_json(id, status))
        .collect();
    Value::Array(items)
}

/// Login response for a role.
#[must_use]
pub fn login_response(role: Role, token: &str) -> Value {
    json!({"token": token, "user": shopie_storefront::testing::user_json(role)})
}

// ============================================================================
// Stub HTTP server
// ============================================================================

/// A request as the stub server received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query, e.g. `/api/products/search?nom=tea`.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    /// Header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A canned response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
}

impl StubResponse {
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    #[must_use]
    pub fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
        }
    }

    #[must_use]
    pub const fn no_content() -> Self {
        Self {
            status: 204,
            body: String::new(),
        }
    }
}

#[derive(Clone)]
struct StubState {
    responses: Arc<Vec<StubResponse>>,
    served: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// `axum` server on the loopback interface answering every route.
///
/// Each request gets the next canned response; the last one repeats.
pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl StubServer {
    /// Bind to an ephemeral port and start answering.
    ///
    /// # Errors
    ///
    /// Returns the bind error.
    pub async fn start(responses: Vec<StubResponse>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let requests = Arc::new(Mutex::new(Vec::new()));

        let state = StubState {
            responses: Arc::new(responses),
            served: Arc::new(AtomicUsize::new(0)),
            requests: Arc::clone(&requests),
        };
        let app = Router::new().fallback(answer).with_state(state);
        let handle = tokio::spawn(async move { axum::serve(listener, app).await });

        Ok(Self {
            addr,
            requests,
            handle,
        })
    }

    /// Base URL with an `/api` prefix, as the backend is usually mounted.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Record the request, then answer with the next canned response.
async fn answer(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = uri
        .path_and_query()
        .map_or_else(|| uri.path().to_owned(), ToString::to_string);
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_owned(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(RecordedRequest {
            method: method.to_string(),
            target,
            headers,
            body: String::from_utf8_lossy(&body).into_owned(),
        });

    let served = state.served.fetch_add(1, Ordering::SeqCst);
    let Some(response) = state
        .responses
        .get(served)
        .or_else(|| state.responses.last())
    else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "no stub response").into_response();
    };

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if response.body.is_empty() {
        return status.into_response();
    }
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        response.body.clone(),
    )
        .into_response()
}
