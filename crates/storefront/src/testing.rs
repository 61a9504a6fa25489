//! In-memory doubles for the network and the host UI.
//!
//! Enabled for this crate's own tests and, through the `testing` feature, for
//! dependent crates.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use shopie_core::{OrderStatus, Role};
use tokio::sync::Notify;

use crate::api::{ApiError, ApiRequest, Transport};
use crate::presenter::{ConfirmPrompt, Notice, NoticeKind, Presenter};
use crate::session::{Session, SessionService};
use crate::state::AppState;

/// Token installed by the signed-in fixtures.
pub const TEST_TOKEN: &str = "test-token";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
enum Outcome {
    Json(Value),
    Empty,
    Status(StatusCode, String),
    Pending,
}

/// A scripted response.
#[derive(Debug, Clone)]
pub struct MockReply {
    outcome: Outcome,
    gate: Option<Arc<Notify>>,
}

impl MockReply {
    const fn from_outcome(outcome: Outcome) -> Self {
        Self {
            outcome,
            gate: None,
        }
    }

    /// Success with a JSON body.
    #[must_use]
    pub const fn json(body: Value) -> Self {
        Self::from_outcome(Outcome::Json(body))
    }

    /// Success with no body.
    #[must_use]
    pub const fn empty() -> Self {
        Self::from_outcome(Outcome::Empty)
    }

    /// Non-success status with a body text.
    #[must_use]
    pub fn status(status: StatusCode, body: &str) -> Self {
        Self::from_outcome(Outcome::Status(status, body.to_owned()))
    }

    /// A response that never arrives.
    #[must_use]
    pub const fn pending() -> Self {
        Self::from_outcome(Outcome::Pending)
    }

    /// Hold this reply until `gate` is notified.
    #[must_use]
    pub fn after(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

/// Transport that answers from a script and records every request.
///
/// Replies are queued per method and path (query strings are not part of the
/// match). The last reply of a queue is repeated; a route with no script
/// answers 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<MockReply>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a reply for a route.
    pub fn reply(&self, method: Method, path: &str, reply: MockReply) {
        lock(&self.routes)
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(reply);
    }

    /// Every request received, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.requests).clone()
    }

    /// Requests received on one route.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<ApiRequest> {
        lock(&self.requests)
            .iter()
            .filter(|request| request.method == *method && request.path == path)
            .cloned()
            .collect()
    }

    /// Number of requests received on one route.
    #[must_use]
    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    fn next_reply(&self, method: &Method, path: &str) -> Option<MockReply> {
        let mut routes = lock(&self.routes);
        let queue = routes.get_mut(&(method.clone(), path.to_owned()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: ApiRequest) -> Result<Option<Value>, ApiError> {
        let reply = self.next_reply(&request.method, &request.path);
        lock(&self.requests).push(request);

        let Some(reply) = reply else {
            return Err(ApiError::Status {
                status: StatusCode::NOT_FOUND,
                body: "no scripted reply".to_owned(),
            });
        };

        if let Some(gate) = reply.gate {
            gate.notified().await;
        }

        match reply.outcome {
            Outcome::Json(Value::Null) | Outcome::Empty => Ok(None),
            Outcome::Json(body) => Ok(Some(body)),
            Outcome::Status(status, body) => Err(ApiError::Status { status, body }),
            Outcome::Pending => std::future::pending().await,
        }
    }
}

/// Presenter that records what a screen asked for.
#[derive(Debug)]
pub struct RecordingPresenter {
    notices: Mutex<Vec<Notice>>,
    prompts: Mutex<Vec<ConfirmPrompt>>,
    back_navigations: AtomicUsize,
    confirm_answer: AtomicBool,
}

impl RecordingPresenter {
    /// A presenter that confirms every prompt.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Self::with_confirmation(true)
    }

    /// A presenter that answers every prompt with `answer`.
    #[must_use]
    pub fn with_confirmation(answer: bool) -> Arc<Self> {
        Arc::new(Self {
            notices: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
            back_navigations: AtomicUsize::new(0),
            confirm_answer: AtomicBool::new(answer),
        })
    }

    pub fn set_confirmation(&self, answer: bool) {
        self.confirm_answer.store(answer, Ordering::SeqCst);
    }

    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    #[must_use]
    pub fn errors(&self) -> Vec<Notice> {
        self.of_kind(NoticeKind::Error)
    }

    #[must_use]
    pub fn successes(&self) -> Vec<Notice> {
        self.of_kind(NoticeKind::Success)
    }

    fn of_kind(&self, kind: NoticeKind) -> Vec<Notice> {
        lock(&self.notices)
            .iter()
            .filter(|notice| notice.kind == kind)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn last_notice(&self) -> Option<Notice> {
        lock(&self.notices).last().cloned()
    }

    #[must_use]
    pub fn prompts(&self) -> Vec<ConfirmPrompt> {
        lock(&self.prompts).clone()
    }

    #[must_use]
    pub fn back_navigations(&self) -> usize {
        self.back_navigations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    fn notify(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }

    fn go_back(&self) {
        self.back_navigations.fetch_add(1, Ordering::SeqCst);
    }

    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        lock(&self.prompts).push(prompt.clone());
        self.confirm_answer.load(Ordering::SeqCst)
    }
}

/// Backend JSON for a user with the given role.
#[must_use]
pub fn user_json(role: Role) -> Value {
    match role {
        Role::Admin => json!({"id": 1, "email": "admin@shopie.test", "nom": "Admin", "role": "ADMIN"}),
        Role::Customer => json!({"id": 2, "email": "client@shopie.test", "nom": "Client", "role": "USER"}),
    }
}

/// Backend JSON for a product.
#[must_use]
pub fn product_json(id: i64, name: &str, price: f64, stock: u32) -> Value {
    json!({
        "id": id,
        "nom": name,
        "description": format!("{name} description"),
        "prix": price,
        "imageUrl": format!("https://img.shopie.test/{id}.jpg"),
        "stock": stock,
    })
}

/// Backend JSON for an order.
#[must_use]
pub fn order_json(id: i64, status: OrderStatus) -> Value {
    json!({
        "id": id,
        "date": "2024-03-05T14:07:09",
        "total": 59.9,
        "statut": status.as_str(),
    })
}

/// Backend JSON for a cart; each line is `(item_id, product_id, quantity)`.
#[must_use]
pub fn cart_json(lines: &[(i64, i64, u32)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|&(item_id, product_id, quantity)| {
            json!({
                "id": item_id,
                "quantite": quantity,
                "produit": product_json(product_id, &format!("Product {product_id}"), 10.0, 20),
            })
        })
        .collect();
    json!({"id": 1, "items": items})
}

fn test_session(role: Role) -> Session {
    let user = serde_json::from_value(user_json(role))
        .unwrap_or_else(|e| panic!("fixture user must decode: {e}"));
    Session {
        token: SecretString::from(TEST_TOKEN),
        user,
    }
}

/// A session service already signed in with the given role.
pub async fn signed_in_session(transport: &Arc<MockTransport>, role: Role) -> Arc<SessionService> {
    let session = Arc::new(SessionService::new(transport.clone()));
    session.establish(test_session(role)).await;
    session
}

/// Application state already signed in with the given role and an empty cart.
pub async fn signed_in_state(transport: &Arc<MockTransport>, role: Role) -> AppState {
    let state = AppState::new(transport.clone());
    state.session().establish(test_session(role)).await;
    state
}
