//! Authentication session.
//!
//! The session service owns the bearer token and the signed-in user. Screens
//! read the role from it and send every request through
//! [`SessionService::authenticated_request`], which attaches the token.
//!
//! # Lifecycle
//!
//! A session starts with [`SessionService::login`] (or
//! [`SessionService::resume`] with a stored token) and ends with
//! [`SessionService::logout`]. Each session has its own cancellation token;
//! screen scopes are children of it, so logging out discards every response
//! still in flight.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use shopie_core::{Role, UserId};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::api::{ApiError, ApiRequest, Transport, endpoints};
use crate::scope::ScreenScope;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    #[serde(rename = "nom", default)]
    pub name: Option<String>,
    pub role: Role,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Token and identity of an open session.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: SecretString,
    pub user: CurrentUser,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: CurrentUser,
}

/// Session state shared by every screen.
pub struct SessionService {
    transport: Arc<dyn Transport>,
    session: RwLock<Option<Session>>,
    lifetime: RwLock<CancellationToken>,
}

impl SessionService {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            session: RwLock::new(None),
            lifetime: RwLock::new(CancellationToken::new()),
        }
    }

    /// Sign in with email and password.
    ///
    /// Replaces any open session.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the request fails, the backend rejects the
    /// credentials, or the response carries no session.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<CurrentUser, ApiError> {
        let request = ApiRequest::post(endpoints::LOGIN).json(&LoginRequest {
            email: email.trim(),
            password: password.expose_secret(),
        })?;

        let value = self
            .transport
            .execute(request)
            .await?
            .ok_or_else(|| ApiError::EmptyResponse(endpoints::LOGIN.to_owned()))?;
        let response: LoginResponse = serde_json::from_value(value)?;

        let user = response.user.clone();
        self.establish(Session {
            token: SecretString::from(response.token),
            user: response.user,
        })
        .await;

        tracing::info!(user_id = %user.id, role = %user.role, "Signed in");
        Ok(user)
    }

    /// Reopen a session from a stored token by asking who it belongs to.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn resume(&self, token: SecretString) -> Result<CurrentUser, ApiError> {
        let value = self
            .transport
            .execute(ApiRequest::get(endpoints::CURRENT_USER).bearer(token.clone()))
            .await?
            .ok_or_else(|| ApiError::EmptyResponse(endpoints::CURRENT_USER.to_owned()))?;
        let user: CurrentUser = serde_json::from_value(value)?;

        self.establish(Session {
            token,
            user: user.clone(),
        })
        .await;

        tracing::info!(user_id = %user.id, role = %user.role, "Session resumed");
        Ok(user)
    }

    /// Install an already-authenticated session.
    pub async fn establish(&self, session: Session) {
        self.renew_lifetime().await;
        *self.session.write().await = Some(session);
    }

    /// End the session and cancel every scope created under it.
    pub async fn logout(&self) {
        let previous = self.session.write().await.take();
        self.renew_lifetime().await;
        if let Some(session) = previous {
            tracing::info!(user_id = %session.user.id, "Signed out");
        }
    }

    async fn renew_lifetime(&self) {
        let mut lifetime = self.lifetime.write().await;
        lifetime.cancel();
        *lifetime = CancellationToken::new();
    }

    /// The signed-in user, if any.
    pub async fn current_user(&self) -> Option<CurrentUser> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|session| session.user.clone())
    }

    /// Role of the signed-in user; no session counts as a customer.
    pub async fn role(&self) -> Role {
        self.session
            .read()
            .await
            .as_ref()
            .map_or(Role::Customer, |session| session.user.role)
    }

    pub async fn is_admin(&self) -> bool {
        self.role().await.is_admin()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    /// A scope for a new screen, ended by [`Self::logout`].
    pub async fn screen_scope(&self) -> ScreenScope {
        ScreenScope::new(self.lifetime.read().await.child_token())
    }

    /// Send a request with the session's credentials and decode the body.
    ///
    /// Returns `Ok(None)` when the backend sends no body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotAuthenticated` without a session, otherwise any
    /// transport or decoding error.
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn authenticated_request<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Option<T>, ApiError> {
        let token = self
            .session
            .read()
            .await
            .as_ref()
            .map(|session| session.token.clone())
            .ok_or(ApiError::NotAuthenticated)?;

        let body = self.transport.execute(request.bearer(token)).await?;
        Ok(body.map(serde_json::from_value).transpose()?)
    }

    /// Send a request with the session's credentials, ignoring any body.
    ///
    /// # Errors
    ///
    /// Same as [`Self::authenticated_request`], minus decoding.
    pub async fn authenticated_send(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.authenticated_request::<serde_json::Value>(request)
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::Method;

    use super::*;
    use crate::testing::{MockReply, MockTransport, user_json};

    #[tokio::test]
    async fn test_login_stores_session() {
        let transport = MockTransport::new();
        transport.reply(
            Method::POST,
            endpoints::LOGIN,
            MockReply::json(serde_json::json!({
                "token": "tok-123",
                "user": user_json(Role::Admin),
            })),
        );
        let session = SessionService::new(transport.clone());

        let user = session
            .login(" admin@shopie.test ", &SecretString::from("pw"))
            .await
            .unwrap();

        assert!(user.is_admin());
        assert!(session.is_admin().await);
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        let body = sent[0].body.as_ref().unwrap();
        assert_eq!(body["email"], "admin@shopie.test");
        assert!(sent[0].bearer.is_none());
    }

    #[tokio::test]
    async fn test_login_failure_leaves_no_session() {
        let transport = MockTransport::new();
        transport.reply(
            Method::POST,
            endpoints::LOGIN,
            MockReply::status(reqwest::StatusCode::UNAUTHORIZED, "bad credentials"),
        );
        let session = SessionService::new(transport.clone());

        let err = session
            .login("a@b.c", &SecretString::from("nope"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(reqwest::StatusCode::UNAUTHORIZED));
        assert!(!session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_authenticated_request_attaches_token() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, "/ping", MockReply::json(serde_json::json!([1, 2])));
        let session = SessionService::new(transport.clone());
        session
            .establish(Session {
                token: SecretString::from("tok-9"),
                user: serde_json::from_value(user_json(Role::Customer)).unwrap(),
            })
            .await;

        let body: Option<Vec<i32>> = session
            .authenticated_request(ApiRequest::get("/ping"))
            .await
            .unwrap();

        assert_eq!(body, Some(vec![1, 2]));
        let sent = transport.requests();
        assert_eq!(sent[0].bearer.as_ref().unwrap().expose_secret(), "tok-9");
    }

    #[tokio::test]
    async fn test_authenticated_request_without_session() {
        let transport = MockTransport::new();
        let session = SessionService::new(transport.clone());

        let err = session
            .authenticated_send(ApiRequest::get("/ping"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NotAuthenticated));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_logout_ends_screen_scopes() {
        let transport = MockTransport::new();
        let session = SessionService::new(transport);
        session
            .establish(Session {
                token: SecretString::from("tok"),
                user: serde_json::from_value(user_json(Role::Customer)).unwrap(),
            })
            .await;
        let scope = session.screen_scope().await;
        assert!(scope.is_active());

        session.logout().await;

        assert!(!scope.is_active());
        assert!(session.current_user().await.is_none());
        assert!(session.screen_scope().await.is_active());
    }
}
