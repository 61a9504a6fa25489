//! Application state shared across screens.

use std::sync::Arc;

use secrecy::SecretString;

use crate::api::{ApiError, HttpTransport, Transport};
use crate::cart::CartService;
use crate::config::ClientConfig;
use crate::session::{CurrentUser, SessionService};

/// Services every screen is built from.
///
/// This struct is cheaply cloneable via `Arc`. Screens receive it at
/// construction and never replace the services it holds; signing out ends
/// the session and empties the cart in place.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    session: Arc<SessionService>,
    cart: Arc<CartService>,
}

impl AppState {
    /// Create application state over a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let session = Arc::new(SessionService::new(transport));
        let cart = Arc::new(CartService::new(Arc::clone(&session)));

        Self {
            inner: Arc::new(AppStateInner { session, cart }),
        }
    }

    /// Create application state talking HTTP to the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn connect(config: &ClientConfig) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport)))
    }

    /// Get a reference to the session service.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionService> {
        &self.inner.session
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn cart(&self) -> &Arc<CartService> {
        &self.inner.cart
    }

    /// Sign in and load the new user's cart.
    ///
    /// A rejected sign-in leaves the current session and cart as they were.
    /// A cart that fails to load is logged and left empty; the sign-in still
    /// succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the sign-in fails.
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<CurrentUser, ApiError> {
        let user = self.inner.session.login(email, password).await?;
        self.inner.cart.reset().await;
        self.load_cart().await;
        Ok(user)
    }

    /// Reopen a session from a stored token and load its cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the token is rejected.
    pub async fn resume(&self, token: SecretString) -> Result<CurrentUser, ApiError> {
        let user = self.inner.session.resume(token).await?;
        self.inner.cart.reset().await;
        self.load_cart().await;
        Ok(user)
    }

    /// Sign out, ending every open screen, and forget the cart.
    pub async fn logout(&self) {
        self.inner.session.logout().await;
        self.inner.cart.reset().await;
    }

    async fn load_cart(&self) {
        if let Err(e) = self.inner.cart.refresh().await {
            tracing::warn!(error = %e, "Failed to load cart after sign-in");
        }
    }
}
