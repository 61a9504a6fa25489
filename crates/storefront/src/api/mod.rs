//! Backend REST API access.
//!
//! # Architecture
//!
//! - Every call goes through the [`Transport`] trait, which sends one
//!   [`ApiRequest`] and returns the decoded JSON body
//! - [`HttpTransport`] is the production implementation on `reqwest`
//! - Credentials are attached by the session service, never by screens
//! - The backend is the source of truth: nothing is cached here
//!
//! # Example
//!
//! ```rust,ignore
//! use shopie_storefront::api::{ApiRequest, HttpTransport, Transport, endpoints};
//!
//! let transport = HttpTransport::new(&config)?;
//! let products = transport
//!     .execute(ApiRequest::get(endpoints::PRODUCTS))
//!     .await?;
//! ```

mod http;

pub use http::HttpTransport;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::SecretString;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// Response status.
        status: StatusCode,
        /// Response body, truncated.
        body: String,
    },

    /// JSON encoding or decoding failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A response body was required but none was sent.
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// No session is open.
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl ApiError {
    /// Response status, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// One backend call.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub bearer: Option<SecretString>,
}

impl ApiRequest {
    /// Create a request with no query, body or credentials.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            bearer: None,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter. Values are percent-encoded by the transport.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Parse` if the body cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn bearer(mut self, token: SecretString) -> Self {
        self.bearer = Some(token);
        self
    }

    /// Value of a query parameter.
    #[must_use]
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Sends requests to the backend.
///
/// Implementations surface non-success responses as `ApiError::Status` and
/// return `Ok(None)` for an empty or `null` body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<Option<serde_json::Value>, ApiError>;
}

/// Endpoint paths, relative to the API base URL.
pub mod endpoints {
    use shopie_core::{CartItemId, OrderId, OrderStatus, ProductId, StatusFilter};

    pub const LOGIN: &str = "/auth/login";
    pub const CURRENT_USER: &str = "/auth/me";

    pub const PRODUCTS: &str = "/products";
    pub const PRODUCT_SEARCH: &str = "/products/search";
    /// Query parameter carrying the name filter.
    pub const PRODUCT_SEARCH_PARAM: &str = "nom";

    pub const ORDERS_ALL: &str = "/orders/admin/all";
    /// Query parameter carrying the target status of an update.
    pub const ORDER_STATUS_PARAM: &str = "statut";

    pub const CART: &str = "/cart";
    pub const CART_ITEMS: &str = "/cart/items";
    /// Query parameter carrying the new quantity of a cart line.
    pub const CART_QUANTITY_PARAM: &str = "quantite";

    /// Path of a single product (update, delete).
    #[must_use]
    pub fn product(id: ProductId) -> String {
        format!("{PRODUCTS}/{id}")
    }

    /// Orders in one status.
    #[must_use]
    pub fn orders_by_status(status: OrderStatus) -> String {
        format!("/orders/admin/status/{status}")
    }

    /// Collection endpoint for an order list filter.
    #[must_use]
    pub fn orders_for(filter: StatusFilter) -> String {
        match filter {
            StatusFilter::All => ORDERS_ALL.to_owned(),
            StatusFilter::Only(status) => orders_by_status(status),
        }
    }

    /// Status update path of an order.
    #[must_use]
    pub fn order_status(id: OrderId) -> String {
        format!("/orders/admin/{id}/status")
    }

    /// Path of a single cart line.
    #[must_use]
    pub fn cart_item(id: CartItemId) -> String {
        format!("{CART_ITEMS}/{id}")
    }
}
