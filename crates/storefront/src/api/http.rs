//! `reqwest`-backed transport.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use tracing::{debug, instrument};
use url::Url;

use super::{ApiError, ApiRequest, Transport};
use crate::config::ClientConfig;

/// Longest response body kept in errors and logs.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// HTTP transport for the backend REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct HttpTransport {
    inner: Arc<HttpTransportInner>,
}

struct HttpTransportInner {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(HttpTransportInner {
                client: builder.build()?,
                base_url: config.api_base_url.clone(),
            }),
        })
    }

    /// Resolve a request's path and query against the base URL.
    ///
    /// The path is appended to the base path rather than joined, so a base
    /// of `https://host/api` and a path of `/products` give
    /// `https://host/api/products`.
    fn url_for(&self, request: &ApiRequest) -> Url {
        let base = &self.inner.base_url;
        let mut url = base.clone();
        url.set_path(&format!(
            "{}/{}",
            base.path().trim_end_matches('/'),
            request.path.trim_start_matches('/')
        ));
        url.set_query(None);
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn execute(&self, request: ApiRequest) -> Result<Option<serde_json::Value>, ApiError> {
        let url = self.url_for(&request);

        let mut builder = self.inner.client.request(request.method.clone(), url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            let body = truncate(&response_text);
            tracing::error!(status = %status, body = %body, "Backend returned non-success status");
            return Err(ApiError::Status { status, body });
        }

        if response_text.trim().is_empty() {
            debug!(status = %status, "Empty response body");
            return Ok(None);
        }

        let value: serde_json::Value = match serde_json::from_str(&response_text) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %truncate(&response_text),
                    "Failed to parse backend response"
                );
                return Err(ApiError::Parse(e));
            }
        };

        Ok((!value.is_null()).then_some(value))
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::endpoints;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(&ClientConfig::for_base_url(base).unwrap()).unwrap()
    }

    #[test]
    fn test_url_keeps_base_path() {
        let transport = transport("https://api.example.com/api/");
        let url = transport
            .url_for(&ApiRequest::get(endpoints::PRODUCTS));
        assert_eq!(url.as_str(), "https://api.example.com/api/products");
    }

    #[test]
    fn test_url_without_base_path() {
        let transport = transport("http://localhost:8080");
        let url = transport
            .url_for(&ApiRequest::get(endpoints::ORDERS_ALL));
        assert_eq!(url.as_str(), "http://localhost:8080/orders/admin/all");
    }

    #[test]
    fn test_url_encodes_query() {
        let transport = transport("http://localhost:8080/api");
        let request = ApiRequest::get(endpoints::PRODUCT_SEARCH).query("nom", "tea & cups");
        let url = transport.url_for(&request);
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/api/products/search?nom=tea+%26+cups"
        );
    }

    #[test]
    fn test_truncate_long_bodies() {
        let long = "x".repeat(500);
        assert_eq!(truncate(&long).len(), MAX_ERROR_BODY_CHARS);
        assert_eq!(truncate("short"), "short");
    }
}
