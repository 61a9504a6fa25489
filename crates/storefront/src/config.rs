//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIE_API_BASE_URL` - Base URL of the backend REST API
//!   (e.g. `https://api.shopie.example/api`)
//!
//! ## Optional
//! - `SHOPIE_API_TIMEOUT_SECS` - Per-request timeout; unset leaves the HTTP
//!   client's default in place
//! - `SHOPIE_EMAIL` - Account email used by the terminal front end to log in
//! - `SHOPIE_PASSWORD` - Account password used by the terminal front end
//! - `SHOPIE_TOKEN` - Existing session token, used instead of a password
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to
    pub api_base_url: Url,
    /// Request timeout; `None` keeps the transport default
    pub request_timeout: Option<Duration>,
    /// Stored login credentials
    pub credentials: CredentialsConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Login material for non-interactive front ends.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone, Default)]
pub struct CredentialsConfig {
    pub email: Option<String>,
    pub password: Option<SecretString>,
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("request_timeout", &self.request_timeout)
            .field("credentials", &self.credentials)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsConfig")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(&get_required_env("SHOPIE_API_BASE_URL")?)?;
        let request_timeout = get_optional_env("SHOPIE_API_TIMEOUT_SECS")
            .map(|raw| parse_timeout(&raw))
            .transpose()?;

        Ok(Self {
            api_base_url,
            request_timeout,
            credentials: CredentialsConfig::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Build a configuration for a base URL with every optional setting unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url(base_url)?,
            request_timeout: None,
            credentials: CredentialsConfig::default(),
            sentry_dsn: None,
        })
    }
}

impl CredentialsConfig {
    fn from_env() -> Self {
        Self {
            email: get_optional_env("SHOPIE_EMAIL"),
            password: get_optional_env("SHOPIE_PASSWORD").map(SecretString::from),
            token: get_optional_env("SHOPIE_TOKEN").map(SecretString::from),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating an empty value as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        ConfigError::InvalidEnvVar("SHOPIE_API_BASE_URL".to_string(), e.to_string())
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "SHOPIE_API_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    let secs = raw.trim().parse::<u64>().map_err(|e| {
        ConfigError::InvalidEnvVar("SHOPIE_API_TIMEOUT_SECS".to_string(), e.to_string())
    })?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "SHOPIE_API_TIMEOUT_SECS".to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}
