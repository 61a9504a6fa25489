//! CLI command implementations.
//!
//! Each command opens the screen a user would, drives it through the same
//! actions, and renders the resulting state.

pub mod cart;
pub mod catalog;
pub mod orders;
pub mod products;

use shopie_storefront::AppState;
use shopie_storefront::api::ApiError;
use shopie_storefront::config::{ClientConfig, ConfigError};
use shopie_storefront::screens::ActionOutcome;
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("No credentials: set SHOPIE_TOKEN, or SHOPIE_EMAIL and SHOPIE_PASSWORD")]
    NoCredentials,

    #[error("Administrator role required")]
    AccessDenied,

    #[error("{0} not found")]
    NotFound(String),

    /// The screen reported the problem; this only sets the exit status.
    #[error("Action did not complete ({0:?})")]
    Incomplete(ActionOutcome),

    #[error("{0}")]
    NotAllowed(&'static str),
}

/// Open a session from the configured credentials.
///
/// A stored token wins over email and password.
pub async fn sign_in(config: &ClientConfig) -> Result<AppState, CommandError> {
    let app = AppState::connect(config)?;
    let credentials = &config.credentials;

    let user = match (&credentials.token, &credentials.email, &credentials.password) {
        (Some(token), _, _) => app.resume(token.clone()).await?,
        (None, Some(email), Some(password)) => app.login(email, password).await?,
        _ => return Err(CommandError::NoCredentials),
    };

    tracing::debug!(email = %user.email, role = %user.role, "Session open");
    Ok(app)
}

/// Treat anything but a completed action as a failed command.
fn completed(outcome: ActionOutcome) -> Result<(), CommandError> {
    if outcome.is_completed() {
        Ok(())
    } else {
        Err(CommandError::Incomplete(outcome))
    }
}
