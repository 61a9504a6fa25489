//! Administrator gate for the management screens.

use shopie_storefront::presenter::{Notice, Presenter};
use shopie_storefront::session::{CurrentUser, SessionService};
use thiserror::Error;

/// Proof that the signed-in user is an administrator.
///
/// Management screens take one of these at construction, so a screen value
/// cannot exist for a customer session.
///
/// # Example
///
/// ```rust,ignore
/// let Some(guard) = RequireAdmin::check_or_leave(app.session(), &*presenter).await else {
///     return;
/// };
/// let screen = AdminOrdersScreen::new(guard, app, presenter).await;
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin(CurrentUser);

/// The session is missing or belongs to a non-administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Administrator role required")]
pub struct AccessDenied;

impl RequireAdmin {
    /// Check the session's role.
    ///
    /// # Errors
    ///
    /// Returns `AccessDenied` without a session or for a customer.
    pub async fn check(session: &SessionService) -> Result<Self, AccessDenied> {
        session
            .current_user()
            .await
            .filter(CurrentUser::is_admin)
            .map(Self)
            .ok_or(AccessDenied)
    }

    /// Check the session's role; on denial tell the user and leave the
    /// screen.
    pub async fn check_or_leave(session: &SessionService, presenter: &dyn Presenter) -> Option<Self> {
        match Self::check(session).await {
            Ok(guard) => Some(guard),
            Err(AccessDenied) => {
                tracing::warn!("Management screen refused to a non-administrator");
                presenter.notify(Notice::access_denied());
                presenter.go_back();
                None
            }
        }
    }

    /// The administrator the guard was issued for.
    #[must_use]
    pub const fn user(&self) -> &CurrentUser {
        &self.0
    }
}
