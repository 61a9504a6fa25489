//! Catalog browsing commands.

use std::sync::Arc;

use shopie_storefront::AppState;
use shopie_storefront::presenter::Presenter;
use shopie_storefront::screens::{ActionOutcome, CatalogScreen};

use super::{CommandError, completed};
use crate::output;

/// List every product.
pub async fn list(app: &AppState, presenter: Arc<dyn Presenter>) -> Result<(), CommandError> {
    let screen = CatalogScreen::new(app.clone(), presenter).await;
    completed(screen.mount().await)?;
    render(&screen).await;
    Ok(())
}

/// List products matching a name query.
///
/// The query goes through the search box, so one or two characters are
/// refused the same way the screen ignores them.
pub async fn search(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    query: &str,
) -> Result<(), CommandError> {
    let screen = CatalogScreen::new(app.clone(), presenter).await;
    match screen.on_search_text_changed(query).await {
        ActionOutcome::Skipped => {
            return Err(CommandError::NotAllowed(
                "Search needs at least three characters",
            ));
        }
        outcome => completed(outcome)?,
    }
    render(&screen).await;
    Ok(())
}

async fn render(screen: &CatalogScreen) {
    let snapshot = screen.snapshot().await;
    output::catalog(&snapshot.cards, snapshot.cart_badge);
}
