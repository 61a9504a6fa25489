//! Cart commands, driven through the catalog screen's cart controls.

use std::sync::Arc;

use shopie_core::ProductId;
use shopie_storefront::AppState;
use shopie_storefront::presenter::Presenter;
use shopie_storefront::screens::{ActionOutcome, CatalogScreen};

use super::{CommandError, completed};
use crate::output;

/// Add one unit of a product.
pub async fn add(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    product_id: ProductId,
) -> Result<(), CommandError> {
    let screen = CatalogScreen::new(app.clone(), presenter).await;
    completed(screen.mount().await)?;

    let Some(card) = screen
        .cards()
        .await
        .into_iter()
        .find(|card| card.product.id == product_id)
    else {
        return Err(CommandError::NotFound(format!("Product {product_id}")));
    };
    if !card.show_cart_actions {
        return Err(CommandError::NotAllowed(
            "Administrator accounts have no cart",
        ));
    }
    if !card.can_add {
        return Err(CommandError::NotAllowed("This product is out of stock"));
    }

    completed(screen.add_to_cart(product_id).await)?;
    show(app).await;
    Ok(())
}

/// One more unit of a product in the cart.
pub async fn increment(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    product_id: ProductId,
) -> Result<(), CommandError> {
    let screen = CatalogScreen::new(app.clone(), presenter).await;
    in_cart(app, product_id).await?;
    completed(screen.increment(product_id).await)?;
    show(app).await;
    Ok(())
}

/// One less unit of a product; the last unit removes it.
pub async fn decrement(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    product_id: ProductId,
) -> Result<(), CommandError> {
    let screen = CatalogScreen::new(app.clone(), presenter).await;
    in_cart(app, product_id).await?;
    completed(screen.decrement(product_id).await)?;
    show(app).await;
    Ok(())
}

/// Remove a product from the cart.
pub async fn remove(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    product_id: ProductId,
) -> Result<(), CommandError> {
    let screen = CatalogScreen::new(app.clone(), presenter).await;
    match screen.remove_from_cart(product_id).await {
        ActionOutcome::Skipped => Err(CommandError::NotAllowed(
            "Administrator accounts have no cart",
        )),
        outcome => {
            completed(outcome)?;
            show(app).await;
            Ok(())
        }
    }
}

/// Print the cart as last loaded.
pub async fn show(app: &AppState) {
    output::cart(&app.cart().snapshot().await);
}

async fn in_cart(app: &AppState, product_id: ProductId) -> Result<(), CommandError> {
    if app.session().is_admin().await {
        return Err(CommandError::NotAllowed(
            "Administrator accounts have no cart",
        ));
    }
    if app.cart().item_for(product_id).await.is_none() {
        return Err(CommandError::NotFound(format!(
            "Product {product_id} in the cart"
        )));
    }
    Ok(())
}
