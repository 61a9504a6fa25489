//! Product administration commands.

use std::sync::Arc;

use clap::Args;
use shopie_admin::AdminProductsScreen;
use shopie_admin::products::ProductForm;
use shopie_core::ProductId;
use shopie_storefront::AppState;
use shopie_storefront::presenter::Presenter;
use shopie_storefront::screens::ActionOutcome;

use super::{CommandError, completed};
use crate::output;

/// Product form fields. Omitted fields keep their current value when
/// editing and stay empty when creating.
#[derive(Debug, Clone, Default, Args)]
pub struct ProductArgs {
    #[arg(short, long)]
    pub name: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    /// Price in euros, e.g. `9.90`
    #[arg(short, long)]
    pub price: Option<String>,
    #[arg(short, long)]
    pub image_url: Option<String>,
    #[arg(short, long)]
    pub stock: Option<String>,
}

impl ProductArgs {
    fn apply(self, form: &mut ProductForm) {
        let fields = [
            (self.name, &mut form.name),
            (self.description, &mut form.description),
            (self.price, &mut form.price),
            (self.image_url, &mut form.image_url),
            (self.stock, &mut form.stock),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

async fn open(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
) -> Result<AdminProductsScreen, CommandError> {
    AdminProductsScreen::open(app.clone(), presenter)
        .await
        .ok_or(CommandError::AccessDenied)
}

/// List every product.
pub async fn list(app: &AppState, presenter: Arc<dyn Presenter>) -> Result<(), CommandError> {
    let screen = open(app, presenter).await?;
    output::product_rows(&screen.rows().await);
    Ok(())
}

/// Create a product from the given fields.
pub async fn create(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    fields: ProductArgs,
) -> Result<(), CommandError> {
    let screen = open(app, presenter).await?;
    screen.open_create().await;
    screen.edit_form(|form| fields.apply(form)).await;

    completed(screen.save().await)?;
    output::product_rows(&screen.rows().await);
    Ok(())
}

/// Change the given fields of a product.
pub async fn edit(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    product_id: ProductId,
    fields: ProductArgs,
) -> Result<(), CommandError> {
    let screen = open(app, presenter).await?;
    if !screen.open_edit(product_id).await {
        return Err(CommandError::NotFound(format!("Product {product_id}")));
    }
    screen.edit_form(|form| fields.apply(form)).await;

    completed(screen.save().await)?;
    output::product_rows(&screen.rows().await);
    Ok(())
}

/// Delete a product after confirmation.
pub async fn delete(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    product_id: ProductId,
) -> Result<(), CommandError> {
    let screen = open(app, presenter).await?;
    if screen.rows().await.iter().all(|row| row.id != product_id) {
        return Err(CommandError::NotFound(format!("Product {product_id}")));
    }

    match screen.request_delete(product_id).await {
        // Declined; the presenter already said how to confirm.
        ActionOutcome::Skipped => Ok(()),
        outcome => {
            completed(outcome)?;
            output::product_rows(&screen.rows().await);
            Ok(())
        }
    }
}
