//! Order administration commands.

use std::sync::Arc;

use shopie_admin::AdminOrdersScreen;
use shopie_core::{Order, OrderId, OrderStatus, StatusFilter};
use shopie_storefront::AppState;
use shopie_storefront::presenter::Presenter;
use shopie_storefront::screens::ActionOutcome;

use super::{CommandError, completed};
use crate::output;

async fn open(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    filter: StatusFilter,
) -> Result<AdminOrdersScreen, CommandError> {
    let screen = AdminOrdersScreen::open(app.clone(), presenter)
        .await
        .ok_or(CommandError::AccessDenied)?;
    if filter != StatusFilter::All {
        completed(screen.set_filter(filter).await)?;
    }
    Ok(screen)
}

async fn render(screen: &AdminOrdersScreen) {
    output::order_rows(
        &screen.rows().await,
        &screen.count_label().await,
        &screen.empty_message().await,
    );
}

/// List orders, optionally in one status only.
pub async fn list(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    filter: StatusFilter,
) -> Result<(), CommandError> {
    let screen = open(app, presenter, filter).await?;
    render(&screen).await;
    Ok(())
}

/// Show one order and its status actions.
pub async fn show(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    order_id: OrderId,
) -> Result<(), CommandError> {
    let screen = open(app, presenter, StatusFilter::All).await?;
    let order = select(&screen, order_id).await?;
    output::order_detail(&order, &screen.status_actions().await);
    Ok(())
}

/// Move an order to a new status.
pub async fn set_status(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<(), CommandError> {
    let screen = open(app, presenter, StatusFilter::All).await?;
    select(&screen, order_id).await?;

    match screen.update_selected_status(status).await {
        ActionOutcome::Skipped => {
            tracing::info!(order_id = %order_id, status = %status, "Order already has this status");
            Ok(())
        }
        outcome => {
            completed(outcome)?;
            render(&screen).await;
            Ok(())
        }
    }
}

async fn select(
    screen: &AdminOrdersScreen,
    order_id: OrderId,
) -> Result<Order, CommandError> {
    if !screen.open_order(order_id).await {
        return Err(CommandError::NotFound(format!("Order {order_id}")));
    }
    screen
        .selected()
        .await
        .ok_or_else(|| CommandError::NotFound(format!("Order {order_id}")))
}
