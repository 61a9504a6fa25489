//! Order management screen.

use std::sync::Arc;

use shopie_core::{Order, OrderId, OrderStatus, StatusFilter};
use shopie_storefront::AppState;
use shopie_storefront::api::{ApiRequest, endpoints};
use shopie_storefront::presenter::{Notice, Presenter};
use shopie_storefront::scope::ScreenScope;
use shopie_storefront::screens::{ActionOutcome, Fetched, ListState, Placeholder, fetch_list};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::guard::RequireAdmin;

/// A status the selected order can be moved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusAction {
    pub status: OrderStatus,
    /// `false` for the order's current status.
    pub enabled: bool,
}

/// One listed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub id: OrderId,
    pub date: String,
    pub total: String,
    pub status: OrderStatus,
    pub status_label: &'static str,
}

impl From<&Order> for OrderRow {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            date: order.display_date(),
            total: order.display_total(),
            status: order.status,
            status_label: order.status.label(),
        }
    }
}

/// Administrator order list with a status filter and status updates.
pub struct AdminOrdersScreen {
    guard: RequireAdmin,
    app: AppState,
    presenter: Arc<dyn Presenter>,
    scope: ScreenScope,
    list: RwLock<ListState<Order>>,
    filter: RwLock<StatusFilter>,
    selected: RwLock<Option<Order>>,
}

impl AdminOrdersScreen {
    /// Create the screen for a checked administrator, showing every order.
    pub async fn new(guard: RequireAdmin, app: AppState, presenter: Arc<dyn Presenter>) -> Self {
        let scope = app.session().screen_scope().await;
        Self {
            guard,
            app,
            presenter,
            scope,
            list: RwLock::new(ListState::default()),
            filter: RwLock::new(StatusFilter::All),
            selected: RwLock::new(None),
        }
    }

    /// Check the role, then create and load the screen.
    ///
    /// A non-administrator gets an access-denied notice and is sent back;
    /// nothing is fetched.
    pub async fn open(app: AppState, presenter: Arc<dyn Presenter>) -> Option<Self> {
        let guard = RequireAdmin::check_or_leave(app.session(), &*presenter).await?;
        let screen = Self::new(guard, app, presenter).await;
        screen.load_orders().await;
        Some(screen)
    }

    #[must_use]
    pub const fn admin(&self) -> &RequireAdmin {
        &self.guard
    }

    pub async fn filter(&self) -> StatusFilter {
        *self.filter.read().await
    }

    /// Switch the filter and reload. Selecting the active filter reloads too.
    pub async fn set_filter(&self, filter: StatusFilter) -> ActionOutcome {
        *self.filter.write().await = filter;
        self.load_orders().await
    }

    /// Fetch the orders matching the current filter.
    #[instrument(skip(self))]
    pub async fn load_orders(&self) -> ActionOutcome {
        let filter = self.filter().await;
        let fetched = fetch_list(
            &self.scope,
            self.app.session(),
            &self.list,
            ApiRequest::get(endpoints::orders_for(filter)),
        )
        .await;

        if let Fetched::Failed(e) = &fetched {
            tracing::error!(error = %e, filter = %filter, "Failed to load orders");
            self.presenter.notify(Notice::error("Unable to load orders"));
        }
        fetched.outcome()
    }

    /// Pull-to-refresh.
    pub async fn refresh(&self) -> ActionOutcome {
        self.list.write().await.set_refreshing(true);
        let outcome = self.load_orders().await;
        self.list.write().await.set_refreshing(false);
        outcome
    }

    pub async fn orders(&self) -> Vec<Order> {
        self.list.read().await.items().to_vec()
    }

    pub async fn rows(&self) -> Vec<OrderRow> {
        self.list.read().await.items().iter().map(OrderRow::from).collect()
    }

    pub async fn order_count(&self) -> usize {
        self.list.read().await.len()
    }

    /// Header count, e.g. `1 order`, `3 orders`.
    pub async fn count_label(&self) -> String {
        count_label(self.order_count().await)
    }

    pub async fn placeholder(&self) -> Option<Placeholder> {
        self.list.read().await.placeholder()
    }

    /// Text shown when the list is empty, naming the active filter.
    pub async fn empty_message(&self) -> String {
        empty_message(self.filter().await)
    }

    pub async fn is_loading(&self) -> bool {
        self.list.read().await.is_loading()
    }

    pub async fn is_refreshing(&self) -> bool {
        self.list.read().await.is_refreshing()
    }

    /// Open the detail view of a listed order.
    ///
    /// Returns `false` if the order is not in the list.
    pub async fn open_order(&self, order_id: OrderId) -> bool {
        let order = self
            .list
            .read()
            .await
            .items()
            .iter()
            .find(|order| order.id == order_id)
            .cloned();
        let found = order.is_some();
        *self.selected.write().await = order;
        found
    }

    pub async fn selected(&self) -> Option<Order> {
        self.selected.read().await.clone()
    }

    pub async fn close_detail(&self) {
        *self.selected.write().await = None;
    }

    /// One action per status for the open order; empty when none is open.
    pub async fn status_actions(&self) -> Vec<StatusAction> {
        self.selected
            .read()
            .await
            .as_ref()
            .map(|order| status_actions(order.status))
            .unwrap_or_default()
    }

    /// Move an order to a new status.
    ///
    /// Choosing the order's current status does nothing. On success the
    /// detail view closes and the list reloads; the local order is never
    /// changed in place.
    #[instrument(skip(self), fields(order_id = %order.id, from = %order.status, to = %status))]
    pub async fn update_status(&self, order: &Order, status: OrderStatus) -> ActionOutcome {
        if order.status == status {
            return ActionOutcome::Skipped;
        }

        let request = ApiRequest::put(endpoints::order_status(order.id))
            .query(endpoints::ORDER_STATUS_PARAM, status.as_str());
        match self.scope.run(self.app.session().authenticated_send(request)).await {
            None => ActionOutcome::Discarded,
            Some(Ok(())) => {
                tracing::info!("Order status updated");
                self.presenter.notify(Notice::success("Order status updated"));
                self.close_detail().await;
                self.load_orders().await;
                ActionOutcome::Completed
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Failed to update order status");
                self.presenter.notify(Notice::error("Unable to update the status"));
                ActionOutcome::Failed
            }
        }
    }

    /// Apply a status to the order open in the detail view.
    pub async fn update_selected_status(&self, status: OrderStatus) -> ActionOutcome {
        match self.selected().await {
            Some(order) => self.update_status(&order, status).await,
            None => ActionOutcome::Skipped,
        }
    }

    /// Header cart badge; `None` for an empty cart.
    pub async fn cart_badge(&self) -> Option<u32> {
        let count = self.app.cart().item_count().await;
        (count > 0).then_some(count)
    }

    /// Close the screen; responses still in flight are dropped.
    pub fn teardown(&self) {
        self.scope.teardown();
    }
}

/// Every status, with the current one disabled.
#[must_use]
pub fn status_actions(current: OrderStatus) -> Vec<StatusAction> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusAction {
            status,
            enabled: status != current,
        })
        .collect()
}

#[must_use]
pub fn count_label(count: usize) -> String {
    if count == 1 {
        "1 order".to_owned()
    } else {
        format!("{count} orders")
    }
}

#[must_use]
pub fn empty_message(filter: StatusFilter) -> String {
    match filter {
        StatusFilter::All => "No orders".to_owned(),
        StatusFilter::Only(status) => format!("No {} orders", status.label().to_lowercase()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::{Method, StatusCode};
    use serde_json::json;
    use shopie_core::Role;
    use shopie_storefront::testing::{
        MockReply, MockTransport, RecordingPresenter, order_json, signed_in_state,
    };

    use super::*;

    async fn screen(transport: &Arc<MockTransport>) -> (AdminOrdersScreen, Arc<RecordingPresenter>) {
        let app = signed_in_state(transport, Role::Admin).await;
        let presenter = RecordingPresenter::new();
        let screen = AdminOrdersScreen::open(app, presenter.clone()).await.unwrap();
        (screen, presenter)
    }

    #[test]
    fn test_current_status_action_disabled() {
        for current in OrderStatus::ALL {
            let actions = status_actions(current);
            assert_eq!(actions.len(), 4);
            assert!(actions.iter().all(|a| a.enabled == (a.status != current)));
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(count_label(0), "0 orders");
        assert_eq!(count_label(1), "1 order");
        assert_eq!(count_label(4), "4 orders");
        assert_eq!(empty_message(StatusFilter::All), "No orders");
        assert_eq!(
            empty_message(StatusFilter::Only(OrderStatus::Shipped)),
            "No shipped orders"
        );
    }

    #[tokio::test]
    async fn test_filter_selects_endpoint() {
        let transport = MockTransport::new();
        transport.reply(
            Method::GET,
            endpoints::ORDERS_ALL,
            MockReply::json(json!([order_json(1, OrderStatus::Paid), order_json(2, OrderStatus::Pending)])),
        );
        transport.reply(
            Method::GET,
            "/orders/admin/status/PENDING",
            MockReply::json(json!([order_json(2, OrderStatus::Pending)])),
        );
        let (screen, _) = screen(&transport).await;
        assert_eq!(screen.order_count().await, 2);

        screen.set_filter(StatusFilter::Only(OrderStatus::Pending)).await;

        assert_eq!(transport.count(&Method::GET, "/orders/admin/status/PENDING"), 1);
        assert_eq!(screen.order_count().await, 1);

        screen.set_filter(StatusFilter::All).await;
        assert_eq!(transport.count(&Method::GET, endpoints::ORDERS_ALL), 2);
    }

    #[tokio::test]
    async fn test_rows_render_date_and_total() {
        let transport = MockTransport::new();
        transport.reply(
            Method::GET,
            endpoints::ORDERS_ALL,
            MockReply::json(json!([order_json(1, OrderStatus::Paid)])),
        );
        let (screen, _) = screen(&transport).await;

        let row = &screen.rows().await[0];

        assert_eq!(row.date, "05/03/2024 14:07");
        assert_eq!(row.total, "59.90 €");
        assert_eq!(row.status_label, "Paid");
    }

    #[tokio::test]
    async fn test_update_to_current_status_is_noop() {
        let transport = MockTransport::new();
        transport.reply(
            Method::GET,
            endpoints::ORDERS_ALL,
            MockReply::json(json!([order_json(1, OrderStatus::Shipped)])),
        );
        let (screen, presenter) = screen(&transport).await;
        transport.clear_requests();
        assert!(screen.open_order(OrderId::new(1)).await);

        assert_eq!(
            screen.update_selected_status(OrderStatus::Shipped).await,
            ActionOutcome::Skipped
        );

        assert!(transport.requests().is_empty());
        assert!(presenter.notices().is_empty());
        assert!(screen.selected().await.is_some());
    }

    #[tokio::test]
    async fn test_update_closes_detail_and_reloads_filtered_list() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::ORDERS_ALL, MockReply::json(json!([])));
        transport.reply(
            Method::GET,
            "/orders/admin/status/PAID",
            MockReply::json(json!([order_json(7, OrderStatus::Paid)])),
        );
        transport.reply(Method::PUT, "/orders/admin/7/status", MockReply::empty());
        let (screen, _) = screen(&transport).await;
        screen.set_filter(StatusFilter::Only(OrderStatus::Paid)).await;
        screen.open_order(OrderId::new(7)).await;

        assert_eq!(
            screen.update_selected_status(OrderStatus::Delivered).await,
            ActionOutcome::Completed
        );

        let put = &transport.requests_to(&Method::PUT, "/orders/admin/7/status")[0];
        assert_eq!(put.query_value("statut"), Some("DELIVERED"));
        assert!(screen.selected().await.is_none());
        assert_eq!(transport.count(&Method::GET, "/orders/admin/status/PAID"), 2);
        // The reload is the only source of truth: no local status change.
        assert_eq!(screen.orders().await[0].status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_update_failure_keeps_detail_open() {
        let transport = MockTransport::new();
        transport.reply(
            Method::GET,
            endpoints::ORDERS_ALL,
            MockReply::json(json!([order_json(1, OrderStatus::Pending)])),
        );
        transport.reply(
            Method::PUT,
            "/orders/admin/1/status",
            MockReply::status(StatusCode::INTERNAL_SERVER_ERROR, "oops"),
        );
        let (screen, presenter) = screen(&transport).await;
        screen.open_order(OrderId::new(1)).await;

        assert_eq!(
            screen.update_selected_status(OrderStatus::Paid).await,
            ActionOutcome::Failed
        );

        assert_eq!(presenter.errors().len(), 1);
        assert!(screen.selected().await.is_some());
        assert_eq!(transport.count(&Method::GET, endpoints::ORDERS_ALL), 1);
    }
}
