//! Integration tests for order administration.

#![allow(clippy::unwrap_used)]

use reqwest::Method;
use serde_json::json;
use shopie_admin::AdminOrdersScreen;
use shopie_core::{OrderId, OrderStatus, StatusFilter};
use shopie_integration_tests::{Harness, orders};
use shopie_storefront::api::endpoints;
use shopie_storefront::screens::{ActionOutcome, Placeholder};
use shopie_storefront::testing::MockReply;

async fn open(harness: &Harness) -> AdminOrdersScreen {
    AdminOrdersScreen::open(harness.app.clone(), harness.presenter())
        .await
        .unwrap()
}

// ============================================================================
// Access and filtering
// ============================================================================

#[tokio::test]
async fn test_customer_is_denied_before_any_fetch() {
    let harness = Harness::customer().await;

    let screen = AdminOrdersScreen::open(harness.app.clone(), harness.presenter()).await;

    assert!(screen.is_none());
    assert!(harness.transport.requests().is_empty());
    assert_eq!(harness.presenter.back_navigations(), 1);
    assert!(harness.presenter.last_notice().unwrap().is_error());
}

#[tokio::test]
async fn test_every_filter_hits_its_endpoint() {
    let harness = Harness::admin().await;
    harness
        .transport
        .reply(Method::GET, endpoints::ORDERS_ALL, MockReply::json(orders(&OrderStatus::ALL)));
    for status in OrderStatus::ALL {
        harness.transport.reply(
            Method::GET,
            &format!("/orders/admin/status/{}", status.as_str()),
            MockReply::json(orders(&[status])),
        );
    }
    let screen = open(&harness).await;
    assert_eq!(screen.order_count().await, 4);

    for filter in StatusFilter::OPTIONS {
        harness.transport.clear_requests();

        assert_eq!(screen.set_filter(filter).await, ActionOutcome::Completed);

        let paths: Vec<_> = harness
            .transport
            .requests()
            .into_iter()
            .map(|request| request.path)
            .collect();
        let expected = match filter {
            StatusFilter::All => "/orders/admin/all".to_owned(),
            StatusFilter::Only(status) => format!("/orders/admin/status/{status}"),
        };
        assert_eq!(paths, [expected]);
        assert_eq!(screen.filter().await, filter);
    }
}

#[tokio::test]
async fn test_empty_filtered_list_names_filter() {
    let harness = Harness::admin().await;
    harness
        .transport
        .reply(Method::GET, endpoints::ORDERS_ALL, MockReply::json(orders(&[OrderStatus::Paid])));
    harness
        .transport
        .reply(Method::GET, "/orders/admin/status/DELIVERED", MockReply::empty());
    let screen = open(&harness).await;
    assert_eq!(screen.count_label().await, "1 order");

    screen
        .set_filter(StatusFilter::Only(OrderStatus::Delivered))
        .await;

    assert_eq!(screen.placeholder().await, Some(Placeholder::Empty));
    assert_eq!(screen.empty_message().await, "No delivered orders");
    assert_eq!(screen.count_label().await, "0 orders");
}

#[tokio::test]
async fn test_offset_dates_and_missing_totals_still_list() {
    let harness = Harness::admin().await;
    harness.transport.reply(
        Method::GET,
        endpoints::ORDERS_ALL,
        MockReply::json(json!([
            {"id": 1, "date": "2024-03-05T14:07:09", "total": 59.9, "statut": "PAID"},
            {"id": 2, "date": "2024-03-06T08:30:00Z", "total": null, "statut": "PENDING"},
        ])),
    );

    let screen = open(&harness).await;

    assert!(harness.presenter.notices().is_empty());
    let rows = screen.rows().await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].date, "06/03/2024 08:30");
    assert_eq!(rows[1].total, "-");
    assert_eq!(rows[0].total, "59.90 €");
}

// ============================================================================
// Status updates
// ============================================================================

#[tokio::test]
async fn test_current_status_is_noop_for_every_status() {
    let harness = Harness::admin().await;
    harness
        .transport
        .reply(Method::GET, endpoints::ORDERS_ALL, MockReply::json(orders(&OrderStatus::ALL)));
    let screen = open(&harness).await;
    harness.transport.clear_requests();

    for order in screen.orders().await {
        screen.open_order(order.id).await;
        let actions = screen.status_actions().await;
        let disabled: Vec<_> = actions.iter().filter(|a| !a.enabled).collect();
        assert_eq!(disabled.len(), 1);
        assert_eq!(disabled[0].status, order.status);

        assert_eq!(
            screen.update_status(&order, order.status).await,
            ActionOutcome::Skipped
        );
    }

    assert!(harness.transport.requests().is_empty());
    assert!(harness.presenter.notices().is_empty());
}

#[tokio::test]
async fn test_status_update_reloads_without_local_change() {
    let harness = Harness::admin().await;
    harness
        .transport
        .reply(Method::GET, endpoints::ORDERS_ALL, MockReply::json(orders(&[OrderStatus::Pending])));
    harness
        .transport
        .reply(Method::GET, endpoints::ORDERS_ALL, MockReply::json(orders(&[OrderStatus::Shipped])));
    harness
        .transport
        .reply(Method::PUT, "/orders/admin/1/status", MockReply::empty());
    let screen = open(&harness).await;
    screen.open_order(OrderId::new(1)).await;

    assert_eq!(
        screen.update_selected_status(OrderStatus::Shipped).await,
        ActionOutcome::Completed
    );

    let put = &harness
        .transport
        .requests_to(&Method::PUT, "/orders/admin/1/status")[0];
    assert_eq!(put.query_value("statut"), Some("SHIPPED"));
    assert!(put.body.is_none());
    assert!(screen.selected().await.is_none());
    assert_eq!(harness.transport.count(&Method::GET, endpoints::ORDERS_ALL), 2);
    assert_eq!(screen.orders().await[0].status, OrderStatus::Shipped);
    assert_eq!(harness.presenter.successes().len(), 1);
}

#[tokio::test]
async fn test_backwards_transition_is_allowed() {
    let harness = Harness::admin().await;
    harness
        .transport
        .reply(Method::GET, endpoints::ORDERS_ALL, MockReply::json(orders(&[OrderStatus::Delivered])));
    harness
        .transport
        .reply(Method::PUT, "/orders/admin/1/status", MockReply::empty());
    let screen = open(&harness).await;
    screen.open_order(OrderId::new(1)).await;

    assert_eq!(
        screen.update_selected_status(OrderStatus::Pending).await,
        ActionOutcome::Completed
    );
}
