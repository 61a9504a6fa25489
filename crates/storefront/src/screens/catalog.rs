//! Catalog screen: product browsing, search and cart actions.

use std::sync::Arc;

use shopie_core::{Product, ProductId, StockLevel};
use tokio::sync::RwLock;
use tracing::instrument;

use super::{ActionOutcome, Fetched, ListState, Placeholder, fetch_list};
use crate::api::{ApiRequest, endpoints};
use crate::cart::CartError;
use crate::presenter::{Notice, Presenter};
use crate::scope::ScreenScope;
use crate::state::AppState;

/// Shortest search text that is sent to the backend.
const MIN_SEARCH_CHARS: usize = 3;

/// One product as the catalog shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCard {
    pub product: Product,
    pub in_cart: bool,
    pub quantity_in_cart: u32,
    /// Cart controls and the in-cart badge; hidden for administrators.
    pub show_cart_actions: bool,
    /// Whether the add button is enabled.
    pub can_add: bool,
    pub stock: StockLevel,
}

/// Everything the catalog displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSnapshot {
    pub cards: Vec<ProductCard>,
    pub product_count: usize,
    pub search_text: String,
    pub loading: bool,
    pub refreshing: bool,
    pub placeholder: Option<Placeholder>,
    /// Header cart badge; `None` when hidden.
    pub cart_badge: Option<u32>,
}

/// Product list with search and per-product cart controls.
pub struct CatalogScreen {
    app: AppState,
    presenter: Arc<dyn Presenter>,
    scope: ScreenScope,
    list: RwLock<ListState<Product>>,
    search_text: RwLock<String>,
}

impl CatalogScreen {
    /// Create the screen under the current session. Call [`Self::mount`] to
    /// load it.
    pub async fn new(app: AppState, presenter: Arc<dyn Presenter>) -> Self {
        let scope = app.session().screen_scope().await;
        Self {
            app,
            presenter,
            scope,
            list: RwLock::new(ListState::default()),
            search_text: RwLock::new(String::new()),
        }
    }

    /// Initial load of the whole collection.
    pub async fn mount(&self) -> ActionOutcome {
        self.load_products().await
    }

    /// Fetch the whole collection.
    #[instrument(skip(self))]
    pub async fn load_products(&self) -> ActionOutcome {
        let fetched = self.fetch(ApiRequest::get(endpoints::PRODUCTS)).await;
        self.report_fetch(fetched, "Unable to load products")
    }

    /// Fetch the products whose name matches `query`.
    ///
    /// A query that is only whitespace loads the whole collection instead.
    #[instrument(skip(self))]
    pub async fn search_products(&self, query: &str) -> ActionOutcome {
        let query = query.trim();
        if query.is_empty() {
            return self.load_products().await;
        }

        let request = ApiRequest::get(endpoints::PRODUCT_SEARCH)
            .query(endpoints::PRODUCT_SEARCH_PARAM, query);
        let fetched = self.fetch(request).await;
        self.report_fetch(fetched, "Search failed")
    }

    /// Record new search text and fetch accordingly.
    ///
    /// More than two characters searches, an empty text reloads everything,
    /// and one or two characters leave the list as it is.
    pub async fn on_search_text_changed(&self, text: &str) -> ActionOutcome {
        text.clone_into(&mut *self.search_text.write().await);

        match text.chars().count() {
            0 => self.load_products().await,
            n if n >= MIN_SEARCH_CHARS => self.search_products(text).await,
            _ => ActionOutcome::Skipped,
        }
    }

    pub async fn search_text(&self) -> String {
        self.search_text.read().await.clone()
    }

    /// Pull-to-refresh: repeat the active search, or reload the whole
    /// collection when no search is active.
    pub async fn refresh(&self) -> ActionOutcome {
        self.list.write().await.set_refreshing(true);
        let text = self.search_text().await;
        let outcome = if text.chars().count() >= MIN_SEARCH_CHARS {
            self.search_products(&text).await
        } else {
            self.load_products().await
        };
        self.list.write().await.set_refreshing(false);
        outcome
    }

    /// Add one unit of a listed product.
    ///
    /// Skipped for administrators, for out-of-stock products and for
    /// products not in the list.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&self, product_id: ProductId) -> ActionOutcome {
        if self.app.session().is_admin().await {
            return ActionOutcome::Skipped;
        }
        let Some(product) = self.product(product_id).await else {
            return ActionOutcome::Skipped;
        };
        if !product.in_stock() {
            return ActionOutcome::Skipped;
        }

        let result = self.scope.run(self.app.cart().add_to_cart(product_id, 1)).await;
        self.report_cart(result, "Product added to cart", "Unable to add to cart")
    }

    /// Remove a product's line from the cart.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_cart(&self, product_id: ProductId) -> ActionOutcome {
        if self.app.session().is_admin().await {
            return ActionOutcome::Skipped;
        }

        let result = self
            .scope
            .run(self.app.cart().remove_product_from_cart(product_id))
            .await;
        self.report_cart(result, "Product removed from cart", "Unable to remove from cart")
    }

    /// Set the cart quantity of a product already in the cart.
    ///
    /// Zero or less removes the line. Only failures are reported.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(&self, product_id: ProductId, quantity: i64) -> ActionOutcome {
        if quantity <= 0 {
            return self.remove_from_cart(product_id).await;
        }
        if self.app.session().is_admin().await {
            return ActionOutcome::Skipped;
        }
        let Some(item) = self.app.cart().item_for(product_id).await else {
            return ActionOutcome::Skipped;
        };
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let result = self
            .scope
            .run(self.app.cart().update_cart_item(item.id, quantity))
            .await;
        match result {
            None => ActionOutcome::Discarded,
            Some(Ok(())) => ActionOutcome::Completed,
            Some(Err(e)) => self.cart_failure(&e, "Unable to update quantity"),
        }
    }

    /// One more unit of a product in the cart.
    pub async fn increment(&self, product_id: ProductId) -> ActionOutcome {
        let current = self.app.cart().quantity_in_cart(product_id).await;
        self.update_quantity(product_id, i64::from(current) + 1).await
    }

    /// One less unit; the last unit removes the line.
    pub async fn decrement(&self, product_id: ProductId) -> ActionOutcome {
        let current = self.app.cart().quantity_in_cart(product_id).await;
        self.update_quantity(product_id, i64::from(current) - 1).await
    }

    /// Cards for the listed products, in backend order.
    pub async fn cards(&self) -> Vec<ProductCard> {
        let show_cart_actions = !self.app.session().is_admin().await;
        let cart = self.app.cart().snapshot().await;

        self.list
            .read()
            .await
            .items()
            .iter()
            .map(|product| {
                let quantity_in_cart = cart.quantity_of(product.id);
                ProductCard {
                    in_cart: quantity_in_cart > 0,
                    quantity_in_cart,
                    show_cart_actions,
                    can_add: show_cart_actions && product.in_stock(),
                    stock: product.stock_level(),
                    product: product.clone(),
                }
            })
            .collect()
    }

    pub async fn product_count(&self) -> usize {
        self.list.read().await.len()
    }

    pub async fn placeholder(&self) -> Option<Placeholder> {
        self.list.read().await.placeholder()
    }

    pub async fn is_loading(&self) -> bool {
        self.list.read().await.is_loading()
    }

    pub async fn is_refreshing(&self) -> bool {
        self.list.read().await.is_refreshing()
    }

    /// Header badge: total units in the cart, hidden for administrators and
    /// for an empty cart.
    pub async fn cart_badge(&self) -> Option<u32> {
        if self.app.session().is_admin().await {
            return None;
        }
        let count = self.app.cart().item_count().await;
        (count > 0).then_some(count)
    }

    pub async fn snapshot(&self) -> CatalogSnapshot {
        let cards = self.cards().await;
        let (loading, refreshing, placeholder) = {
            let list = self.list.read().await;
            (list.is_loading(), list.is_refreshing(), list.placeholder())
        };

        CatalogSnapshot {
            product_count: cards.len(),
            cards,
            search_text: self.search_text().await,
            loading,
            refreshing,
            placeholder,
            cart_badge: self.cart_badge().await,
        }
    }

    /// Close the screen; responses still in flight are dropped.
    pub fn teardown(&self) {
        self.scope.teardown();
    }

    async fn product(&self, product_id: ProductId) -> Option<Product> {
        self.list
            .read()
            .await
            .items()
            .iter()
            .find(|product| product.id == product_id)
            .cloned()
    }

    async fn fetch(&self, request: ApiRequest) -> Fetched {
        fetch_list(&self.scope, self.app.session(), &self.list, request).await
    }

    fn report_fetch(&self, fetched: Fetched, message: &str) -> ActionOutcome {
        match &fetched {
            Fetched::Applied(count) => tracing::debug!(count, "Products loaded"),
            Fetched::Failed(e) => {
                tracing::error!(error = %e, "Failed to load products");
                self.presenter.notify(Notice::error(message));
            }
            Fetched::Stale | Fetched::Discarded => {
                tracing::debug!("Dropped product response");
            }
        }
        fetched.outcome()
    }

    fn report_cart(
        &self,
        result: Option<Result<(), CartError>>,
        success: &str,
        failure: &str,
    ) -> ActionOutcome {
        match result {
            None => ActionOutcome::Discarded,
            Some(Ok(())) => {
                self.presenter.notify(Notice::success(success));
                ActionOutcome::Completed
            }
            Some(Err(e)) => self.cart_failure(&e, failure),
        }
    }

    /// Backend failures carry their detail; a product missing from the cart
    /// gets the generic text.
    fn cart_failure(&self, error: &CartError, fallback: &str) -> ActionOutcome {
        tracing::error!(error = %error, "Cart action failed");
        let message = match error {
            CartError::Api(e) => e.to_string(),
            CartError::NotInCart(_) => fallback.to_owned(),
        };
        self.presenter.notify(Notice::error(message));
        ActionOutcome::Failed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::{Method, StatusCode};
    use serde_json::json;
    use shopie_core::Role;

    use super::*;
    use crate::testing::{
        MockReply, MockTransport, RecordingPresenter, cart_json, product_json, signed_in_state,
    };

    async fn screen(
        transport: &Arc<MockTransport>,
        role: Role,
    ) -> (CatalogScreen, Arc<RecordingPresenter>) {
        let state = signed_in_state(transport, role).await;
        let presenter = RecordingPresenter::new();
        (CatalogScreen::new(state, presenter.clone()).await, presenter)
    }

    fn three_products() -> serde_json::Value {
        json!([
            product_json(1, "Mug", 9.5, 3),
            product_json(2, "Teapot", 25.0, 0),
            product_json(3, "Tea", 4.2, 40),
        ])
    }

    #[tokio::test]
    async fn test_mount_lists_every_product() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::PRODUCTS, MockReply::json(three_products()));
        let (screen, presenter) = screen(&transport, Role::Customer).await;

        assert_eq!(screen.mount().await, ActionOutcome::Completed);

        assert_eq!(screen.product_count().await, 3);
        assert_eq!(screen.cards().await.len(), 3);
        assert_eq!(screen.placeholder().await, None);
        assert!(presenter.notices().is_empty());
    }

    #[tokio::test]
    async fn test_search_threshold() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::PRODUCTS, MockReply::json(three_products()));
        transport.reply(
            Method::GET,
            endpoints::PRODUCT_SEARCH,
            MockReply::json(json!([product_json(3, "Tea", 4.2, 40)])),
        );
        let (screen, _) = screen(&transport, Role::Customer).await;

        assert_eq!(screen.on_search_text_changed("t").await, ActionOutcome::Skipped);
        assert_eq!(screen.on_search_text_changed("te").await, ActionOutcome::Skipped);
        assert!(transport.requests().is_empty());

        assert_eq!(screen.on_search_text_changed("tea").await, ActionOutcome::Completed);
        let search = &transport.requests_to(&Method::GET, endpoints::PRODUCT_SEARCH)[0];
        assert_eq!(search.query_value("nom"), Some("tea"));
        assert_eq!(screen.product_count().await, 1);

        assert_eq!(screen.on_search_text_changed("").await, ActionOutcome::Completed);
        assert_eq!(transport.count(&Method::GET, endpoints::PRODUCTS), 1);
        assert_eq!(screen.product_count().await, 3);
    }

    #[tokio::test]
    async fn test_whitespace_search_loads_everything() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::PRODUCTS, MockReply::json(three_products()));
        let (screen, _) = screen(&transport, Role::Customer).await;

        screen.on_search_text_changed("   ").await;

        assert_eq!(transport.count(&Method::GET, endpoints::PRODUCTS), 1);
        assert_eq!(transport.count(&Method::GET, endpoints::PRODUCT_SEARCH), 0);
    }

    #[tokio::test]
    async fn test_search_failure_notifies_and_keeps_list() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::PRODUCTS, MockReply::json(three_products()));
        transport.reply(
            Method::GET,
            endpoints::PRODUCT_SEARCH,
            MockReply::status(StatusCode::BAD_GATEWAY, "upstream"),
        );
        let (screen, presenter) = screen(&transport, Role::Customer).await;
        screen.mount().await;

        assert_eq!(screen.search_products("mug").await, ActionOutcome::Failed);

        assert_eq!(screen.product_count().await, 3);
        assert_eq!(presenter.errors().len(), 1);
        assert!(!screen.is_loading().await);
    }

    #[tokio::test]
    async fn test_refresh_clears_flag() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::PRODUCTS, MockReply::json(three_products()));
        let (screen, _) = screen(&transport, Role::Customer).await;

        assert_eq!(screen.refresh().await, ActionOutcome::Completed);

        assert!(!screen.is_refreshing().await);
        assert_eq!(screen.product_count().await, 3);
    }

    #[tokio::test]
    async fn test_refresh_repeats_active_search() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::PRODUCTS, MockReply::json(three_products()));
        transport.reply(
            Method::GET,
            endpoints::PRODUCT_SEARCH,
            MockReply::json(json!([product_json(3, "Tea", 4.2, 40)])),
        );
        let (screen, _) = screen(&transport, Role::Customer).await;
        screen.on_search_text_changed("tea").await;
        transport.clear_requests();

        assert_eq!(screen.refresh().await, ActionOutcome::Completed);

        let searches = transport.requests_to(&Method::GET, endpoints::PRODUCT_SEARCH);
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].query_value("nom"), Some("tea"));
        assert_eq!(transport.count(&Method::GET, endpoints::PRODUCTS), 0);
        assert_eq!(screen.search_text().await, "tea");
        assert_eq!(screen.product_count().await, 1);
    }

    #[tokio::test]
    async fn test_refresh_with_short_text_loads_everything() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::PRODUCTS, MockReply::json(three_products()));
        let (screen, _) = screen(&transport, Role::Customer).await;
        screen.on_search_text_changed("te").await;

        screen.refresh().await;

        assert_eq!(transport.count(&Method::GET, endpoints::PRODUCTS), 1);
        assert_eq!(transport.count(&Method::GET, endpoints::PRODUCT_SEARCH), 0);
    }

    #[tokio::test]
    async fn test_out_of_stock_cannot_be_added() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::PRODUCTS, MockReply::json(three_products()));
        let (screen, _) = screen(&transport, Role::Customer).await;
        screen.mount().await;
        transport.clear_requests();

        let teapot = screen
            .cards()
            .await
            .into_iter()
            .find(|card| card.product.id == ProductId::new(2))
            .unwrap();
        assert!(!teapot.can_add);
        assert_eq!(teapot.stock, StockLevel::OutOfStock);

        assert_eq!(screen.add_to_cart(ProductId::new(2)).await, ActionOutcome::Skipped);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_add_to_cart_reports_success() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::PRODUCTS, MockReply::json(three_products()));
        transport.reply(Method::POST, endpoints::CART_ITEMS, MockReply::empty());
        transport.reply(Method::GET, endpoints::CART, MockReply::json(cart_json(&[(50, 1, 1)])));
        let (screen, presenter) = screen(&transport, Role::Customer).await;
        screen.mount().await;

        assert_eq!(screen.add_to_cart(ProductId::new(1)).await, ActionOutcome::Completed);

        assert_eq!(presenter.successes().len(), 1);
        let mug = &screen.cards().await[0];
        assert!(mug.in_cart);
        assert_eq!(mug.quantity_in_cart, 1);
        assert_eq!(screen.cart_badge().await, Some(1));
    }

    #[tokio::test]
    async fn test_add_failure_shows_backend_detail() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::PRODUCTS, MockReply::json(three_products()));
        transport.reply(
            Method::POST,
            endpoints::CART_ITEMS,
            MockReply::status(StatusCode::CONFLICT, "Stock insuffisant"),
        );
        let (screen, presenter) = screen(&transport, Role::Customer).await;
        screen.mount().await;

        assert_eq!(screen.add_to_cart(ProductId::new(1)).await, ActionOutcome::Failed);

        let notice = presenter.last_notice().unwrap();
        assert!(notice.is_error());
        assert!(notice.message.contains("Stock insuffisant"));
    }

    #[tokio::test]
    async fn test_decrement_last_unit_removes_line() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::CART, MockReply::json(cart_json(&[(50, 1, 1)])));
        transport.reply(Method::DELETE, "/cart/items/50", MockReply::empty());
        let (screen, _) = screen(&transport, Role::Customer).await;
        screen.app.cart().refresh().await.unwrap();
        transport.clear_requests();

        assert_eq!(screen.decrement(ProductId::new(1)).await, ActionOutcome::Completed);

        assert_eq!(transport.count(&Method::DELETE, "/cart/items/50"), 1);
        assert_eq!(transport.count(&Method::PUT, "/cart/items/50"), 0);
    }

    #[tokio::test]
    async fn test_increment_updates_quantity_silently() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::CART, MockReply::json(cart_json(&[(50, 1, 2)])));
        transport.reply(Method::PUT, "/cart/items/50", MockReply::empty());
        let (screen, presenter) = screen(&transport, Role::Customer).await;
        screen.app.cart().refresh().await.unwrap();

        assert_eq!(screen.increment(ProductId::new(1)).await, ActionOutcome::Completed);

        let put = &transport.requests_to(&Method::PUT, "/cart/items/50")[0];
        assert_eq!(put.query_value("quantite"), Some("3"));
        assert!(presenter.notices().is_empty());
    }

    #[tokio::test]
    async fn test_admin_sees_no_cart_controls() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::PRODUCTS, MockReply::json(three_products()));
        let (screen, _) = screen(&transport, Role::Admin).await;
        screen.mount().await;

        assert!(screen.cards().await.iter().all(|card| !card.show_cart_actions && !card.can_add));
        assert_eq!(screen.cart_badge().await, None);
        assert_eq!(screen.add_to_cart(ProductId::new(1)).await, ActionOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_response_after_teardown_is_discarded() {
        let transport = MockTransport::new();
        transport.reply(Method::GET, endpoints::PRODUCTS, MockReply::pending());
        let (screen, presenter) = screen(&transport, Role::Customer).await;

        let (outcome, ()) = tokio::join!(screen.mount(), async {
            tokio::task::yield_now().await;
            screen.teardown();
        });

        assert_eq!(outcome, ActionOutcome::Discarded);
        assert!(presenter.notices().is_empty());
        assert!(!screen.is_loading().await);
    }

    #[tokio::test]
    async fn test_superseded_search_failure_is_silent() {
        let transport = MockTransport::new();
        let gate = Arc::new(tokio::sync::Notify::new());
        transport.reply(
            Method::GET,
            endpoints::PRODUCT_SEARCH,
            MockReply::status(StatusCode::INTERNAL_SERVER_ERROR, "boom").after(Arc::clone(&gate)),
        );
        transport.reply(
            Method::GET,
            endpoints::PRODUCT_SEARCH,
            MockReply::json(json!([product_json(2, "Teapot", 25.0, 0)])),
        );
        let (screen, presenter) = screen(&transport, Role::Customer).await;

        let (first, second) = tokio::join!(screen.on_search_text_changed("tea"), async {
            let outcome = screen.on_search_text_changed("teap").await;
            gate.notify_one();
            outcome
        });

        assert_eq!(second, ActionOutcome::Completed);
        assert_eq!(first, ActionOutcome::Discarded);
        assert!(presenter.errors().is_empty());
        assert_eq!(screen.product_count().await, 1);
    }
}
