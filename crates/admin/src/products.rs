//! Product management screen.
//!
//! Lists every product and edits them through one shared form: the form
//! creates a product when none is selected and updates the selected one
//! otherwise. Each successful save or delete reloads the whole list.

use std::sync::Arc;

use shopie_core::{Price, PriceError, Product, ProductId, ProductInput};
use shopie_storefront::AppState;
use shopie_storefront::api::{ApiError, ApiRequest, endpoints};
use shopie_storefront::presenter::{ConfirmPrompt, Notice, Presenter};
use shopie_storefront::scope::ScreenScope;
use shopie_storefront::screens::{ActionOutcome, Fetched, ListState, Placeholder, fetch_list};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::guard::RequireAdmin;

/// Shown in the list for a product without a description.
pub const NO_DESCRIPTION: &str = "No description";

/// Product form validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Please fill in every required field")]
    MissingRequired,
    #[error("Invalid price: {0}")]
    InvalidPrice(#[from] PriceError),
    #[error("Stock must be a whole number, zero or more: {0}")]
    InvalidStock(String),
}

/// Text fields of the product form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: String,
    pub stock: String,
}

impl ProductForm {
    /// Pre-fill the form from an existing product.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product
                .price
                .as_ref()
                .map(Price::to_plain_string)
                .unwrap_or_default(),
            image_url: product.image_url.clone().unwrap_or_default(),
            stock: product.stock.to_string(),
        }
    }

    /// Check the form and build the request body.
    ///
    /// Text fields are trimmed; an empty image reference is sent as `null`.
    ///
    /// # Errors
    ///
    /// Returns `FormError::MissingRequired` if name, price or stock is blank,
    /// otherwise the price or stock parse error.
    pub fn validate(&self) -> Result<ProductInput, FormError> {
        let name = self.name.trim();
        let price = self.price.trim();
        let stock = self.stock.trim();
        if name.is_empty() || price.is_empty() || stock.is_empty() {
            return Err(FormError::MissingRequired);
        }

        let image_url = self.image_url.trim();
        Ok(ProductInput {
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
            price: Price::parse(price)?,
            image_url: (!image_url.is_empty()).then(|| image_url.to_owned()),
            stock: stock
                .parse()
                .map_err(|_| FormError::InvalidStock(stock.to_owned()))?,
        })
    }
}

/// Open form: its fields and the product being edited, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub editing: Option<ProductId>,
    pub fields: ProductForm,
}

impl FormState {
    #[must_use]
    pub const fn is_edit(&self) -> bool {
        self.editing.is_some()
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        if self.is_edit() {
            "Edit product"
        } else {
            "New product"
        }
    }
}

/// One listed product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    /// The description, or [`NO_DESCRIPTION`].
    pub description: String,
    pub price: String,
    pub stock: u32,
}

impl From<&Product> for ProductRow {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product
                .description
                .as_deref()
                .filter(|text| !text.trim().is_empty())
                .unwrap_or(NO_DESCRIPTION)
                .to_owned(),
            price: product.display_price(),
            stock: product.stock,
        }
    }
}

/// Administrator product list with create, edit and delete.
pub struct AdminProductsScreen {
    guard: RequireAdmin,
    app: AppState,
    presenter: Arc<dyn Presenter>,
    scope: ScreenScope,
    list: RwLock<ListState<Product>>,
    form: RwLock<Option<FormState>>,
}

impl AdminProductsScreen {
    /// Create the screen for a checked administrator.
    pub async fn new(guard: RequireAdmin, app: AppState, presenter: Arc<dyn Presenter>) -> Self {
        let scope = app.session().screen_scope().await;
        Self {
            guard,
            app,
            presenter,
            scope,
            list: RwLock::new(ListState::default()),
            form: RwLock::new(None),
        }
    }

    /// Check the role, then create and load the screen.
    ///
    /// A non-administrator gets an access-denied notice and is sent back;
    /// nothing is fetched.
    pub async fn open(app: AppState, presenter: Arc<dyn Presenter>) -> Option<Self> {
        let guard = RequireAdmin::check_or_leave(app.session(), &*presenter).await?;
        let screen = Self::new(guard, app, presenter).await;
        screen.load_products().await;
        Some(screen)
    }

    #[must_use]
    pub const fn admin(&self) -> &RequireAdmin {
        &self.guard
    }

    /// Fetch the whole collection.
    #[instrument(skip(self))]
    pub async fn load_products(&self) -> ActionOutcome {
        let fetched = fetch_list(
            &self.scope,
            self.app.session(),
            &self.list,
            ApiRequest::get(endpoints::PRODUCTS),
        )
        .await;

        if let Fetched::Failed(e) = &fetched {
            tracing::error!(error = %e, "Failed to load products");
            self.presenter.notify(Notice::error("Unable to load products"));
        }
        fetched.outcome()
    }

    /// Pull-to-refresh.
    pub async fn refresh(&self) -> ActionOutcome {
        self.list.write().await.set_refreshing(true);
        let outcome = self.load_products().await;
        self.list.write().await.set_refreshing(false);
        outcome
    }

    pub async fn products(&self) -> Vec<Product> {
        self.list.read().await.items().to_vec()
    }

    pub async fn rows(&self) -> Vec<ProductRow> {
        self.list.read().await.items().iter().map(ProductRow::from).collect()
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

    /// Open an empty form for a new product.
    pub async fn open_create(&self) {
        *self.form.write().await = Some(FormState {
            editing: None,
            fields: ProductForm::default(),
        });
    }

    /// Open the form pre-filled from a listed product.
    ///
    /// Returns `false` if the product is not in the list.
    pub async fn open_edit(&self, product_id: ProductId) -> bool {
        let Some(product) = self.find(product_id).await else {
            return false;
        };
        *self.form.write().await = Some(FormState {
            editing: Some(product.id),
            fields: ProductForm::from_product(&product),
        });
        true
    }

    /// Change the open form's fields. Does nothing when no form is open.
    pub async fn edit_form(&self, edit: impl FnOnce(&mut ProductForm) + Send) {
        if let Some(form) = self.form.write().await.as_mut() {
            edit(&mut form.fields);
        }
    }

    pub async fn form(&self) -> Option<FormState> {
        self.form.read().await.clone()
    }

    pub async fn close_form(&self) {
        *self.form.write().await = None;
    }

    /// Submit the open form.
    ///
    /// Invalid input is reported without any remote call. On success the
    /// form closes and the list reloads.
    #[instrument(skip(self))]
    pub async fn save(&self) -> ActionOutcome {
        let Some(form) = self.form().await else {
            return ActionOutcome::Skipped;
        };
        let input = match form.fields.validate() {
            Ok(input) => input,
            Err(e) => {
                self.presenter.notify(Notice::error(e.to_string()));
                return ActionOutcome::Rejected;
            }
        };

        let (request, success) = match form.editing {
            Some(id) => (ApiRequest::put(endpoints::product(id)), "Product updated"),
            None => (ApiRequest::post(endpoints::PRODUCTS), "Product created"),
        };
        let result = match request.json(&input) {
            Ok(request) => self.scope.run(self.app.session().authenticated_send(request)).await,
            Err(e) => Some(Err(e)),
        };

        match result {
            None => ActionOutcome::Discarded,
            Some(Ok(())) => {
                tracing::info!(product_id = ?form.editing, name = %input.name, "Product saved");
                self.presenter.notify(Notice::success(success));
                self.close_form().await;
                self.load_products().await;
                ActionOutcome::Completed
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Failed to save product");
                self.presenter.notify(Notice::error("Unable to save the product"));
                ActionOutcome::Failed
            }
        }
    }

    /// Ask for confirmation, then delete a listed product and reload.
    ///
    /// A failure notice carries the backend's error detail.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn request_delete(&self, product_id: ProductId) -> ActionOutcome {
        let Some(product) = self.find(product_id).await else {
            return ActionOutcome::Skipped;
        };
        if !self.presenter.confirm(&ConfirmPrompt::delete(&product.name)).await {
            return ActionOutcome::Skipped;
        }

        self.delete_product(product_id).await
    }

    async fn delete_product(&self, product_id: ProductId) -> ActionOutcome {
        let request = ApiRequest::delete(endpoints::product(product_id));
        match self.scope.run(self.app.session().authenticated_send(request)).await {
            None => ActionOutcome::Discarded,
            Some(Ok(())) => {
                tracing::info!(product_id = %product_id, "Product deleted");
                self.presenter.notify(Notice::success("Product deleted"));
                self.load_products().await;
                ActionOutcome::Completed
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Failed to delete product");
                self.presenter.notify(Notice::error(delete_failure_message(&e)));
                ActionOutcome::Failed
            }
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

    async fn find(&self, product_id: ProductId) -> Option<Product> {
        self.list
            .read()
            .await
            .items()
            .iter()
            .find(|product| product.id == product_id)
            .cloned()
    }
}

fn delete_failure_message(error: &ApiError) -> String {
    format!("Unable to delete the product: {error}")
}
