//! Cart service.
//!
//! Holds the signed-in user's cart as last fetched from the backend and
//! exposes membership queries plus mutation helpers. Every successful
//! mutation is followed by a reload of the whole cart; the local copy is
//! never patched.

use std::sync::Arc;

use serde::Serialize;
use shopie_core::{Cart, CartItem, CartItemId, ProductId};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::api::{ApiError, ApiRequest, endpoints};
use crate::session::SessionService;

/// Errors returned by cart mutations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The product has no line in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),
}

#[derive(Serialize)]
struct AddItemRequest {
    #[serde(rename = "produitId")]
    product_id: ProductId,
    #[serde(rename = "quantite")]
    quantity: u32,
}

/// The current user's cart.
pub struct CartService {
    session: Arc<SessionService>,
    cart: RwLock<Cart>,
}

impl CartService {
    #[must_use]
    pub fn new(session: Arc<SessionService>) -> Self {
        Self {
            session,
            cart: RwLock::new(Cart::default()),
        }
    }

    /// Fetch the cart. An absent body means an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if the fetch fails; the local copy is unchanged.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let cart: Option<Cart> = self
            .session
            .authenticated_request(ApiRequest::get(endpoints::CART))
            .await?;
        *self.cart.write().await = cart.unwrap_or_default();
        Ok(())
    }

    /// Add units of a product.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Api` if the backend rejects the addition.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        let request = ApiRequest::post(endpoints::CART_ITEMS).json(&AddItemRequest {
            product_id,
            quantity,
        })?;
        self.session.authenticated_send(request).await?;
        self.reload_after_mutation().await;
        Ok(())
    }

    /// Set the quantity of a cart line. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Api` if the backend rejects the update.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn update_cart_item(&self, item_id: CartItemId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove_item(item_id).await;
        }

        let request = ApiRequest::put(endpoints::cart_item(item_id))
            .query(endpoints::CART_QUANTITY_PARAM, quantity.to_string());
        self.session.authenticated_send(request).await?;
        self.reload_after_mutation().await;
        Ok(())
    }

    /// Delete a cart line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Api` if the backend rejects the deletion.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_item(&self, item_id: CartItemId) -> Result<(), CartError> {
        self.session
            .authenticated_send(ApiRequest::delete(endpoints::cart_item(item_id)))
            .await?;
        self.reload_after_mutation().await;
        Ok(())
    }

    /// Delete the line holding a product.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotInCart` if the product has no line, otherwise
    /// `CartError::Api` on a backend failure.
    pub async fn remove_product_from_cart(&self, product_id: ProductId) -> Result<(), CartError> {
        let item = self
            .item_for(product_id)
            .await
            .ok_or(CartError::NotInCart(product_id))?;
        self.remove_item(item.id).await
    }

    /// The line holding a product, if any.
    pub async fn item_for(&self, product_id: ProductId) -> Option<CartItem> {
        self.cart.read().await.item_for(product_id).cloned()
    }

    /// Units of a product in the cart.
    pub async fn quantity_in_cart(&self, product_id: ProductId) -> u32 {
        self.cart.read().await.quantity_of(product_id)
    }

    /// Total units in the cart.
    pub async fn item_count(&self) -> u32 {
        self.cart.read().await.item_count()
    }

    /// Copy of the cart as last fetched.
    pub async fn snapshot(&self) -> Cart {
        self.cart.read().await.clone()
    }

    /// Forget the cart (logout).
    pub async fn reset(&self) {
        *self.cart.write().await = Cart::default();
    }

    /// The mutation already succeeded, so a failed reload only leaves the
    /// local copy stale until the next refresh.
    async fn reload_after_mutation(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Failed to reload cart after mutation");
        }
    }
}
