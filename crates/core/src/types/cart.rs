//! Shopping cart contents.

use serde::{Deserialize, Serialize};

use super::{CartId, CartItemId, Product, ProductId};

/// One cart line: a product and how many units of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    #[serde(rename = "produit")]
    pub product: Product,
    #[serde(rename = "quantite")]
    pub quantity: u32,
}

/// The current user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub id: Option<CartId>,
    #[serde(default)]
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Find the line holding a product.
    #[must_use]
    pub fn item_for(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }

    /// Units of a product in the cart (zero when absent).
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.item_for(product_id).map_or(0, |item| item.quantity)
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
