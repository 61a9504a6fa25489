//! Catalog products.

use serde::{Deserialize, Serialize};

use super::{Price, ProductId, display_amount};

/// Stock below this count is reported as low.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// A catalog product as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `None` when the backend sends no price.
    #[serde(rename = "prix", default)]
    pub price: Option<Price>,
    #[serde(rename = "imageUrl", default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: u32,
}

impl Product {
    /// Classify the remaining stock.
    #[must_use]
    pub const fn stock_level(&self) -> StockLevel {
        match self.stock {
            0 => StockLevel::OutOfStock,
            n if n < LOW_STOCK_THRESHOLD => StockLevel::Low(n),
            n => StockLevel::Available(n),
        }
    }

    /// Price with two decimals, or a dash when absent.
    #[must_use]
    pub fn display_price(&self) -> String {
        display_amount(self.price)
    }

    /// Whether at least one unit can be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Stock classification shown on product cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockLevel {
    OutOfStock,
    Low(u32),
    Available(u32),
}

/// Request body for creating or updating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductInput {
    #[serde(rename = "nom")]
    pub name: String,
    pub description: String,
    #[serde(rename = "prix")]
    pub price: Price,
    /// `None` is sent as an explicit `null` so an update clears the image.
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub stock: u32,
}
