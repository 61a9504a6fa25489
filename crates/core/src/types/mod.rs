//! Domain types for Shopie.
//!
//! This module provides type-safe wrappers for the backend's resources.

pub mod cart;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod status;

pub use cart::{Cart, CartItem};
pub use id::*;
pub use order::Order;
pub use price::{MISSING_AMOUNT, Price, PriceError, display_amount};
pub use product::{Product, ProductInput, StockLevel};
pub use status::*;
