//! Shopie management screens.
//!
//! Product and order administration for the Shopie client. Both screens
//! require a [`guard::RequireAdmin`], obtained from the session before the
//! screen is built.
//!
//! # Security
//!
//! The role check here only decides what the client shows. The backend
//! enforces authorization on every management endpoint.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod guard;
pub mod orders;
pub mod products;

pub use guard::{AccessDenied, RequireAdmin};
pub use orders::AdminOrdersScreen;
pub use products::AdminProductsScreen;
