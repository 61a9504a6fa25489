//! Shopie storefront client.
//!
//! Headless client runtime for the Shopie shop: backend transport, the
//! session and cart services, and the catalog screen. Front ends supply a
//! [`presenter::Presenter`] and drive the screens; the management screens
//! live in `shopie-admin`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod config;
pub mod presenter;
pub mod scope;
pub mod screens;
pub mod session;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use state::AppState;
