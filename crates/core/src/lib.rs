//! Shopie Core - Shared domain types.
//!
//! This crate provides the types exchanged with the Shopie backend and shared
//! by every client component:
//! - `storefront` - Session, cart and catalog runtime
//! - `admin` - Product and order management screens
//! - `cli` - Terminal front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O and no HTTP clients. Field
//! names on the wire are the backend's (`nom`, `prix`, `statut`, ...) and are
//! mapped with serde renames so the Rust side reads in English.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, statuses, products, orders and cart items

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
