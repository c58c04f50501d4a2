//! Typed client state for a storefront.
//!
//! The crate models what a shop front end keeps on the client: the
//! signed-in session ([`session::SessionStore`]), the shopping cart
//! ([`cart::CartStore`]) and a queue of transient notifications
//! ([`toast::NotificationQueue`]). Both stores mirror themselves into a
//! pluggable [`storage::KeyValueStorage`] so state survives restarts.
//! With the `async` or `blocking` feature, [`client`] talks to the
//! storefront REST API.
//!
//! ```
//! use std::sync::Arc;
//!
//! use storefront_rs::cart::CartStore;
//! use storefront_rs::models::{Product, ProductId};
//! use storefront_rs::storage::InMemoryStorage;
//!
//! let storage = Arc::new(InMemoryStorage::new());
//! let mut cart = CartStore::new(Arc::clone(&storage));
//! let lamp = Product {
//!     id: ProductId::new("p1"),
//!     title: "Desk lamp".to_owned(),
//!     description: String::new(),
//!     price: 10.0,
//!     category: "Home".to_owned(),
//!     merchant: None,
//! };
//! cart.add_to_cart(&lamp);
//! cart.add_to_cart(&lamp);
//! assert_eq!(cart.len(), 1);
//! assert_eq!(cart.cart_total(), 20.0);
//! ```

pub mod cart;
#[cfg(any(feature = "async", feature = "blocking"))]
pub mod client;
pub mod clock;
pub mod error;
pub mod messages;
pub mod models;
pub mod routes;
pub mod session;
pub mod storage;
pub mod toast;
pub mod token;
pub mod validation;
