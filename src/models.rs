//! Data models for the storefront.
//!
//! Strongly-typed users, products, cart lines and request/response
//! bodies, plus newtype ids and the enums for constrained values.

mod auth;
mod cart;
mod catalog;
mod enums;
mod ids;
mod product;
mod user;

pub use auth::{AuthResponse, Credentials, ProfileResponse, Registration};
pub use cart::{CartEntry, OrderSummary, ShippingAddress};
pub use catalog::{
    DEFAULT_PAGE_SIZE, Pagination, ProductEnvelope, ProductFilter, ProductPage, StatusResponse,
};
pub use enums::{Role, SortOrder, ToastKind};
pub use ids::{ProductId, TimerHandle, ToastId, UserId};
pub use product::{Product, ProductDraft, coerce_price};
pub use user::{User, UserUpdate};
