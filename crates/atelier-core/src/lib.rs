//! # atelier-core
//!
//! Core types and pure logic for the atelier-cart checkout pipeline.
//!
//! This crate provides:
//! - `Cart`, `CartLine`, `Address`, `DeliverySelection` for the client cart
//! - pricing functions (`price_cart`, `price_delivery`, `price_order`)
//! - the lossy-but-total metadata encoder (`encode`/`decode`)
//! - `Order`, `OrderLine`, `NotificationAttempt` for the webhook side
//! - `ShopCatalog` for prints, plans, and delivery zones
//! - `CheckoutError` for typed error handling
//!
//! Nothing here performs I/O; the provider integration lives in
//! `atelier-stripe` and delivery of notifications in `atelier-notify`.

pub mod cart;
pub mod catalog;
pub mod encode;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;

// Re-exports for convenience
pub use cart::{Address, Cart, CartLine, DeliverySelection, OrderCategory};
pub use catalog::{DeliveryZone, PrintProduct, PrintSize, ShopCatalog, SubscriptionPlan};
pub use encode::{decode, encode, DecodedCheckout, DecodedCustomer};
pub use error::{CheckoutError, CheckoutResult};
pub use money::{Currency, Price};
pub use order::{NotificationAttempt, Order, OrderLine, OrderStatus};
pub use pricing::{price_cart, price_delivery, price_order};
