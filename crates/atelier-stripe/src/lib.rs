//! # atelier-stripe
//!
//! Stripe integration for atelier-cart-rs: hosted checkout session
//! creation, webhook signature verification, and order reconstruction
//! from session metadata.
//!
//! The session metadata is the only durable record of an order; there is
//! no database. `CheckoutGateway::create_print_session` embeds the
//! encoded cart/address, and after the completion webhook is verified,
//! [`reconstruct`] inverts that encoding into an [`atelier_core::Order`].
//!
//! ## Flow
//!
//! ```rust,ignore
//! let gateway = CheckoutGateway::from_env()?;
//!
//! // Checkout: redirect the customer to the hosted payment page
//! let session = gateway
//!     .create_print_session(&cart, &address, &delivery, &urls)
//!     .await?;
//!
//! // Webhook: verify, then rebuild the order from metadata
//! match gateway.verify_webhook(&body, signature)? {
//!     WebhookEvent::CheckoutCompleted(completed) => {
//!         let order = reconstruct(&completed);
//!         // hand off to atelier-notify
//!     }
//!     WebhookEvent::Ignored(_) => { /* acknowledge with 200 */ }
//! }
//! ```

pub mod config;
pub mod reconstruct;
pub mod session;
pub mod webhook;

// Re-exports
pub use config::StripeConfig;
pub use reconstruct::reconstruct;
pub use session::{CheckoutGateway, RedirectUrls, SessionDetails, SessionHandle};
pub use webhook::{CompletedSession, WebhookEvent};
