//! # atelier-api
//!
//! HTTP API layer for atelier-cart-rs.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for checkout and the shop catalog
//! - Stripe webhook handler driving order reconstruction and dispatch
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/v1/checkout` | Create print checkout session |
//! | POST | `/api/v1/subscribe` | Create subscription checkout session |
//! | GET | `/api/v1/orders/:session_id` | Post-redirect order status |
//! | GET | `/api/v1/prints` | List active prints |
//! | GET | `/api/v1/delivery-zones` | List delivery zones |
//! | POST | `/webhook/stripe` | Stripe webhook |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
