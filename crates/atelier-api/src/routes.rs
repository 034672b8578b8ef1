//! # Routes
//!
//! Axum router configuration for the checkout API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main application router
///
/// Routes:
/// - API:
///   - POST /api/v1/checkout - Create a print checkout session
///   - POST /api/v1/subscribe - Create a subscription checkout session
///   - GET  /api/v1/orders/{session_id} - Post-redirect order status
///   - GET  /api/v1/prints - List active prints
///   - GET  /api/v1/delivery-zones - List delivery zones
///
/// - Webhooks:
///   - POST /webhook/stripe - Stripe webhook handler
pub fn create_router(state: AppState) -> Router {
    // The portfolio site is a static host on a different origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/checkout", post(handlers::create_checkout))
        .route("/subscribe", post(handlers::subscribe))
        .route("/orders/{session_id}", get(handlers::get_order))
        .route("/prints", get(handlers::list_prints))
        .route("/delivery-zones", get(handlers::list_delivery_zones));

    // Webhook routes (no CORS, must accept raw body)
    let webhook_routes = Router::new().route("/stripe", post(handlers::stripe_webhook));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/", get(handlers::health))
        .nest("/api/v1", api_routes)
        .nest("/webhook", webhook_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
