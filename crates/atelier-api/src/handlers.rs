//! # Request Handlers
//!
//! Axum request handlers for checkout, catalog, and the Stripe webhook.
//! The webhook handler is the stateless back half of the pipeline:
//! verify, reconstruct, dispatch, acknowledge.

use crate::state::AppState;
use atelier_core::{Cart, CheckoutError};
use atelier_stripe::{reconstruct, WebhookEvent};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// One requested item in a checkout
#[derive(Debug, Deserialize)]
pub struct CheckoutItem {
    /// Print ID
    pub item_id: String,
    /// Size code
    pub size_code: String,
    /// Quantity
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Create checkout request. Prices come from the catalog, never from
/// the client.
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Items to purchase
    #[serde(default)]
    pub items: Vec<CheckoutItem>,
    /// Shipping address
    pub address: atelier_core::Address,
    /// Delivery region label
    pub delivery_region: String,
}

/// Subscription checkout request
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    /// Plan ID from the catalog
    pub plan_id: String,
    /// Billing address
    pub address: atelier_core::Address,
}

/// Create checkout response
#[derive(Debug, Serialize)]
pub struct CreateCheckoutResponse {
    /// Session ID
    pub session_id: String,
    /// Checkout URL (redirect user here)
    pub checkout_url: String,
    /// Session expiration time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

/// Post-redirect order status, for the confirmation page
#[derive(Debug, Serialize)]
pub struct OrderStatusResponse {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: u16) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, Json<ErrorResponse>) {
    let code = err.status_code();
    let response = ErrorResponse::new(err.to_string(), code);
    (
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(response),
    )
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "atelier-cart",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Create a print-shop checkout session
#[instrument(skip(state, request), fields(items = request.items.len()))]
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<Json<CreateCheckoutResponse>, (StatusCode, Json<ErrorResponse>)> {
    if request.items.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("No items in checkout request", 400)),
        ));
    }

    // Price every line from the catalog
    let mut cart = Cart::new();
    for item in &request.items {
        let line = state
            .catalog
            .cart_line(&item.item_id, &item.size_code, item.quantity)
            .map_err(checkout_error_to_response)?;
        cart.add_line(line);
    }

    let delivery = state
        .catalog
        .delivery_selection(&request.delivery_region)
        .map_err(checkout_error_to_response)?;

    info!(
        "Creating checkout: {} items, delivery={}",
        cart.item_count(),
        delivery.region_label
    );

    let session = state
        .gateway
        .create_print_session(&cart, &request.address, &delivery, &state.urls)
        .await
        .map_err(|e| {
            error!("Failed to create checkout: {}", e);
            checkout_error_to_response(e)
        })?;

    Ok(Json(CreateCheckoutResponse {
        session_id: session.session_id,
        checkout_url: session.checkout_url,
        expires_at: session.expires_at.map(|t| t.to_rfc3339()),
    }))
}

/// Create a subscription checkout session
#[instrument(skip(state, request), fields(plan_id = %request.plan_id))]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<CreateCheckoutResponse>, (StatusCode, Json<ErrorResponse>)> {
    let plan = state
        .catalog
        .plan(&request.plan_id)
        .ok_or_else(|| {
            checkout_error_to_response(CheckoutError::PlanNotFound {
                plan_id: request.plan_id.clone(),
            })
        })?
        .clone();
    let plan_price = state.catalog.plan_price(&plan);

    let session = state
        .gateway
        .create_subscription_session(&plan, plan_price, &request.address, &state.urls)
        .await
        .map_err(|e| {
            error!("Failed to create subscription checkout: {}", e);
            checkout_error_to_response(e)
        })?;

    Ok(Json(CreateCheckoutResponse {
        session_id: session.session_id,
        checkout_url: session.checkout_url,
        expires_at: session.expires_at.map(|t| t.to_rfc3339()),
    }))
}

/// Fetch session status after redirect, for the confirmation page
#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<OrderStatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    let details = state
        .gateway
        .fetch_session(&session_id)
        .await
        .map_err(checkout_error_to_response)?;

    Ok(Json(OrderStatusResponse {
        session_id: details.id,
        payment_status: details.payment_status,
        customer_email: details.customer_email,
        amount_total: details.amount_total,
        currency: details.currency,
    }))
}

/// Handle the Stripe webhook.
///
/// Signature failure is the only 400. An authentic event is always
/// acknowledged with 200, even when notification delivery fails, so the
/// provider never re-delivers an event that was processed.
#[instrument(skip(state, headers, body))]
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing Stripe-Signature header", 400)),
            )
        })?;

    let event = state.gateway.verify_webhook(&body, signature).map_err(|e| {
        error!("Webhook verification failed: {}", e);
        checkout_error_to_response(e)
    })?;

    let completed = match event {
        WebhookEvent::Ignored(event_type) => {
            info!("Ignoring webhook event: type={}", event_type);
            return Ok(StatusCode::OK);
        }
        WebhookEvent::CheckoutCompleted(completed) => completed,
    };

    let order = reconstruct(&completed);
    info!(
        "Order completed: id={}, category={}, total={}",
        order.order_id,
        order.category.as_str(),
        order.total_amount.display()
    );

    let attempts = state.dispatcher.dispatch(&order).await;
    for attempt in &attempts {
        if attempt.succeeded {
            info!("Notified {}: order={}", attempt.recipient, order.order_id);
        } else {
            warn!(
                "Notification to {} failed for order {}: {}",
                attempt.recipient,
                order.order_id,
                attempt.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(StatusCode::OK)
}

/// List active prints
pub async fn list_prints(State(state): State<AppState>) -> impl IntoResponse {
    let prints: Vec<_> = state.catalog.active_prints().collect();
    Json(serde_json::json!({
        "prints": prints,
        "count": prints.len()
    }))
}

/// List delivery zones
pub async fn list_delivery_zones(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "delivery_zones": state.catalog.delivery_zones,
        "count": state.catalog.delivery_zones.len()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400);
        assert_eq!(err.error, "Test error");
        assert_eq!(err.code, 400);
    }

    #[test]
    fn test_checkout_error_conversion() {
        let err = CheckoutError::ItemNotFound {
            item_id: "ghost".into(),
            size_code: "A4".into(),
        };
        let (status, _json) = checkout_error_to_response(err);
        assert_eq!(status, StatusCode::NOT_FOUND);

        let err = CheckoutError::SignatureMismatch("bad v1".into());
        let (status, _json) = checkout_error_to_response(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_checkout_item_default_quantity() {
        let item: CheckoutItem =
            serde_json::from_str(r#"{"item_id": "shanks", "size_code": "A4"}"#).unwrap();
        assert_eq!(item.quantity, 1);
    }
}
