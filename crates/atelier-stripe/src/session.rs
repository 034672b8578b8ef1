//! # Checkout Session Builder
//!
//! Turns a priced cart and address into a Stripe Checkout Session: one
//! line item per cart line, a conditional delivery line item, and the
//! encoded order metadata that is the only durable record of the order.

use crate::config::StripeConfig;
use atelier_core::{
    encode, price_cart, price_delivery, Address, Cart, CheckoutError, CheckoutResult,
    DeliverySelection, OrderCategory, Price, SubscriptionPlan,
};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Redirect targets for the hosted payment page
#[derive(Debug, Clone)]
pub struct RedirectUrls {
    /// Redirect after successful payment; carries the session-id placeholder
    pub success_url: String,
    /// Redirect if the customer cancels
    pub cancel_url: String,
}

impl RedirectUrls {
    /// Standard success/cancel paths under a site base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        Self {
            success_url: format!(
                "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}",
                base
            ),
            cancel_url: format!("{}/checkout/cancel", base),
        }
    }
}

/// A freshly created checkout session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    /// Provider-assigned session id
    pub session_id: String,
    /// Hosted payment page to redirect the customer to
    pub checkout_url: String,
    /// When the session expires
    pub expires_at: Option<DateTime<Utc>>,
}

/// Session state fetched back after redirect, for the confirmation page
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDetails {
    pub id: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Stripe gateway: session creation, session lookup, webhook secret owner
pub struct CheckoutGateway {
    config: StripeConfig,
    client: Client,
}

impl CheckoutGateway {
    /// Create a gateway with a bounded-timeout HTTP client
    pub fn new(config: StripeConfig) -> CheckoutResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| CheckoutError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> CheckoutResult<Self> {
        Self::new(StripeConfig::from_env()?)
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// Create a print-shop checkout session.
    ///
    /// Fails before any external call on an empty cart, an incomplete
    /// address, or a malformed line. A provider failure surfaces as
    /// `SessionCreation` and is not retried here; the client UI owns
    /// user-facing retry.
    #[instrument(skip(self, cart, address, delivery), fields(items = cart.lines.len()))]
    pub async fn create_print_session(
        &self,
        cart: &Cart,
        address: &Address,
        delivery: &DeliverySelection,
        urls: &RedirectUrls,
    ) -> CheckoutResult<SessionHandle> {
        let params = self.print_session_params(cart, address, delivery, urls)?;
        debug!("Creating print checkout session: {} cart lines", cart.lines.len());
        self.post_session(params).await
    }

    /// Create a subscription checkout session for a plan
    #[instrument(skip(self, plan, address, urls), fields(plan_id = %plan.id))]
    pub async fn create_subscription_session(
        &self,
        plan: &SubscriptionPlan,
        plan_price: Price,
        address: &Address,
        urls: &RedirectUrls,
    ) -> CheckoutResult<SessionHandle> {
        let params = self.subscription_session_params(plan, plan_price, address, urls)?;
        debug!("Creating subscription checkout session");
        self.post_session(params).await
    }

    /// Fetch a session for the post-redirect confirmation display
    #[instrument(skip(self))]
    pub async fn fetch_session(&self, session_id: &str) -> CheckoutResult<SessionDetails> {
        let url = format!(
            "{}/v1/checkout/sessions/{}",
            self.config.api_base_url, session_id
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe session lookup failed: status={}, body={}", status, body);
            return Err(CheckoutError::Provider {
                message: stripe_error_message(status.as_u16(), &body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| CheckoutError::Serialization(format!("session response: {e}")))
    }

    fn print_session_params(
        &self,
        cart: &Cart,
        address: &Address,
        delivery: &DeliverySelection,
        urls: &RedirectUrls,
    ) -> CheckoutResult<Vec<(String, String)>> {
        if cart.is_empty() {
            return Err(CheckoutError::InvalidLine {
                message: "cart has no items".to_string(),
            });
        }
        if !address.is_complete() {
            return Err(CheckoutError::InvalidLine {
                message: "shipping address is incomplete".to_string(),
            });
        }
        // Validates quantities and prices before the external call
        price_cart(&cart.lines)?;

        let mut params: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), urls.success_url.clone()),
            ("cancel_url".to_string(), urls.cancel_url.clone()),
            ("customer_email".to_string(), address.email.clone()),
            (
                "billing_address_collection".to_string(),
                "required".to_string(),
            ),
        ];

        for (i, country) in self.config.allowed_shipping_countries.iter().enumerate() {
            params.push((
                format!("shipping_address_collection[allowed_countries][{i}]"),
                country.clone(),
            ));
        }

        for (i, line) in cart.lines.iter().enumerate() {
            push_line_item(
                &mut params,
                i,
                &format!("{} ({})", line.name, line.size_code),
                line.unit_price,
                line.quantity,
            );
        }

        // Delivery appears as its own line item, only when it costs anything
        let delivery_cost = price_delivery(delivery, cart.item_count());
        if !delivery_cost.is_zero() {
            push_line_item(
                &mut params,
                cart.lines.len(),
                &format!("Delivery ({})", delivery.region_label),
                delivery_cost,
                1,
            );
        }

        let metadata = encode(cart, address, &delivery.region_label);
        for (key, value) in metadata {
            params.push((format!("metadata[{key}]"), value));
        }
        params.push((
            format!("metadata[{}]", atelier_core::encode::keys::CATEGORY),
            OrderCategory::PrintShop.as_str().to_string(),
        ));

        Ok(params)
    }

    fn subscription_session_params(
        &self,
        plan: &SubscriptionPlan,
        plan_price: Price,
        address: &Address,
        urls: &RedirectUrls,
    ) -> CheckoutResult<Vec<(String, String)>> {
        if !address.is_complete() {
            return Err(CheckoutError::InvalidLine {
                message: "address is incomplete".to_string(),
            });
        }

        let mut params: Vec<(String, String)> = vec![
            ("mode".to_string(), "subscription".to_string()),
            ("success_url".to_string(), urls.success_url.clone()),
            ("cancel_url".to_string(), urls.cancel_url.clone()),
            ("customer_email".to_string(), address.email.clone()),
        ];

        push_line_item(&mut params, 0, &plan.name, plan_price, 1);
        params.push((
            "line_items[0][price_data][recurring][interval]".to_string(),
            plan.interval.clone(),
        ));

        // Subscriptions carry the address but no cart or delivery
        let metadata = encode(&Cart::new(), address, "");
        for (key, value) in metadata {
            params.push((format!("metadata[{key}]"), value));
        }
        params.push((
            format!("metadata[{}]", atelier_core::encode::keys::PLAN),
            plan.name.clone(),
        ));
        params.push((
            format!("metadata[{}]", atelier_core::encode::keys::CATEGORY),
            OrderCategory::Subscription.as_str().to_string(),
        ));

        Ok(params)
    }

    async fn post_session(&self, params: Vec<(String, String)>) -> CheckoutResult<SessionHandle> {
        let url = format!("{}/v1/checkout/sessions", self.config.api_base_url);
        let idempotency_key = Uuid::new_v4().to_string();

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.auth_header())
            .header("Stripe-Version", &self.config.api_version)
            .header("Idempotency-Key", &idempotency_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CheckoutError::Network(e.to_string()))?;

        if !status.is_success() {
            error!("Stripe API error: status={}, body={}", status, body);
            return Err(CheckoutError::SessionCreation(stripe_error_message(
                status.as_u16(),
                &body,
            )));
        }

        let session: StripeSessionResponse = serde_json::from_str(&body)
            .map_err(|e| CheckoutError::Serialization(format!("session response: {e}")))?;

        info!(
            "Created checkout session: id={}, url={}",
            session.id, session.url
        );

        Ok(SessionHandle {
            session_id: session.id,
            checkout_url: session.url,
            expires_at: session
                .expires_at
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
        })
    }
}

fn push_line_item(
    params: &mut Vec<(String, String)>,
    index: usize,
    name: &str,
    unit_price: Price,
    quantity: u32,
) {
    params.push((
        format!("line_items[{index}][price_data][currency]"),
        unit_price.currency.as_str().to_string(),
    ));
    params.push((
        format!("line_items[{index}][price_data][unit_amount]"),
        unit_price.amount.to_string(),
    ));
    params.push((
        format!("line_items[{index}][price_data][product_data][name]"),
        name.to_string(),
    ));
    params.push((format!("line_items[{index}][quantity]"), quantity.to_string()));
}

fn stripe_error_message(status: u16, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<StripeErrorResponse>(body) {
        parsed.error.message
    } else {
        format!("HTTP {status}: {body}")
    }
}

#[derive(Debug, Deserialize)]
struct StripeSessionResponse {
    id: String,
    url: String,
    #[serde(default)]
    expires_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorResponse {
    error: StripeError,
}

#[derive(Debug, Deserialize)]
struct StripeError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{CartLine, Currency};

    fn gateway() -> CheckoutGateway {
        CheckoutGateway::new(
            StripeConfig::new("sk_test_abc", "whsec_123")
                .with_shipping_countries(vec!["FR".into(), "BE".into()]),
        )
        .unwrap()
    }

    fn address() -> Address {
        Address {
            first_name: "Ana".into(),
            last_name: "Martin".into(),
            email: "ana@example.com".into(),
            phone: None,
            street: "12 rue des Lilas".into(),
            city: "Lyon".into(),
            postal_code: "69003".into(),
            country_code: "FR".into(),
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_line(CartLine {
            item_id: "shanks".into(),
            name: "Shanks".into(),
            size_code: "A4".into(),
            unit_price: Price::new(7.80, Currency::EUR),
            quantity: 2,
            license_tag: None,
        });
        cart
    }

    fn france() -> DeliverySelection {
        DeliverySelection {
            region_label: "France".into(),
            base_price: Price::new(2.50, Currency::EUR),
            per_additional_item_price: Price::new(0.20, Currency::EUR),
        }
    }

    fn value_of<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_print_params_include_delivery_line() {
        let urls = RedirectUrls::new("https://atelier.example");
        let params = gateway()
            .print_session_params(&cart(), &address(), &france(), &urls)
            .unwrap();

        assert_eq!(value_of(&params, "mode"), Some("payment"));
        assert_eq!(
            value_of(&params, "line_items[0][price_data][unit_amount]"),
            Some("780")
        );
        assert_eq!(value_of(&params, "line_items[0][quantity]"), Some("2"));
        // 2 items: 2.50 + 0.20 = 2.70 delivery line
        assert_eq!(
            value_of(&params, "line_items[1][price_data][product_data][name]"),
            Some("Delivery (France)")
        );
        assert_eq!(
            value_of(&params, "line_items[1][price_data][unit_amount]"),
            Some("270")
        );
        assert_eq!(value_of(&params, "metadata[category]"), Some("print_shop"));
        assert_eq!(value_of(&params, "metadata[delivery]"), Some("France"));
        assert_eq!(
            value_of(&params, "shipping_address_collection[allowed_countries][0]"),
            Some("FR")
        );
        assert_eq!(
            value_of(&params, "billing_address_collection"),
            Some("required")
        );
        assert!(value_of(&params, "success_url")
            .unwrap()
            .contains("{CHECKOUT_SESSION_ID}"));
    }

    #[test]
    fn test_free_delivery_emits_no_delivery_line() {
        let free = DeliverySelection {
            region_label: "Pickup".into(),
            base_price: Price::zero(Currency::EUR),
            per_additional_item_price: Price::zero(Currency::EUR),
        };
        let urls = RedirectUrls::new("https://atelier.example");
        let params = gateway()
            .print_session_params(&cart(), &address(), &free, &urls)
            .unwrap();

        assert!(value_of(&params, "line_items[1][quantity]").is_none());
    }

    #[test]
    fn test_empty_cart_rejected_before_any_call() {
        let urls = RedirectUrls::new("https://atelier.example");
        let result = gateway().print_session_params(&Cart::new(), &address(), &france(), &urls);
        assert!(matches!(result, Err(CheckoutError::InvalidLine { .. })));
    }

    #[test]
    fn test_incomplete_address_rejected() {
        let mut addr = address();
        addr.email.clear();
        let urls = RedirectUrls::new("https://atelier.example");
        let result = gateway().print_session_params(&cart(), &addr, &france(), &urls);
        assert!(matches!(result, Err(CheckoutError::InvalidLine { .. })));
    }

    #[test]
    fn test_subscription_params() {
        let plan = SubscriptionPlan {
            id: "sketchbook-club".into(),
            name: "Sketchbook Club".into(),
            price: 5.0,
            interval: "month".into(),
            active: true,
        };
        let urls = RedirectUrls::new("https://atelier.example");
        let params = gateway()
            .subscription_session_params(&plan, Price::new(5.0, Currency::EUR), &address(), &urls)
            .unwrap();

        assert_eq!(value_of(&params, "mode"), Some("subscription"));
        assert_eq!(
            value_of(&params, "line_items[0][price_data][recurring][interval]"),
            Some("month")
        );
        assert_eq!(value_of(&params, "metadata[category]"), Some("subscription"));
        assert_eq!(value_of(&params, "metadata[plan]"), Some("Sketchbook Club"));
    }
}
