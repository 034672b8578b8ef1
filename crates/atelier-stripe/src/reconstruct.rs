//! # Order Reconstruction
//!
//! Rebuilds a structured `Order` from the metadata of a completed
//! checkout session. Reconstruction is total: metadata mangled by
//! truncation degrades to a partial order, it never fails the webhook.
//!
//! Money comes from the provider's captured amount, not from the decoded
//! lines: encoding is lossy, and the captured amount is what was
//! actually charged.

use crate::webhook::CompletedSession;
use atelier_core::encode::keys;
use atelier_core::{decode, Order, OrderCategory, OrderLine, OrderStatus, Price};
use chrono::Utc;
use tracing::instrument;

/// Rebuild an `Order` from a completed session.
///
/// The `category` metadata discriminator selects the parsing strategy:
/// print-shop orders carry a packed cart and a delivery label,
/// subscriptions carry a plan name. Only invoked for completion events,
/// so the status is `Completed` unconditionally.
#[instrument(skip(completed), fields(session_id = %completed.session_id))]
pub fn reconstruct(completed: &CompletedSession) -> Order {
    let category = OrderCategory::from_tag(
        completed.metadata.get(keys::CATEGORY).map(String::as_str),
    );

    let decoded = decode(&completed.metadata);

    let mut customer = decoded.customer.into_address();
    if customer.email.is_empty() {
        // The provider-collected email outlives metadata truncation
        customer.email = completed.customer_email.clone().unwrap_or_default();
    }

    let (lines, delivery_label) = match category {
        OrderCategory::PrintShop => {
            // Decoded prices carry no currency of their own; the session's
            // currency applies to every line
            let lines = decoded
                .lines
                .into_iter()
                .map(|mut line| {
                    line.unit_price.currency = completed.currency;
                    line
                })
                .collect();
            (lines, decoded.delivery_label)
        }
        OrderCategory::Subscription => {
            let plan_name = completed
                .metadata
                .get(keys::PLAN)
                .cloned()
                .unwrap_or_else(|| "Subscription".to_string());
            let line = OrderLine {
                name: plan_name,
                size_code: String::new(),
                unit_price: Price::from_cents(completed.amount_total, completed.currency),
                quantity: 1,
                license_tag: None,
            };
            (vec![line], None)
        }
    };

    Order {
        order_id: completed.session_id.clone(),
        payment_id: completed.payment_intent_id.clone(),
        customer,
        lines,
        delivery_label,
        total_amount: Price::from_cents(completed.amount_total, completed.currency),
        category,
        status: OrderStatus::Completed,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::{encode, Address, Cart, CartLine, Currency};
    use std::collections::HashMap;

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

    fn completed_print_session() -> CompletedSession {
        let mut cart = Cart::new();
        cart.add_line(CartLine {
            item_id: "shanks".into(),
            name: "Shanks".into(),
            size_code: "A4".into(),
            unit_price: Price::new(7.80, Currency::EUR),
            quantity: 2,
            license_tag: None,
        });

        let mut metadata = encode(&cart, &address(), "France");
        metadata.insert(
            keys::CATEGORY.to_string(),
            OrderCategory::PrintShop.as_str().to_string(),
        );

        CompletedSession {
            session_id: "cs_test_123".into(),
            payment_intent_id: Some("pi_test_456".into()),
            customer_email: Some("ana@example.com".into()),
            // subtotal 15.60 + delivery 2.70 as captured by the provider
            amount_total: 1830,
            currency: Currency::EUR,
            payment_status: "paid".into(),
            metadata,
        }
    }

    #[test]
    fn test_print_shop_reconstruction_end_to_end() {
        let order = reconstruct(&completed_print_session());

        assert_eq!(order.order_id, "cs_test_123");
        assert_eq!(order.payment_id.as_deref(), Some("pi_test_456"));
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.category, OrderCategory::PrintShop);
        assert_eq!(order.total_amount.amount, 1830);
        assert_eq!(order.delivery_label.as_deref(), Some("France"));
        assert_eq!(order.customer.full_name(), "Ana Martin");
        assert_eq!(order.customer.city, "Lyon");

        assert_eq!(order.lines.len(), 1);
        let line = &order.lines[0];
        assert_eq!(line.name, "Shanks");
        assert_eq!(line.size_code, "A4");
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price.amount, 780);
        assert_eq!(line.unit_price.currency, Currency::EUR);
    }

    #[test]
    fn test_captured_amount_is_authoritative() {
        let mut session = completed_print_session();
        // Provider captured a different amount than the decoded lines sum
        // to (e.g. lines lost to truncation); the capture wins.
        session.amount_total = 990;
        let order = reconstruct(&session);
        assert_eq!(order.total_amount.amount, 990);
    }

    #[test]
    fn test_subscription_reconstruction() {
        let mut metadata = HashMap::new();
        metadata.insert(
            keys::CATEGORY.to_string(),
            OrderCategory::Subscription.as_str().to_string(),
        );
        metadata.insert(keys::PLAN.to_string(), "Sketchbook Club".to_string());
        metadata.insert(keys::EMAIL.to_string(), "ana@example.com".to_string());

        let order = reconstruct(&CompletedSession {
            session_id: "cs_sub_1".into(),
            payment_intent_id: None,
            customer_email: None,
            amount_total: 500,
            currency: Currency::EUR,
            payment_status: "paid".into(),
            metadata,
        });

        assert_eq!(order.category, OrderCategory::Subscription);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].name, "Sketchbook Club");
        assert_eq!(order.lines[0].unit_price.amount, 500);
        assert!(order.delivery_label.is_none());
        assert_eq!(order.customer.email, "ana@example.com");
    }

    #[test]
    fn test_reconstruction_never_fails_on_garbage_metadata() {
        let mut metadata = HashMap::new();
        metadata.insert(keys::CART_LINES.to_string(), ";;|garbage|;".to_string());

        let order = reconstruct(&CompletedSession {
            session_id: "cs_mangled".into(),
            payment_intent_id: None,
            customer_email: Some("fallback@example.com".into()),
            amount_total: 1200,
            currency: Currency::EUR,
            payment_status: "paid".into(),
            metadata,
        });

        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.lines.is_empty());
        assert_eq!(order.total_amount.amount, 1200);
        // email falls back to the provider-collected address
        assert_eq!(order.customer.email, "fallback@example.com");
    }
}
