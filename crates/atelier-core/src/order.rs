//! # Order Types
//!
//! A reconstructed order and the per-recipient notification report.
//! Orders are created only from a verified payment-completion event and
//! live just long enough to be dispatched; there is no order store.

use crate::cart::{Address, OrderCategory};
use crate::money::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Session created, payment not yet captured
    Pending,
    /// Payment captured and verified
    Completed,
}

/// A line recovered from session metadata.
///
/// Unlike `CartLine` this carries no catalog item id: the packed wire
/// format keeps only what the operator needs to fulfil the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub name: String,
    pub size_code: String,
    pub unit_price: Price,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_tag: Option<String>,
}

impl OrderLine {
    pub fn total(&self) -> Price {
        Price {
            amount: self.unit_price.amount * self.quantity as i64,
            currency: self.unit_price.currency,
        }
    }
}

/// An order reconstructed from a completed checkout session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Provider-assigned session id; the natural idempotency key
    pub order_id: String,

    /// Provider payment id, when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,

    /// Shipping address recovered from metadata (fields lost to
    /// truncation come back empty)
    pub customer: Address,

    /// Decoded cart lines, for display and notification only. The
    /// captured amount below is the source of truth for money.
    pub lines: Vec<OrderLine>,

    /// Delivery region label, absent for subscriptions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_label: Option<String>,

    /// Amount actually captured by the provider
    pub total_amount: Price,

    /// Order category discriminator
    pub category: OrderCategory,

    /// Lifecycle status
    pub status: OrderStatus,

    /// When the order was reconstructed
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Human-readable report for the operator notification
    pub fn report(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("New order {}\n", self.order_id));
        out.push_str(&format!("Category: {}\n", self.category.as_str()));
        out.push_str(&format!(
            "Customer: {} <{}>\n",
            self.customer.full_name(),
            self.customer.email
        ));
        if let Some(phone) = &self.customer.phone {
            out.push_str(&format!("Phone: {phone}\n"));
        }
        out.push_str(&format!(
            "Ship to: {}, {} {}, {}\n",
            self.customer.street,
            self.customer.postal_code,
            self.customer.city,
            self.customer.country_code
        ));
        if let Some(label) = &self.delivery_label {
            out.push_str(&format!("Delivery: {label}\n"));
        }
        out.push_str("Items:\n");
        for line in &self.lines {
            out.push_str(&format!(
                "  - {} ({}) x{} @ {}",
                line.name,
                line.size_code,
                line.quantity,
                line.unit_price.display()
            ));
            if let Some(license) = &line.license_tag {
                out.push_str(&format!(" [{license}]"));
            }
            out.push('\n');
        }
        out.push_str(&format!("Total captured: {}\n", self.total_amount.display()));
        out
    }
}

/// Outcome of one delivery attempt series for one recipient. The
/// pipeline's terminal output is a vector of these, not a single
/// pass/fail flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAttempt {
    /// Recipient kind (e.g. "operator", "order_log")
    pub recipient: String,

    /// Whether the recipient acknowledged within the retry budget
    pub succeeded: bool,

    /// Last delivery error, when it never succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationAttempt {
    pub fn success(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(recipient: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            succeeded: false,
            error: Some(error.into()),
        }
    }
}
