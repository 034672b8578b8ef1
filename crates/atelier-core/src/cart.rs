//! # Cart Types
//!
//! Cart, address, and delivery types held in client session state.
//! These are ephemeral: destroyed on successful checkout or abandonment.

use crate::money::{Currency, Price};
use serde::{Deserialize, Serialize};

/// A line in the cart, unique per (item_id, size_code)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    /// Catalog item ID
    pub item_id: String,

    /// Print name (denormalized for display and metadata encoding)
    pub name: String,

    /// Print size code (e.g. "A4")
    pub size_code: String,

    /// Unit price
    pub unit_price: Price,

    /// Quantity (>= 1 for a valid line)
    pub quantity: u32,

    /// Optional usage license tag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_tag: Option<String>,
}

impl CartLine {
    /// Total price for this line
    pub fn total(&self) -> Price {
        Price {
            amount: self.unit_price.amount * self.quantity as i64,
            currency: self.unit_price.currency,
        }
    }
}

/// A cart to be checked out
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add a line, merging quantities when the (item_id, size_code)
    /// combination is already present.
    pub fn add_line(&mut self, line: CartLine) {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.item_id == line.item_id && l.size_code == line.size_code)
        {
            existing.quantity += line.quantity;
        } else {
            self.lines.push(line);
        }
    }

    /// Total item count across all lines
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Currency of the cart (all lines share one; EUR when empty)
    pub fn currency(&self) -> Currency {
        self.lines
            .first()
            .map(|l| l.unit_price.currency)
            .unwrap_or_default()
    }
}

/// Customer shipping address. All fields except phone are required
/// for order placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country_code: String,
}

impl Address {
    /// Whether all required fields are present
    pub fn is_complete(&self) -> bool {
        !self.first_name.is_empty()
            && !self.last_name.is_empty()
            && !self.email.is_empty()
            && !self.street.is_empty()
            && !self.city.is_empty()
            && !self.postal_code.is_empty()
            && !self.country_code.is_empty()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Delivery pricing for a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverySelection {
    /// Region label shown to the customer (e.g. "France")
    pub region_label: String,

    /// Price for the first item
    pub base_price: Price,

    /// Price added for every item beyond the first
    pub per_additional_item_price: Price,
}

/// Order category discriminator, carried in session metadata so the
/// webhook handler can select a reconstruction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderCategory {
    /// One-off print order with shipping
    PrintShop,
    /// Recurring sketchbook-club subscription
    Subscription,
}

impl OrderCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderCategory::PrintShop => "print_shop",
            OrderCategory::Subscription => "subscription",
        }
    }

    /// Parse the metadata discriminator. Unknown or missing values fall
    /// back to the print-shop path, which tolerates absent fields.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("subscription") => OrderCategory::Subscription,
            _ => OrderCategory::PrintShop,
        }
    }
}
