//! # Shop Catalog
//!
//! Prints, subscription plans, and delivery zones, loaded from
//! `config/shop.toml`. The API layer prices carts against this catalog
//! so the client never dictates a price.

use crate::cart::{CartLine, DeliverySelection};
use crate::error::{CheckoutError, CheckoutResult};
use crate::money::{Currency, Price};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// One available size of a print
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintSize {
    /// Size code, e.g. "A4"
    pub code: String,
    /// Decimal price in the catalog currency
    pub price: f64,
}

/// A print in the shop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintProduct {
    /// Unique identifier (e.g. "shanks")
    pub id: String,

    /// Display name
    pub name: String,

    /// Available sizes with their prices
    pub sizes: Vec<PrintSize>,

    /// Optional usage license attached to every sale of this print
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    /// Whether the print is currently for sale
    #[serde(default = "default_true")]
    pub active: bool,
}

/// A recurring subscription plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    pub id: String,
    pub name: String,
    /// Decimal price per billing interval
    pub price: f64,
    /// Billing interval: "month" or "year"
    pub interval: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Delivery pricing for one region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryZone {
    /// Region label (e.g. "France")
    pub region: String,
    /// Decimal base price for the first item
    pub base: f64,
    /// Decimal price per item beyond the first
    pub per_additional_item: f64,
}

/// The whole shop configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopCatalog {
    #[serde(default)]
    pub currency: Currency,

    #[serde(default)]
    pub prints: Vec<PrintProduct>,

    #[serde(default)]
    pub subscriptions: Vec<SubscriptionPlan>,

    #[serde(default)]
    pub delivery_zones: Vec<DeliveryZone>,
}

impl ShopCatalog {
    /// Load catalog from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Find an active print by id
    pub fn print(&self, id: &str) -> Option<&PrintProduct> {
        self.prints.iter().find(|p| p.id == id && p.active)
    }

    /// All active prints
    pub fn active_prints(&self) -> impl Iterator<Item = &PrintProduct> {
        self.prints.iter().filter(|p| p.active)
    }

    /// Find an active subscription plan by id
    pub fn plan(&self, id: &str) -> Option<&SubscriptionPlan> {
        self.subscriptions.iter().find(|p| p.id == id && p.active)
    }

    /// Price of a plan in the catalog currency
    pub fn plan_price(&self, plan: &SubscriptionPlan) -> Price {
        Price::new(plan.price, self.currency)
    }

    /// Build a priced cart line for a print/size pair
    pub fn cart_line(&self, item_id: &str, size_code: &str, quantity: u32) -> CheckoutResult<CartLine> {
        let print = self
            .print(item_id)
            .ok_or_else(|| CheckoutError::ItemNotFound {
                item_id: item_id.to_string(),
                size_code: size_code.to_string(),
            })?;
        let size = print
            .sizes
            .iter()
            .find(|s| s.code == size_code)
            .ok_or_else(|| CheckoutError::ItemNotFound {
                item_id: item_id.to_string(),
                size_code: size_code.to_string(),
            })?;

        Ok(CartLine {
            item_id: print.id.clone(),
            name: print.name.clone(),
            size_code: size.code.clone(),
            unit_price: Price::new(size.price, self.currency),
            quantity,
            license_tag: print.license.clone(),
        })
    }

    /// Resolve a delivery region label into a priced selection
    pub fn delivery_selection(&self, region: &str) -> CheckoutResult<DeliverySelection> {
        let zone = self
            .delivery_zones
            .iter()
            .find(|z| z.region.eq_ignore_ascii_case(region))
            .ok_or_else(|| CheckoutError::UnknownRegion {
                region: region.to_string(),
            })?;

        Ok(DeliverySelection {
            region_label: zone.region.clone(),
            base_price: Price::new(zone.base, self.currency),
            per_additional_item_price: Price::new(zone.per_additional_item, self.currency),
        })
    }
}
