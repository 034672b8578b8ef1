//! # Money Types
//!
//! Prices are stored in the smallest currency unit (cents) to keep cart
//! arithmetic exact. Decimal conversion rounds to the nearest cent exactly
//! once, at `Price` construction, so rounding error never compounds across
//! lines. Catalog prices carry two decimals, so ties never arise in practice.

use serde::{Deserialize, Serialize};

/// Supported currencies (ISO 4217)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    EUR,
    USD,
    GBP,
}

impl Currency {
    /// Returns the ISO 4217 currency code
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::EUR => "eur",
            Currency::USD => "usd",
            Currency::GBP => "gbp",
        }
    }

    /// Parse a lowercase ISO 4217 code, defaulting to EUR for anything else
    pub fn from_code(code: &str) -> Self {
        match code.to_lowercase().as_str() {
            "usd" => Currency::USD,
            "gbp" => Currency::GBP,
            _ => Currency::EUR,
        }
    }

    /// Convert a decimal amount to the smallest currency unit (cents).
    /// Rounds to the nearest cent; amounts are never negative in this shop.
    pub fn to_smallest_unit(&self, amount: f64) -> i64 {
        (amount * 100.0).round() as i64
    }

    /// Convert from smallest unit back to decimal
    pub fn from_smallest_unit(&self, amount: i64) -> f64 {
        amount as f64 / 100.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::EUR
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str().to_uppercase())
    }
}

/// Price with amount in smallest currency unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in smallest currency unit (cents)
    pub amount: i64,
    /// Currency
    pub currency: Currency,
}

impl Price {
    /// Create a new price from a decimal amount
    pub fn new(amount: f64, currency: Currency) -> Self {
        Self {
            amount: currency.to_smallest_unit(amount),
            currency,
        }
    }

    /// Create a price from smallest unit (cents)
    pub fn from_cents(amount: i64, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// A zero price
    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: 0,
            currency,
        }
    }

    /// Get the decimal amount
    pub fn as_decimal(&self) -> f64 {
        self.currency.from_smallest_unit(self.amount)
    }

    /// Whether this price is zero
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    /// Format for display (e.g., "€10.00")
    pub fn display(&self) -> String {
        let symbol = match self.currency {
            Currency::EUR => "€",
            Currency::USD => "$",
            Currency::GBP => "£",
        };
        format!("{}{:.2}", symbol, self.as_decimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_conversion() {
        let eur = Currency::EUR;
        assert_eq!(eur.to_smallest_unit(7.80), 780);
        assert_eq!(eur.to_smallest_unit(2.50), 250);
        assert_eq!(eur.from_smallest_unit(1099), 10.99);
    }

    #[test]
    fn test_rounding_to_nearest_cent() {
        assert_eq!(Currency::EUR.to_smallest_unit(1.004), 100);
        assert_eq!(Currency::EUR.to_smallest_unit(1.006), 101);
        // two-decimal catalog prices convert exactly
        assert_eq!(Currency::EUR.to_smallest_unit(7.80), 780);
        assert_eq!(Currency::EUR.to_smallest_unit(0.01), 1);
    }

    #[test]
    fn test_currency_from_code() {
        assert_eq!(Currency::from_code("usd"), Currency::USD);
        assert_eq!(Currency::from_code("EUR"), Currency::EUR);
        assert_eq!(Currency::from_code("xyz"), Currency::EUR);
    }

    #[test]
    fn test_price_display() {
        let price = Price::new(29.99, Currency::EUR);
        assert_eq!(price.display(), "€29.99");

        let price_gbp = Price::new(19.99, Currency::GBP);
        assert_eq!(price_gbp.display(), "£19.99");
    }
}
