//! # Pricing Engine
//!
//! Pure cart and delivery pricing. No I/O; all arithmetic happens in
//! smallest currency units so the result is independent of line order.

use crate::cart::{CartLine, DeliverySelection};
use crate::error::{CheckoutError, CheckoutResult};
use crate::money::Price;

/// Sum of `unit_price × quantity` over all lines.
///
/// Rejects malformed input before any external call: a quantity below 1
/// or a negative unit price fails with `InvalidLine`.
pub fn price_cart(lines: &[CartLine]) -> CheckoutResult<Price> {
    let currency = lines
        .first()
        .map(|l| l.unit_price.currency)
        .unwrap_or_default();

    let mut total: i64 = 0;
    for line in lines {
        if line.quantity < 1 {
            return Err(CheckoutError::InvalidLine {
                message: format!("{} ({}): quantity must be at least 1", line.name, line.size_code),
            });
        }
        if line.unit_price.amount < 0 {
            return Err(CheckoutError::InvalidLine {
                message: format!("{} ({}): negative unit price", line.name, line.size_code),
            });
        }
        total += line.unit_price.amount * line.quantity as i64;
    }

    Ok(Price::from_cents(total, currency))
}

/// Delivery cost: `base + per_additional × max(0, item_count − 1)`.
/// An empty cart ships nothing and costs nothing.
pub fn price_delivery(selection: &DeliverySelection, total_item_count: u32) -> Price {
    if total_item_count == 0 {
        return Price::zero(selection.base_price.currency);
    }
    let additional = (total_item_count - 1) as i64;
    Price::from_cents(
        selection.base_price.amount + selection.per_additional_item_price.amount * additional,
        selection.base_price.currency,
    )
}

/// Grand total. Both inputs are already in smallest units, so the sum
/// needs no further rounding.
pub fn price_order(subtotal: Price, delivery_cost: Price) -> Price {
    Price::from_cents(subtotal.amount + delivery_cost.amount, subtotal.currency)
}
