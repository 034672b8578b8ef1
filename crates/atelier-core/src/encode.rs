//! # Order Metadata Encoding
//!
//! Flattens a cart and shipping address into the key/value metadata bag of
//! a checkout session, and inverts that mapping at webhook time. Metadata
//! is the only durable record of an order, so encoding is lossy but total:
//! the provider caps values around 500 characters and 50 entries, the
//! encoder truncates only at item boundaries, and `decode` accepts any
//! string input without ever failing.

use crate::cart::{Address, Cart, CartLine};
use crate::money::{Currency, Price};
use crate::order::OrderLine;
use std::collections::HashMap;

/// Metadata keys. Short and stable: they are the wire format.
pub mod keys {
    pub const FIRST_NAME: &str = "first_name";
    pub const LAST_NAME: &str = "last_name";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const STREET: &str = "street";
    pub const CITY: &str = "city";
    pub const POSTAL_CODE: &str = "postal_code";
    pub const COUNTRY: &str = "country";
    pub const DELIVERY: &str = "delivery";
    pub const CART_LINES: &str = "cart_lines";
    pub const CATEGORY: &str = "category";
    pub const PLAN: &str = "plan";
}

/// Separates packed cart items
const ITEM_SEP: char = ';';
/// Separates fields within one packed item
const FIELD_SEP: char = '|';
/// Encodes "no license" so it can't be confused with a truncated field
const EMPTY_LICENSE: &str = "N/A";
/// Fields per packed item: name|size|quantity|price|license
const FIELDS_PER_ITEM: usize = 5;

/// Byte budget for the packed cart-lines value. The provider truncates
/// longer values mid-string; staying under the cap keeps every retained
/// item parseable.
pub const CART_FIELD_MAX_BYTES: usize = 500;
/// Provider cap on metadata entry count
pub const MAX_METADATA_ENTRIES: usize = 50;

/// Per-field character budgets for address values
const NAME_MAX_CHARS: usize = 50;
const EMAIL_MAX_CHARS: usize = 100;
const PHONE_MAX_CHARS: usize = 30;
const STREET_MAX_CHARS: usize = 100;
const CITY_MAX_CHARS: usize = 50;
const POSTAL_MAX_CHARS: usize = 20;
const COUNTRY_MAX_CHARS: usize = 8;
const DELIVERY_MAX_CHARS: usize = 50;

/// Result of decoding session metadata. Every field is best-effort:
/// a garbage input yields an empty but structurally valid value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedCheckout {
    pub customer: DecodedCustomer,
    pub lines: Vec<OrderLine>,
    pub delivery_label: Option<String>,
}

/// Address fields recovered from metadata; each independently optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedCustomer {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country_code: Option<String>,
}

impl DecodedCustomer {
    /// Materialize into an `Address`, substituting empty strings for
    /// fields lost to truncation. A usable order beats a lost callback.
    pub fn into_address(self) -> Address {
        Address {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone,
            street: self.street.unwrap_or_default(),
            city: self.city.unwrap_or_default(),
            postal_code: self.postal_code.unwrap_or_default(),
            country_code: self.country_code.unwrap_or_default(),
        }
    }
}

/// Flatten a cart and address into provider metadata.
///
/// Address fields get individually named keys, each truncated to its
/// character budget without splitting a multi-byte character. Cart lines
/// are packed into a single delimited value capped at
/// [`CART_FIELD_MAX_BYTES`]; items that don't fit are dropped whole, from
/// the tail, and are lost for good.
pub fn encode(cart: &Cart, address: &Address, delivery_label: &str) -> HashMap<String, String> {
    let mut metadata = HashMap::new();

    metadata.insert(
        keys::FIRST_NAME.to_string(),
        truncate_chars(&address.first_name, NAME_MAX_CHARS),
    );
    metadata.insert(
        keys::LAST_NAME.to_string(),
        truncate_chars(&address.last_name, NAME_MAX_CHARS),
    );
    metadata.insert(
        keys::EMAIL.to_string(),
        truncate_chars(&address.email, EMAIL_MAX_CHARS),
    );
    if let Some(phone) = &address.phone {
        metadata.insert(keys::PHONE.to_string(), truncate_chars(phone, PHONE_MAX_CHARS));
    }
    metadata.insert(
        keys::STREET.to_string(),
        truncate_chars(&address.street, STREET_MAX_CHARS),
    );
    metadata.insert(
        keys::CITY.to_string(),
        truncate_chars(&address.city, CITY_MAX_CHARS),
    );
    metadata.insert(
        keys::POSTAL_CODE.to_string(),
        truncate_chars(&address.postal_code, POSTAL_MAX_CHARS),
    );
    metadata.insert(
        keys::COUNTRY.to_string(),
        truncate_chars(&address.country_code, COUNTRY_MAX_CHARS),
    );
    metadata.insert(
        keys::DELIVERY.to_string(),
        truncate_chars(delivery_label, DELIVERY_MAX_CHARS),
    );
    metadata.insert(keys::CART_LINES.to_string(), pack_lines(&cart.lines));

    debug_assert!(metadata.len() <= MAX_METADATA_ENTRIES);
    metadata
}

/// Rebuild a partial checkout from metadata. Total over any input:
/// missing keys, garbage values, and truncated packed items degrade to
/// defaults instead of failing.
pub fn decode(metadata: &HashMap<String, String>) -> DecodedCheckout {
    let get = |key: &str| metadata.get(key).filter(|v| !v.is_empty()).cloned();

    DecodedCheckout {
        customer: DecodedCustomer {
            first_name: get(keys::FIRST_NAME),
            last_name: get(keys::LAST_NAME),
            email: get(keys::EMAIL),
            phone: get(keys::PHONE),
            street: get(keys::STREET),
            city: get(keys::CITY),
            postal_code: get(keys::POSTAL_CODE),
            country_code: get(keys::COUNTRY),
        },
        lines: metadata
            .get(keys::CART_LINES)
            .map(|packed| unpack_lines(packed))
            .unwrap_or_default(),
        delivery_label: get(keys::DELIVERY),
    }
}

/// Truncate to a character budget, never splitting a multi-byte character
fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Delimiters inside field values would corrupt the packed schema
fn sanitize_field(s: &str) -> String {
    s.replace([ITEM_SEP, FIELD_SEP], " ")
}

/// Render a cent amount as a 2-decimal string ("780" -> "7.80")
fn format_cents(amount: i64) -> String {
    format!("{}.{:02}", amount / 100, (amount % 100).abs())
}

/// Parse a 2-decimal price string back to cents; anything unparseable is 0
fn parse_cents(s: &str) -> i64 {
    let mut parts = s.splitn(2, '.');
    let whole: i64 = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
    let frac_str: String = parts
        .next()
        .unwrap_or("")
        .chars()
        .take(2)
        .filter(|c| c.is_ascii_digit())
        .collect();
    let frac: i64 = match frac_str.len() {
        2 => frac_str.parse().unwrap_or(0),
        1 => frac_str.parse::<i64>().unwrap_or(0) * 10,
        _ => 0,
    };
    whole * 100 + frac
}

/// Pack cart lines into one delimited value under the byte budget.
/// Truncation happens only at item boundaries, so every retained item
/// stays fully parseable; dropped items are a deterministic tail.
fn pack_lines(lines: &[CartLine]) -> String {
    let mut packed = String::new();
    for line in lines {
        let license = match line.license_tag.as_deref() {
            Some(tag) if !tag.is_empty() => sanitize_field(tag),
            _ => EMPTY_LICENSE.to_string(),
        };
        let item = format!(
            "{name}{f}{size}{f}{qty}{f}{price}{f}{license}",
            name = sanitize_field(&line.name),
            size = sanitize_field(&line.size_code),
            qty = line.quantity,
            price = format_cents(line.unit_price.amount),
            license = license,
            f = FIELD_SEP,
        );

        let needed = if packed.is_empty() {
            item.len()
        } else {
            packed.len() + 1 + item.len()
        };
        if needed > CART_FIELD_MAX_BYTES {
            break;
        }
        if !packed.is_empty() {
            packed.push(ITEM_SEP);
        }
        packed.push_str(&item);
    }
    packed
}

/// Unpack the delimited cart-lines value. Items with a malformed field
/// count are dropped; empty numeric fields default to quantity 1 and
/// price 0 so one mangled field never loses the whole callback.
fn unpack_lines(packed: &str) -> Vec<OrderLine> {
    packed
        .split(ITEM_SEP)
        .filter_map(|item| {
            let fields: Vec<&str> = item.split(FIELD_SEP).collect();
            if fields.len() != FIELDS_PER_ITEM {
                return None;
            }
            let name = fields[0].trim();
            if name.is_empty() {
                return None;
            }
            let quantity = fields[2].trim().parse::<u32>().ok().unwrap_or(1).max(1);
            let price = parse_cents(fields[3]);
            let license_tag = match fields[4].trim() {
                "" | EMPTY_LICENSE => None,
                tag => Some(tag.to_string()),
            };
            Some(OrderLine {
                name: name.to_string(),
                size_code: fields[1].trim().to_string(),
                unit_price: Price::from_cents(price, Currency::default()),
                quantity,
                license_tag,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            first_name: "Ana".into(),
            last_name: "Martin".into(),
            email: "ana@example.com".into(),
            phone: Some("+33 6 12 34 56 78".into()),
            street: "12 rue des Lilas".into(),
            city: "Lyon".into(),
            postal_code: "69003".into(),
            country_code: "FR".into(),
        }
    }

    fn cart_line(name: &str, size: &str, cents: i64, qty: u32, license: Option<&str>) -> CartLine {
        CartLine {
            item_id: name.to_lowercase(),
            name: name.to_string(),
            size_code: size.to_string(),
            unit_price: Price::from_cents(cents, Currency::EUR),
            quantity: qty,
            license_tag: license.map(String::from),
        }
    }

    fn as_order_line(line: &CartLine) -> OrderLine {
        OrderLine {
            name: line.name.clone(),
            size_code: line.size_code.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            license_tag: line.license_tag.clone(),
        }
    }

    #[test]
    fn test_round_trip_under_budget() {
        let mut cart = Cart::new();
        cart.add_line(cart_line("Shanks", "A4", 780, 2, None));
        cart.add_line(cart_line("Ace", "A3", 1250, 1, Some("personal")));

        let metadata = encode(&cart, &address(), "France");
        let decoded = decode(&metadata);

        let expected: Vec<OrderLine> = cart.lines.iter().map(as_order_line).collect();
        assert_eq!(decoded.lines, expected);
        assert_eq!(decoded.customer.email.as_deref(), Some("ana@example.com"));
        assert_eq!(decoded.customer.street.as_deref(), Some("12 rue des Lilas"));
        assert_eq!(decoded.delivery_label.as_deref(), Some("France"));
        assert!(metadata.len() <= MAX_METADATA_ENTRIES);
    }

    #[test]
    fn test_truncation_drops_whole_trailing_items() {
        let mut cart = Cart::new();
        for i in 0..40 {
            cart.add_line(cart_line(
                &format!("A very long print title number {i}"),
                "A3",
                1250,
                1,
                None,
            ));
        }

        let metadata = encode(&cart, &address(), "France");
        let packed = &metadata[keys::CART_LINES];
        assert!(packed.len() <= CART_FIELD_MAX_BYTES);

        let decoded = decode(&metadata);
        assert!(!decoded.lines.is_empty());
        assert!(decoded.lines.len() < cart.lines.len());

        // retained items are a strict prefix of the original, uncorrupted
        let expected: Vec<OrderLine> = cart.lines[..decoded.lines.len()]
            .iter()
            .map(as_order_line)
            .collect();
        assert_eq!(decoded.lines, expected);
    }

    #[test]
    fn test_decode_is_total_over_garbage() {
        let inputs = [
            "",
            ";;;;",
            "|||||||",
            "no delimiters at all",
            "name|A4",
            "name|A4|x|y|z;trailing|junk",
            "a|b|c|d|e|f|g",
            "\u{0}\u{1}\u{fffd}",
        ];
        for input in inputs {
            let mut metadata = HashMap::new();
            metadata.insert(keys::CART_LINES.to_string(), input.to_string());
            // must not panic; every produced line is structurally valid
            let decoded = decode(&metadata);
            for line in &decoded.lines {
                assert!(!line.name.is_empty());
                assert!(line.quantity >= 1);
            }
        }
        // empty metadata decodes to an empty but valid result
        let decoded = decode(&HashMap::new());
        assert!(decoded.lines.is_empty());
        assert!(decoded.customer.email.is_none());
    }

    #[test]
    fn test_numeric_fields_default_instead_of_failing() {
        let mut metadata = HashMap::new();
        metadata.insert(
            keys::CART_LINES.to_string(),
            "Shanks|A4||garbage|N/A".to_string(),
        );
        let decoded = decode(&metadata);
        assert_eq!(decoded.lines.len(), 1);
        assert_eq!(decoded.lines[0].quantity, 1);
        assert_eq!(decoded.lines[0].unit_price.amount, 0);
        assert_eq!(decoded.lines[0].license_tag, None);
    }

    #[test]
    fn test_empty_license_sentinel() {
        let mut cart = Cart::new();
        cart.add_line(cart_line("Shanks", "A4", 780, 1, Some("")));
        let metadata = encode(&cart, &address(), "France");
        assert!(metadata[keys::CART_LINES].ends_with("N/A"));
        assert_eq!(decode(&metadata).lines[0].license_tag, None);
    }

    #[test]
    fn test_delimiters_in_names_are_sanitized() {
        let mut cart = Cart::new();
        cart.add_line(cart_line("Shanks;the|Red", "A4", 780, 1, None));
        let metadata = encode(&cart, &address(), "France");
        let decoded = decode(&metadata);
        assert_eq!(decoded.lines.len(), 1);
        assert_eq!(decoded.lines[0].name, "Shanks the Red");
    }

    #[test]
    fn test_address_truncation_respects_char_boundaries() {
        let mut addr = address();
        addr.street = "é".repeat(200);
        let metadata = encode(&Cart::new(), &addr, "France");
        let street = &metadata[keys::STREET];
        assert_eq!(street.chars().count(), 100);
        assert_eq!(street.chars().last(), Some('é'));
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("7.80"), 780);
        assert_eq!(parse_cents("7.8"), 780);
        assert_eq!(parse_cents("7"), 700);
        assert_eq!(parse_cents("0.05"), 5);
        assert_eq!(parse_cents(""), 0);
        assert_eq!(parse_cents("abc"), 0);
    }
}
