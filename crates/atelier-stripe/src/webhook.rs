//! # Webhook Verification
//!
//! Authenticates the asynchronous payment-completion callback. The
//! signature check is a hard gate: nothing downstream runs without it.
//! Event types other than session completion are acknowledged and
//! ignored, never failed, so the provider has no reason to re-deliver.

use crate::session::CheckoutGateway;
use atelier_core::{CheckoutError, CheckoutResult, Currency};
use chrono::Utc;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Maximum accepted age of a signed payload
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// A verified, typed webhook event
#[derive(Debug, Clone)]
pub enum WebhookEvent {
    /// A checkout session finished with a captured payment
    CheckoutCompleted(CompletedSession),
    /// Authentic but irrelevant event; acknowledge and move on
    Ignored(String),
}

/// The completed session payload the pipeline acts on
#[derive(Debug, Clone)]
pub struct CompletedSession {
    /// Provider session id (the order's natural idempotency key)
    pub session_id: String,
    pub payment_intent_id: Option<String>,
    pub customer_email: Option<String>,
    /// Amount actually captured, in smallest currency units.
    /// Authoritative for money; metadata is display only.
    pub amount_total: i64,
    pub currency: Currency,
    pub payment_status: String,
    /// Session metadata holding the encoded order
    pub metadata: HashMap<String, String>,
}

/// Verify a webhook signature and parse the event.
///
/// The header carries `t=<unix>,v1=<hex hmac>` pairs; the expected
/// signature is HMAC-SHA256 over `"{t}.{body}"` keyed with the shared
/// secret, compared in constant time. Any failure is a
/// `SignatureMismatch`: a hard rejection with no partial trust.
pub fn verify(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
) -> CheckoutResult<WebhookEvent> {
    let sig_parts = parse_signature_header(signature_header)?;

    let now = Utc::now().timestamp();
    if (now - sig_parts.timestamp).abs() > TIMESTAMP_TOLERANCE_SECS {
        return Err(CheckoutError::SignatureMismatch(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let signed_payload = format!(
        "{}.{}",
        sig_parts.timestamp,
        String::from_utf8_lossy(payload)
    );
    let expected = compute_hmac_sha256(secret, &signed_payload);

    let valid = sig_parts
        .signatures
        .iter()
        .any(|sig| constant_time_compare(sig, &expected));

    if !valid {
        return Err(CheckoutError::SignatureMismatch(
            "signature mismatch".to_string(),
        ));
    }

    parse_event(payload)
}

impl CheckoutGateway {
    /// Verify an inbound webhook against this gateway's signing secret
    pub fn verify_webhook(&self, payload: &[u8], signature_header: &str) -> CheckoutResult<WebhookEvent> {
        verify(payload, signature_header, &self.config().webhook_secret)
    }
}

fn parse_event(payload: &[u8]) -> CheckoutResult<WebhookEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(payload)
        .map_err(|e| CheckoutError::WebhookParse(format!("event body: {e}")))?;

    debug!("Verified webhook: type={}", event.event_type);

    if event.event_type != "checkout.session.completed" {
        return Ok(WebhookEvent::Ignored(event.event_type));
    }

    let obj = &event.data.object;

    let session_id = obj
        .get("id")
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| CheckoutError::WebhookParse("missing session id".to_string()))?;

    let payment_intent_id = obj
        .get("payment_intent")
        .and_then(|v| v.as_str())
        .map(String::from);

    let customer_email = obj
        .get("customer_details")
        .and_then(|cd| cd.get("email"))
        .and_then(|v| v.as_str())
        .map(String::from);

    let amount_total = obj.get("amount_total").and_then(|v| v.as_i64()).unwrap_or(0);

    let currency = Currency::from_code(
        obj.get("currency").and_then(|v| v.as_str()).unwrap_or(""),
    );

    let payment_status = obj
        .get("payment_status")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    let metadata = obj
        .get("metadata")
        .and_then(|m| m.as_object())
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    Ok(WebhookEvent::CheckoutCompleted(CompletedSession {
        session_id,
        payment_intent_id,
        customer_email,
        amount_total,
        currency,
        payment_status,
        metadata,
    }))
}

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: serde_json::Map<String, serde_json::Value>,
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> CheckoutResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let kv: Vec<&str> = part.split('=').collect();
        if kv.len() != 2 {
            continue;
        }
        match kv[0] {
            "t" => {
                timestamp = kv[1].parse().ok();
            }
            "v1" => {
                signatures.push(kv[1].to_string());
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        CheckoutError::SignatureMismatch("missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(CheckoutError::SignatureMismatch(
            "no v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn compute_hmac_sha256(secret: &str, message: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}
