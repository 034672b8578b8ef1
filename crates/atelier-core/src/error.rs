//! # Checkout Error Types
//!
//! Typed error handling for the atelier-cart checkout pipeline.
//! All checkout operations return `Result<T, CheckoutError>`.

use thiserror::Error;

/// Core error type for all checkout operations
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed cart input, rejected before any external call
    #[error("Invalid cart line: {message}")]
    InvalidLine { message: String },

    /// Print not found in the shop catalog for the requested size
    #[error("Print not found: {item_id} (size {size_code})")]
    ItemNotFound { item_id: String, size_code: String },

    /// Subscription plan not found in the shop catalog
    #[error("Subscription plan not found: {plan_id}")]
    PlanNotFound { plan_id: String },

    /// Delivery region not configured
    #[error("Unknown delivery region: {region}")]
    UnknownRegion { region: String },

    /// Payment provider refused or failed the session creation call.
    /// No order side effects exist yet, safe to retry from scratch.
    #[error("Checkout session creation failed: {0}")]
    SessionCreation(String),

    /// Payment provider API error outside session creation
    #[error("Provider error: {message}")]
    Provider { message: String },

    /// Network/HTTP error communicating with an external endpoint
    #[error("Network error: {0}")]
    Network(String),

    /// Webhook authenticity check failed; hard rejection, no processing
    #[error("Webhook signature verification failed: {0}")]
    SignatureMismatch(String),

    /// Webhook payload parsing error (after a valid signature)
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// Returns true if the failed operation can be retried from scratch
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::Network(_)
                | CheckoutError::Provider { .. }
                | CheckoutError::SessionCreation(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            CheckoutError::Configuration(_) => 500,
            CheckoutError::InvalidLine { .. } => 400,
            CheckoutError::ItemNotFound { .. } => 404,
            CheckoutError::PlanNotFound { .. } => 404,
            CheckoutError::UnknownRegion { .. } => 400,
            CheckoutError::SessionCreation(_) => 502,
            CheckoutError::Provider { .. } => 502,
            CheckoutError::Network(_) => 503,
            CheckoutError::SignatureMismatch(_) => 400,
            CheckoutError::WebhookParse(_) => 400,
            CheckoutError::Serialization(_) => 500,
            CheckoutError::Internal(_) => 500,
        }
    }
}

/// Result type alias for checkout operations
pub type CheckoutResult<T> = Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(CheckoutError::Network("timeout".into()).is_retryable());
        assert!(CheckoutError::SessionCreation("stripe 502".into()).is_retryable());
        assert!(!CheckoutError::InvalidLine {
            message: "quantity 0".into()
        }
        .is_retryable());
        assert!(!CheckoutError::SignatureMismatch("bad v1".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            CheckoutError::InvalidLine {
                message: "test".into()
            }
            .status_code(),
            400
        );
        assert_eq!(
            CheckoutError::ItemNotFound {
                item_id: "x".into(),
                size_code: "A4".into()
            }
            .status_code(),
            404
        );
        assert_eq!(
            CheckoutError::SignatureMismatch("mismatch".into()).status_code(),
            400
        );
        assert_eq!(CheckoutError::Network("down".into()).status_code(), 503);
    }
}
