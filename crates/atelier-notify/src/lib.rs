//! # atelier-notify
//!
//! At-least-once delivery of completed orders to external recipients.
//!
//! There is no persisted order store, so a completed payment exists only
//! as long as its webhook handling. This crate is what turns it into
//! something the operator and the record keeper actually see. Each
//! recipient is attempted independently with bounded retry, and the
//! dispatcher reports per-recipient outcomes instead of failing.

pub mod dispatcher;
pub mod recipients;

use thiserror::Error;

/// A single delivery attempt failure
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("request failed: {0}")]
    Transport(String),

    /// The endpoint answered with a non-2xx status
    #[error("endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::Transport(e.to_string())
    }
}

// Re-exports
pub use dispatcher::{Dispatcher, NotificationRecipient};
pub use recipients::{OperatorRecipient, OrderLogRecipient};
