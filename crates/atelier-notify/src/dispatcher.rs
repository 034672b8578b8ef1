//! # Notification Dispatcher
//!
//! Delivers a reconstructed order to every configured recipient with
//! bounded retry. Recipients are tracked independently: one failing
//! endpoint never blocks another, and `dispatch` itself never fails:
//! the caller gets one `NotificationAttempt` per recipient and always
//! acknowledges the webhook regardless.

use crate::NotifyError;
use async_trait::async_trait;
use atelier_core::{NotificationAttempt, Order};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A delivery target for completed orders
#[async_trait]
pub trait NotificationRecipient: Send + Sync {
    /// Stable recipient kind used in attempt reports and logs
    fn kind(&self) -> &'static str;

    /// Deliver one order. A non-2xx acknowledgment or transport failure
    /// returns an error and will be retried by the dispatcher.
    async fn deliver(&self, order: &Order) -> Result<(), NotifyError>;
}

/// Exponential backoff: `base × 2^attempt`
fn retry_delay(base: Duration, attempt: u32) -> Duration {
    base * 2u32.saturating_pow(attempt)
}

/// Dispatches orders to registered recipients with bounded retry
pub struct Dispatcher {
    recipients: Vec<Arc<dyn NotificationRecipient>>,
    max_attempts: u32,
    base_delay: Duration,
}

impl Dispatcher {
    /// Dispatcher with the production retry policy: 3 attempts,
    /// 1s/2s backoff between them.
    pub fn new() -> Self {
        Self {
            recipients: Vec::new(),
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Register a recipient
    pub fn register(&mut self, recipient: Arc<dyn NotificationRecipient>) {
        self.recipients.push(recipient);
    }

    /// Builder: register a recipient
    pub fn with_recipient(mut self, recipient: Arc<dyn NotificationRecipient>) -> Self {
        self.register(recipient);
        self
    }

    /// Builder: override the retry policy (tests use millisecond delays)
    pub fn with_retry_policy(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_delay = base_delay;
        self
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    /// Deliver `order` to every recipient, independently.
    ///
    /// Returns one attempt record per recipient, in registration order.
    /// Never fails: exhausted retries become a failed attempt carrying
    /// the last error string.
    pub async fn dispatch(&self, order: &Order) -> Vec<NotificationAttempt> {
        let mut attempts = Vec::with_capacity(self.recipients.len());
        for recipient in &self.recipients {
            attempts.push(self.deliver_with_retry(recipient.as_ref(), order).await);
        }
        attempts
    }

    async fn deliver_with_retry(
        &self,
        recipient: &dyn NotificationRecipient,
        order: &Order,
    ) -> NotificationAttempt {
        let mut last_error = String::new();

        for attempt in 0..self.max_attempts {
            match recipient.deliver(order).await {
                Ok(()) => {
                    info!(
                        order_id = %order.order_id,
                        recipient = recipient.kind(),
                        attempt = attempt + 1,
                        "notification delivered"
                    );
                    return NotificationAttempt::success(recipient.kind());
                }
                Err(e) => {
                    warn!(
                        order_id = %order.order_id,
                        recipient = recipient.kind(),
                        attempt = attempt + 1,
                        error = %e,
                        "notification delivery failed"
                    );
                    last_error = e.to_string();
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(retry_delay(self.base_delay, attempt)).await;
                    }
                }
            }
        }

        NotificationAttempt::failure(recipient.kind(), last_error)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
