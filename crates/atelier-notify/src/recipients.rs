//! # HTTP Recipients
//!
//! The two production recipients: the operator gets a human-readable
//! order report, the record-keeping endpoint gets the structured order
//! with its category discriminator.

use crate::dispatcher::NotificationRecipient;
use crate::NotifyError;
use async_trait::async_trait;
use atelier_core::Order;
use reqwest::Client;
use std::time::Duration;

fn http_client() -> Result<Client, NotifyError> {
    Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .map_err(NotifyError::from)
}

async fn check_response(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Sends the operator a plain-text order report
pub struct OperatorRecipient {
    client: Client,
    url: String,
}

impl OperatorRecipient {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            client: http_client()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationRecipient for OperatorRecipient {
    fn kind(&self) -> &'static str {
        "operator"
    }

    async fn deliver(&self, order: &Order) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(order.report())
            .send()
            .await?;
        check_response(response).await
    }
}

/// Posts the structured order to the record-keeping endpoint
pub struct OrderLogRecipient {
    client: Client,
    url: String,
}

impl OrderLogRecipient {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            client: http_client()?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl NotificationRecipient for OrderLogRecipient {
    fn kind(&self) -> &'static str {
        "order_log"
    }

    async fn deliver(&self, order: &Order) -> Result<(), NotifyError> {
        let payload = serde_json::json!({
            "event_type": "order_completed",
            "category": order.category.as_str(),
            "order": order,
        });
        let response = self.client.post(&self.url).json(&payload).send().await?;
        check_response(response).await
    }
}
