/// Notification transports
///
/// - [`LogTransport`]: writes each event to the tracing log (default)
/// - [`WebhookTransport`]: POSTs each event as JSON, optionally signed with
///   HMAC-SHA256 in the `X-Taskdeck-Signature` header

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::info;

use super::Notification;

/// Signature header sent by [`WebhookTransport`]
pub const SIGNATURE_HEADER: &str = "X-Taskdeck-Signature";

/// Event kind header sent by [`WebhookTransport`]
pub const EVENT_HEADER: &str = "X-Taskdeck-Event";

/// Error type for notification delivery
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Request could not be sent
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Receiver answered with a non-success status
    #[error("Webhook returned status {0}")]
    Status(u16),

    /// Payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Signing key rejected
    #[error("Signing error: {0}")]
    Signing(String),
}

/// Delivers notifications somewhere outside the request path
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Delivers one notification
    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransport;

#[async_trait]
impl NotificationTransport for LogTransport {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            kind = notification.kind.as_str(),
            user_id = notification.user_id,
            payload = %notification.payload,
            "Notification"
        );
        Ok(())
    }
}

/// POSTs notifications to a fixed URL
#[derive(Debug, Clone)]
pub struct WebhookTransport {
    client: reqwest::Client,
    url: String,
    secret: Option<Vec<u8>>,
}

impl WebhookTransport {
    /// Creates a webhook transport
    ///
    /// # Arguments
    ///
    /// * `url` - Receiver endpoint
    /// * `secret` - Optional HMAC key; when set every body is signed
    /// * `timeout` - Per-request timeout
    pub fn new(
        url: impl Into<String>,
        secret: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: url.into(),
            secret: secret.map(|s| s.as_bytes().to_vec()),
        })
    }
}

/// Hex-encoded HMAC-SHA256 of `body` under `secret`
pub fn sign_payload(secret: &[u8], body: &[u8]) -> Result<String, NotifyError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .map_err(|e| NotifyError::Signing(e.to_string()))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[async_trait]
impl NotificationTransport for WebhookTransport {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError> {
        let body = serde_json::to_vec(notification)?;

        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(EVENT_HEADER, notification.kind.as_str());

        if let Some(ref secret) = self.secret {
            request = request.header(SIGNATURE_HEADER, sign_payload(secret, &body)?);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        Ok(())
    }
}
