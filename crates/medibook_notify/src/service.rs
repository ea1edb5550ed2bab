use medibook_common::services::{
    BookingNotification, BoxFuture, NotificationDispatcher, NotificationResult,
};
use medibook_common::{create_client, http::client::DEFAULT_TIMEOUT_SECS};
use medibook_config::NotificationConfig;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Notification-specific error types.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Error occurred while talking to the relay
    #[error("Notification request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// The relay answered with a non-success status
    #[error("Notification relay returned an error: {message} (Status: {status_code})")]
    ApiError { status_code: u16, message: String },

    /// Missing or incomplete notification configuration
    #[error("Notification configuration missing or incomplete: {0}")]
    ConfigError(String),
}

/// Dispatcher that only records the message in the log
#[derive(Debug, Clone, Default)]
pub struct TracingDispatcher;

impl NotificationDispatcher for TracingDispatcher {
    type Error = NotifyError;

    fn send(
        &self,
        receiver: &str,
        context: BookingNotification,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        let receiver = receiver.to_string();
        Box::pin(async move {
            info!(
                booking_id = context.booking_id,
                restored = context.restored,
                "Confirmation for {} ({}): {}",
                receiver,
                context.patient_name,
                context.redirect_link
            );
            Ok(NotificationResult {
                id: format!("log-{}", context.booking_id),
                status: "logged".to_string(),
            })
        })
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    to: &'a str,
    from: Option<&'a str>,
    #[serde(flatten)]
    notification: &'a BookingNotification,
}

/// Dispatcher that posts each message as JSON to a mail relay
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    client: Client,
    url: String,
    sender: Option<String>,
    api_key: Option<String>,
}

impl WebhookDispatcher {
    /// Build from the `notifications` config section; `webhook_url` is required.
    pub fn from_config(config: &NotificationConfig) -> Result<Self, NotifyError> {
        let url = config
            .webhook_url
            .clone()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| NotifyError::ConfigError("webhook_url is not set".to_string()))?;
        let client = create_client(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS), false)?;

        Ok(Self {
            client,
            url,
            sender: config.sender.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        })
    }
}

impl NotificationDispatcher for WebhookDispatcher {
    type Error = NotifyError;

    fn send(
        &self,
        receiver: &str,
        context: BookingNotification,
    ) -> BoxFuture<'_, NotificationResult, Self::Error> {
        let receiver = receiver.to_string();
        Box::pin(async move {
            debug!(
                "Posting confirmation for booking {} to {}",
                context.booking_id, self.url
            );
            let payload = WebhookPayload {
                to: &receiver,
                from: self.sender.as_deref(),
                notification: &context,
            };

            let mut request = self.client.post(&self.url).json(&payload);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }
            let response = request.send().await?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                warn!(
                    "Relay rejected confirmation for booking {}: {} {}",
                    context.booking_id, status, message
                );
                return Err(NotifyError::ApiError {
                    status_code: status.as_u16(),
                    message,
                });
            }

            // Relays that answer with an id get it echoed back; others get a local one.
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let id = body
                .get("id")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            info!("Confirmation for booking {} accepted by relay", context.booking_id);
            Ok(NotificationResult {
                id,
                status: status.as_u16().to_string(),
            })
        })
    }
}
