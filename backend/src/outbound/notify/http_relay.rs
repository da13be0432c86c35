//! HTTP mail-relay notifier adapter.
//!
//! Posts one JSON document per message to a transactional email relay. The
//! relay owns SMTP mechanics; this adapter only reports configuration gaps
//! and non-success responses as [`NotifierError`] variants.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::notifications::EmailMessage;
use crate::domain::ports::{Notifier, NotifierError};

/// Connection settings for the relay.
#[derive(Debug, Clone)]
pub struct HttpRelaySettings {
    /// Relay endpoint accepting POSTed messages.
    pub endpoint: String,
    /// Sender address attached to every message.
    pub from_address: String,
    /// Optional bearer token for the relay.
    pub api_token: Option<String>,
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

/// Notifier that delivers through an HTTP mail relay.
pub struct HttpRelayNotifier {
    client: reqwest::Client,
    settings: HttpRelaySettings,
}

impl HttpRelayNotifier {
    /// Build the adapter with a fresh HTTP client.
    pub fn new(settings: HttpRelaySettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }
}

#[async_trait]
impl Notifier for HttpRelayNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifierError> {
        if self.settings.endpoint.trim().is_empty() {
            return Err(NotifierError::configuration("relay endpoint is not set"));
        }

        let payload = RelayPayload {
            from: &self.settings.from_address,
            to: &message.to,
            subject: &message.subject,
            html: &message.html_body,
            text: message.text_body.as_deref(),
        };
        let mut request = self.client.post(&self.settings.endpoint).json(&payload);
        if let Some(token) = &self.settings.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|error| NotifierError::delivery(error.to_string()))?;
        if !response.status().is_success() {
            return Err(NotifierError::delivery(format!(
                "relay answered {}",
                response.status()
            )));
        }
        tracing::info!(to = %message.to, subject = %message.subject, "email relayed");
        Ok(())
    }
}
