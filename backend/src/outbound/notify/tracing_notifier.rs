//! Log-only notifier for development environments.

use async_trait::async_trait;

use crate::domain::notifications::EmailMessage;
use crate::domain::ports::{Notifier, NotifierError};

/// Notifier that logs a preview instead of delivering anything.
///
/// The default when no relay endpoint is configured, so a fresh checkout can
/// exercise every notification path without sending real mail.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifierError> {
        let source = message.text_body.as_deref().unwrap_or(&message.html_body);
        let preview: String = source.split_whitespace().collect::<Vec<_>>().join(" ");
        let preview: String = preview.chars().take(200).collect();
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            preview = %preview,
            "email suppressed (dev mode)"
        );
        Ok(())
    }
}
