//! Port abstraction for outbound notification delivery.

use async_trait::async_trait;

use crate::domain::notifications::EmailMessage;

use super::define_port_error;

define_port_error! {
    /// Delivery errors raised by notifier adapters.
    pub enum NotifierError {
        /// The adapter is not configured well enough to attempt delivery.
        Configuration { message: String } =>
            "notifier configuration incomplete: {message}",
        /// Delivery was attempted and failed.
        Delivery { message: String } =>
            "notification delivery failed: {message}",
    }
}

/// Port for sending a rendered message to a recipient.
///
/// Synchronous request paths that promise a notification propagate failures
/// to the caller; the reminder sweep swallows them per appointment and counts
/// the row as skipped instead.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message.
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifierError>;
}
