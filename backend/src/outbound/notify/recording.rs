//! Message-capturing notifier for tests.

use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::domain::notifications::EmailMessage;
use crate::domain::ports::{Notifier, NotifierError};

/// Notifier that stores every message for later inspection.
///
/// Flip [`RecordingNotifier::set_failing`] to make subsequent sends fail,
/// which is how tests exercise the "notifier down" paths.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    /// Notifier that accepts every message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifier that rejects every message.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.failing.store(true, Ordering::Relaxed);
        notifier
    }

    /// Toggle failure behaviour for subsequent sends.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Every message accepted so far.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Subject lines of every message accepted so far.
    pub fn subjects(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|message| message.subject)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifierError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(NotifierError::delivery("relay refused the message"));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}
