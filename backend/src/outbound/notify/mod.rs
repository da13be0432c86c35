//! Notifier adapters.
//!
//! Production traffic goes through [`HttpRelayNotifier`], which posts
//! rendered messages to a transactional mail relay over HTTPS. Development
//! and test environments use [`TracingNotifier`] (log-only) or
//! [`RecordingNotifier`] (captures messages for assertions).

mod http_relay;
mod recording;
mod tracing_notifier;

pub use http_relay::{HttpRelayNotifier, HttpRelaySettings};
pub use recording::RecordingNotifier;
pub use tracing_notifier::TracingNotifier;
