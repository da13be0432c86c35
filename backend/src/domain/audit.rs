//! Audit trail primitives.
//!
//! Audit entries are append-only: the core records one per significant state
//! transition and never updates or deletes them. Metadata blobs are truncated
//! before they reach a sink so a single noisy payload cannot bloat storage.

use serde_json::{Map, Value};
use uuid::Uuid;

/// Maximum length of any single string value inside audit metadata.
pub const MAX_STRING_LENGTH: usize = 500;

/// Maximum length of the serialized metadata blob.
pub const MAX_JSON_LENGTH: usize = 8000;

/// Request-scoped context captured by the inbound adapter, attached to audit
/// entries for traceability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Client IP address (first `X-Forwarded-For` hop or the peer address).
    pub ip_address: Option<String>,
    /// Client `User-Agent` header.
    pub user_agent: Option<String>,
    /// Request correlation id, when the caller supplied one.
    pub request_id: Option<String>,
}

/// One audit event, ready for a sink.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Tenant the event belongs to.
    pub owner_id: Uuid,
    /// Dot-namespaced action tag, e.g. `appointment.cancel`.
    pub action: String,
    /// Entity kind, e.g. `appointment`.
    pub entity_type: String,
    /// Entity identifier, when the event concerns a single record.
    pub entity_id: Option<Uuid>,
    /// Human-readable summary.
    pub summary: String,
    /// Truncated metadata blob.
    pub metadata: Option<Value>,
    /// Request context, when the event originated from an HTTP call.
    pub context: Option<RequestContext>,
}

impl AuditEvent {
    /// Build an event for one entity; metadata is truncated on attachment.
    pub fn new(
        owner_id: Uuid,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            owner_id,
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: None,
            summary: summary.into(),
            metadata: None,
            context: None,
        }
    }

    /// Attach the subject entity id.
    pub fn with_entity_id(mut self, entity_id: Uuid) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// Attach metadata, applying the truncation caps.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(truncate_metadata(metadata));
        self
    }

    /// Attach request context.
    pub fn with_context(mut self, context: Option<RequestContext>) -> Self {
        self.context = context;
        self
    }
}

/// Cap every string value at [`MAX_STRING_LENGTH`] and the whole serialized
/// blob at [`MAX_JSON_LENGTH`].
///
/// When the blob exceeds the outer cap even after per-value truncation, it is
/// replaced by a marker object carrying a prefix of the serialized form, so
/// the entry stays well-formed JSON rather than a clipped string.
pub fn truncate_metadata(metadata: Value) -> Value {
    let trimmed = truncate_value(metadata);
    let serialized = trimmed.to_string();
    if serialized.len() <= MAX_JSON_LENGTH {
        return trimmed;
    }
    let mut prefix = serialized;
    let mut cut = MAX_JSON_LENGTH - 3;
    while !prefix.is_char_boundary(cut) {
        cut -= 1;
    }
    prefix.truncate(cut);
    prefix.push_str("...");
    let mut marker = Map::new();
    marker.insert("truncated".to_owned(), Value::Bool(true));
    marker.insert("preview".to_owned(), Value::String(prefix));
    Value::Object(marker)
}

fn truncate_value(value: Value) -> Value {
    match value {
        Value::String(text) => Value::String(truncate_string(text)),
        Value::Array(items) => Value::Array(items.into_iter().map(truncate_value).collect()),
        Value::Object(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(key, val)| (key, truncate_value(val)))
                .collect(),
        ),
        other => other,
    }
}

fn truncate_string(text: String) -> String {
    if text.len() <= MAX_STRING_LENGTH {
        return text;
    }
    let mut cut = MAX_STRING_LENGTH - 3;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut truncated = text;
    truncated.truncate(cut);
    truncated.push_str("...");
    truncated
}
