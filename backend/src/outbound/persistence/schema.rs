//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Patient records, one owner tenant each.
    patients (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning admin tenant.
        owner_id -> Uuid,
        /// Display name.
        full_name -> Varchar,
        /// Optional date of birth.
        date_of_birth -> Nullable<Date>,
        /// Optional phone number.
        phone -> Nullable<Varchar>,
        /// Optional email address.
        email -> Nullable<Varchar>,
        /// Free-text medical history.
        medical_history -> Nullable<Text>,
        /// Free-text medications list.
        medications -> Nullable<Text>,
        /// Free-text notes.
        notes -> Nullable<Text>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Appointment records with reminder state.
    appointments (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning admin tenant.
        owner_id -> Uuid,
        /// Patient attending the appointment.
        patient_id -> Uuid,
        /// Doctor display name, never blank.
        doctor_name -> Varchar,
        /// Optional department label.
        department -> Nullable<Varchar>,
        /// Scheduled start.
        start_at -> Timestamptz,
        /// Optional explicit end.
        end_at -> Nullable<Timestamptz>,
        /// Free-text notes.
        notes -> Nullable<Text>,
        /// Lifecycle status stored as its stable string form.
        status -> Varchar,
        /// Email reminder channel toggle.
        reminder_email_enabled -> Bool,
        /// SMS reminder channel toggle.
        reminder_sms_enabled -> Bool,
        /// Email lead time in minutes, when ever set.
        reminder_email_lead_minutes -> Nullable<Int4>,
        /// SMS lead time in minutes, when ever set.
        reminder_sms_lead_minutes -> Nullable<Int4>,
        /// Derived next reminder fire time.
        reminder_next_run_at -> Nullable<Timestamptz>,
        /// When the current occurrence's reminder went out.
        reminder_sent_at -> Nullable<Timestamptz>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit trail.
    audit_logs (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning admin tenant.
        owner_id -> Uuid,
        /// Dot-namespaced action tag.
        action -> Varchar,
        /// Entity kind the event concerns.
        entity_type -> Varchar,
        /// Entity identifier, when applicable.
        entity_id -> Nullable<Uuid>,
        /// Human-readable summary.
        summary -> Varchar,
        /// Truncated metadata blob.
        metadata -> Nullable<Jsonb>,
        /// Client IP captured by the inbound adapter.
        ip_address -> Nullable<Varchar>,
        /// Client user agent.
        user_agent -> Nullable<Varchar>,
        /// Request correlation id.
        request_id -> Nullable<Varchar>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::joinable!(appointments -> patients (patient_id));
diesel::allow_tables_to_appear_in_same_query!(appointments, patients);
