//! Patient-facing notification content.
//!
//! Builders assemble the subject, HTML body, and plain-text body for each
//! notification kind. Transport is a port concern; these are pure functions
//! over appointment data so they can be unit tested without I/O.

use chrono::{DateTime, Utc};

/// A fully rendered outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
    /// Plain-text alternative body.
    pub text_body: Option<String>,
}

/// The visit fields shown to patients in every notification.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitDetails {
    /// Scheduled start.
    pub start_at: DateTime<Utc>,
    /// Effective end, already resolved against the default duration.
    pub end_at: Option<DateTime<Utc>>,
    /// Doctor display name.
    pub doctor_name: String,
    /// Department label.
    pub department: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%b %-d, %Y %-I:%M %p").to_string()
}

fn format_time_range(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> String {
    match end {
        Some(end_at) => format!("{} - {}", format_datetime(start), format_datetime(end_at)),
        None => format_datetime(start),
    }
}

fn detail_lines(details: &VisitDetails) -> Vec<String> {
    vec![
        format!(
            "Date and time: {}",
            format_time_range(details.start_at, details.end_at)
        ),
        format!("Doctor: {}", details.doctor_name),
        format!(
            "Department: {}",
            details.department.as_deref().unwrap_or("\u{2014}")
        ),
        format!("Notes: {}", details.notes.as_deref().unwrap_or("\u{2014}")),
    ]
}

fn compose(
    to: &str,
    subject: String,
    intro: &str,
    sections: &[(&str, Vec<String>)],
    outro: &str,
    patient_name: &str,
) -> EmailMessage {
    let mut html = format!("<p>Hello {patient_name},</p>\n<p>{intro}</p>\n");
    let mut text = vec![format!("Hello {patient_name},"), intro.to_owned()];
    for (heading, lines) in sections {
        html.push_str(&format!(
            "<p><strong>{heading}</strong><br/>\n{}</p>\n",
            lines.join("<br/>\n")
        ));
        text.push(format!("{heading}:"));
        text.extend(lines.iter().cloned());
    }
    html.push_str(&format!("<p>{outro}</p>"));
    text.push(outro.to_owned());
    EmailMessage {
        to: to.to_owned(),
        subject,
        html_body: html,
        text_body: Some(text.join("\n")),
    }
}

/// Confirmation sent when an appointment is booked or confirmed.
pub fn build_confirmation_email(
    to: &str,
    patient_name: &str,
    clinic_name: &str,
    details: &VisitDetails,
) -> EmailMessage {
    compose(
        to,
        format!("Appointment confirmation - {clinic_name}"),
        &format!("Your appointment has been confirmed with {clinic_name}."),
        &[("Appointment details", detail_lines(details))],
        "If you need to reschedule, contact the clinic.",
        patient_name,
    )
}

/// Update notice showing the previous and new visit details side by side.
pub fn build_update_email(
    to: &str,
    patient_name: &str,
    clinic_name: &str,
    previous: &VisitDetails,
    current: &VisitDetails,
) -> EmailMessage {
    compose(
        to,
        format!("Appointment updated - {clinic_name}"),
        "Your appointment details have been updated.",
        &[
            ("Previous details", detail_lines(previous)),
            ("Updated details", detail_lines(current)),
        ],
        "If you have questions, please contact the clinic.",
        patient_name,
    )
}

/// Cancellation notice carrying the original visit details.
pub fn build_cancellation_email(
    to: &str,
    patient_name: &str,
    clinic_name: &str,
    details: &VisitDetails,
) -> EmailMessage {
    compose(
        to,
        format!("Appointment cancelled - {clinic_name}"),
        &format!("Your appointment with {clinic_name} has been cancelled."),
        &[("Original appointment", detail_lines(details))],
        "Please contact the clinic if you need to reschedule.",
        patient_name,
    )
}

/// Reminder for an upcoming appointment.
pub fn build_reminder_email(
    to: &str,
    patient_name: &str,
    clinic_name: &str,
    details: &VisitDetails,
) -> EmailMessage {
    compose(
        to,
        format!("Appointment reminder - {clinic_name}"),
        &format!("This is a reminder about your upcoming appointment with {clinic_name}."),
        &[("Appointment details", detail_lines(details))],
        "If you need to reschedule, contact the clinic.",
        patient_name,
    )
}
