//! Tests for the appointment lifecycle service.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use uuid::Uuid;

use super::AppointmentService;
use crate::domain::appointment::{
    Appointment, AppointmentDraft, AppointmentPatch, AppointmentStatus,
};
use crate::domain::audit::AuditEvent;
use crate::domain::ports::{AuditSink, MockAppointmentRepository, MockPatientRepository};
use crate::domain::scheduling::SchedulingSettings;
use crate::domain::{ErrorCode, Patient};
use crate::outbound::notify::RecordingNotifier;

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Default)]
struct RecordingAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl RecordingAuditSink {
    fn actions(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("audit lock")
            .iter()
            .map(|event| event.action.clone())
            .collect()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, event: AuditEvent) {
        self.events.lock().expect("audit lock").push(event);
    }
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, day, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

fn now() -> DateTime<Utc> {
    at(1, 0, 0)
}

fn owner() -> Uuid {
    Uuid::from_u128(0xA11CE)
}

fn patient(owner_id: Uuid, email: Option<&str>) -> Patient {
    Patient {
        id: Uuid::from_u128(0xBEEF),
        owner_id,
        full_name: "Jane Doe".to_owned(),
        date_of_birth: None,
        phone: None,
        email: email.map(str::to_owned),
        medical_history: None,
        medications: None,
        notes: None,
        created_at: now(),
    }
}

fn appointment(owner_id: Uuid, status: AppointmentStatus) -> Appointment {
    Appointment {
        id: Uuid::from_u128(0xFACE),
        owner_id,
        patient_id: Uuid::from_u128(0xBEEF),
        doctor_name: "Dr. Osei".to_owned(),
        department: None,
        start_at: at(2, 9, 0),
        end_at: None,
        notes: None,
        status,
        reminder_email_enabled: false,
        reminder_sms_enabled: false,
        reminder_email_lead_minutes: Some(1440),
        reminder_sms_lead_minutes: Some(120),
        reminder_next_run_at: None,
        reminder_sent_at: None,
        created_at: now(),
    }
}

fn draft(status: Option<AppointmentStatus>) -> AppointmentDraft {
    AppointmentDraft {
        patient_id: Uuid::from_u128(0xBEEF),
        doctor_name: None,
        department: None,
        start_at: at(2, 9, 0),
        end_at: None,
        notes: None,
        status,
        reminder_email_enabled: None,
        reminder_sms_enabled: None,
        reminder_email_lead_minutes: None,
        reminder_sms_lead_minutes: None,
    }
}

struct Harness {
    appointments: MockAppointmentRepository,
    patients: MockPatientRepository,
    notifier: Arc<RecordingNotifier>,
    audit: Arc<RecordingAuditSink>,
}

impl Harness {
    fn new() -> Self {
        Self {
            appointments: MockAppointmentRepository::new(),
            patients: MockPatientRepository::new(),
            notifier: Arc::new(RecordingNotifier::default()),
            audit: Arc::new(RecordingAuditSink::default()),
        }
    }

    fn with_patient(mut self, found: Option<Patient>) -> Self {
        self.patients
            .expect_find_by_id()
            .returning(move |_, _| Ok(found.clone()));
        self
    }

    fn build(self) -> AppointmentService {
        AppointmentService::new(
            Arc::new(self.appointments),
            Arc::new(self.patients),
            self.notifier,
            self.audit,
            Arc::new(FixedClock(now())),
            SchedulingSettings {
                clinic_name: "Riverside Clinic".to_owned(),
                default_duration_minutes: 30,
            },
        )
    }
}

#[tokio::test]
async fn create_rejects_patient_of_another_owner() {
    let harness = Harness::new().with_patient(None);
    let service = harness.build();

    let error = service
        .create(owner(), draft(None), None)
        .await
        .expect_err("unknown patient");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn create_rejects_inverted_time_range() {
    let harness = Harness::new().with_patient(Some(patient(owner(), None)));
    let service = harness.build();

    let mut bad = draft(None);
    bad.end_at = Some(bad.start_at);
    let error = service
        .create(owner(), bad, None)
        .await
        .expect_err("inverted range");
    assert_eq!(error.code(), ErrorCode::UnprocessableEntity);
}

#[tokio::test]
async fn create_rejects_overlap_with_active_sibling() {
    let mut harness = Harness::new().with_patient(Some(patient(owner(), None)));
    // Sibling at 09:00 with no end resolves to 09:00-09:30.
    harness
        .appointments
        .expect_list_active()
        .times(1)
        .returning(move |_, _| Ok(vec![appointment(owner(), AppointmentStatus::Scheduled)]));
    let service = harness.build();

    let mut candidate = draft(Some(AppointmentStatus::Scheduled));
    candidate.start_at = at(2, 9, 15);
    candidate.end_at = Some(at(2, 9, 45));
    let error = service
        .create(owner(), candidate, None)
        .await
        .expect_err("overlap");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        error.details().expect("details")["code"],
        "overlap_conflict"
    );
}

#[tokio::test]
async fn create_allows_touching_edges() {
    let mut harness = Harness::new().with_patient(Some(patient(owner(), None)));
    harness
        .appointments
        .expect_list_active()
        .times(1)
        .returning(move |_, _| Ok(vec![appointment(owner(), AppointmentStatus::Scheduled)]));
    harness
        .appointments
        .expect_insert()
        .times(1)
        .returning(|_| Ok(()));
    let service = harness.build();

    // Sibling occupies 09:00-09:30; starting exactly at 09:30 is fine.
    let mut candidate = draft(Some(AppointmentStatus::Unconfirmed));
    candidate.start_at = at(2, 9, 30);
    candidate.end_at = Some(at(2, 10, 0));
    let created = service
        .create(owner(), candidate, None)
        .await
        .expect("touching edge");
    assert_eq!(created.status, AppointmentStatus::Unconfirmed);
}

#[tokio::test]
async fn create_forces_reminders_off_for_unconfirmed() {
    let mut harness = Harness::new().with_patient(Some(patient(owner(), Some("jane@example.org"))));
    harness
        .appointments
        .expect_list_active()
        .returning(|_, _| Ok(vec![]));
    harness
        .appointments
        .expect_insert()
        .times(1)
        .returning(|_| Ok(()));
    let service = harness.build();

    let mut candidate = draft(Some(AppointmentStatus::Unconfirmed));
    candidate.reminder_email_enabled = Some(true);
    candidate.reminder_sms_enabled = Some(true);
    let created = service
        .create(owner(), candidate, None)
        .await
        .expect("created");

    assert!(!created.reminder_email_enabled);
    assert!(!created.reminder_sms_enabled);
    assert_eq!(created.reminder_next_run_at, None);
}

#[tokio::test]
async fn create_confirmed_derives_next_run_and_notifies() {
    let mut harness = Harness::new().with_patient(Some(patient(owner(), Some("jane@example.org"))));
    harness
        .appointments
        .expect_list_active()
        .returning(|_, _| Ok(vec![]));
    harness
        .appointments
        .expect_insert()
        .times(1)
        .returning(|_| Ok(()));
    let notifier = Arc::clone(&harness.notifier);
    let audit = Arc::clone(&harness.audit);
    let service = harness.build();

    let mut candidate = draft(Some(AppointmentStatus::Confirmed));
    candidate.reminder_email_enabled = Some(true);
    candidate.reminder_sms_enabled = Some(true);
    let created = service
        .create(owner(), candidate, None)
        .await
        .expect("created");

    // Earliest enabled channel: email at start - 1440 minutes.
    assert_eq!(created.reminder_next_run_at, Some(at(1, 9, 0)));
    assert_eq!(
        notifier.subjects(),
        vec!["Appointment confirmation - Riverside Clinic".to_owned()]
    );
    assert_eq!(audit.actions(), vec!["appointment.create".to_owned()]);
}

#[tokio::test]
async fn create_surfaces_notifier_failure_after_persisting() {
    let mut harness = Harness::new().with_patient(Some(patient(owner(), Some("jane@example.org"))));
    harness.notifier = Arc::new(RecordingNotifier::failing());
    harness
        .appointments
        .expect_list_active()
        .returning(|_, _| Ok(vec![]));
    harness
        .appointments
        .expect_insert()
        .times(1)
        .returning(|_| Ok(()));
    let service = harness.build();

    let error = service
        .create(owner(), draft(Some(AppointmentStatus::Confirmed)), None)
        .await
        .expect_err("notifier down");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(
        error.details().expect("details")["code"],
        "notification_failed"
    );
}

#[tokio::test]
async fn update_excludes_self_from_overlap_and_tags_reschedule() {
    let existing = appointment(owner(), AppointmentStatus::Scheduled);
    let existing_id = existing.id;
    let mut harness = Harness::new().with_patient(Some(patient(owner(), None)));
    harness
        .appointments
        .expect_find_by_id()
        .returning(move |_, _| Ok(Some(existing.clone())));
    harness
        .appointments
        .expect_list_active()
        .withf(move |_, exclude| *exclude == Some(existing_id))
        .times(1)
        .returning(|_, _| Ok(vec![]));
    harness
        .appointments
        .expect_update()
        .times(1)
        .returning(|_| Ok(()));
    let audit = Arc::clone(&harness.audit);
    let service = harness.build();

    let patch = AppointmentPatch {
        start_at: Some(at(3, 14, 0)),
        ..AppointmentPatch::default()
    };
    let updated = service
        .update(owner(), existing_id, patch, None)
        .await
        .expect("updated");
    assert_eq!(updated.start_at, at(3, 14, 0));
    assert_eq!(audit.actions(), vec!["appointment.reschedule".to_owned()]);
}

#[tokio::test]
async fn update_into_cancelled_audits_cancel_and_sends_cancellation() {
    let existing = appointment(owner(), AppointmentStatus::Scheduled);
    let existing_id = existing.id;
    let mut harness = Harness::new().with_patient(Some(patient(owner(), Some("jane@example.org"))));
    harness
        .appointments
        .expect_find_by_id()
        .returning(move |_, _| Ok(Some(existing.clone())));
    harness
        .appointments
        .expect_update()
        .times(1)
        .returning(|_| Ok(()));
    let notifier = Arc::clone(&harness.notifier);
    let audit = Arc::clone(&harness.audit);
    let service = harness.build();

    let patch = AppointmentPatch {
        status: Some(AppointmentStatus::Cancelled),
        ..AppointmentPatch::default()
    };
    let updated = service
        .update(owner(), existing_id, patch, None)
        .await
        .expect("updated");
    assert_eq!(updated.status, AppointmentStatus::Cancelled);
    assert_eq!(audit.actions(), vec!["appointment.cancel".to_owned()]);
    assert_eq!(
        notifier.subjects(),
        vec!["Appointment cancelled - Riverside Clinic".to_owned()]
    );
}

#[tokio::test]
async fn update_reminder_settings_emits_secondary_audit() {
    let existing = appointment(owner(), AppointmentStatus::Confirmed);
    let existing_id = existing.id;
    let mut harness = Harness::new().with_patient(Some(patient(owner(), None)));
    harness
        .appointments
        .expect_find_by_id()
        .returning(move |_, _| Ok(Some(existing.clone())));
    harness
        .appointments
        .expect_list_active()
        .returning(|_, _| Ok(vec![]));
    harness
        .appointments
        .expect_update()
        .times(1)
        .returning(|_| Ok(()));
    let audit = Arc::clone(&harness.audit);
    let service = harness.build();

    let patch = AppointmentPatch {
        reminder_email_enabled: Some(true),
        ..AppointmentPatch::default()
    };
    let updated = service
        .update(owner(), existing_id, patch, None)
        .await
        .expect("updated");
    assert!(updated.reminder_email_enabled);
    assert_eq!(updated.reminder_next_run_at, Some(at(1, 9, 0)));
    assert_eq!(
        audit.actions(),
        vec![
            "appointment.update".to_owned(),
            "appointment.reminder_updated".to_owned(),
        ]
    );
}

#[tokio::test]
async fn update_to_completed_audits_auto_disable() {
    let mut existing = appointment(owner(), AppointmentStatus::Confirmed);
    existing.reminder_email_enabled = true;
    existing.reminder_next_run_at = Some(at(1, 9, 0));
    let existing_id = existing.id;
    let mut harness = Harness::new().with_patient(Some(patient(owner(), Some("jane@example.org"))));
    harness
        .appointments
        .expect_find_by_id()
        .returning(move |_, _| Ok(Some(existing.clone())));
    harness
        .appointments
        .expect_update()
        .times(1)
        .returning(|_| Ok(()));
    let notifier = Arc::clone(&harness.notifier);
    let audit = Arc::clone(&harness.audit);
    let service = harness.build();

    let patch = AppointmentPatch {
        status: Some(AppointmentStatus::Completed),
        ..AppointmentPatch::default()
    };
    let updated = service
        .update(owner(), existing_id, patch, None)
        .await
        .expect("updated");
    assert!(!updated.reminder_email_enabled);
    assert_eq!(updated.reminder_next_run_at, None);
    assert_eq!(
        audit.actions(),
        vec![
            "appointment.complete".to_owned(),
            "appointment.reminder_disabled_auto".to_owned(),
        ]
    );
    // Completion never notifies the patient.
    assert!(notifier.subjects().is_empty());
}

#[tokio::test]
async fn cancel_is_a_noop_when_already_cancelled() {
    let existing = appointment(owner(), AppointmentStatus::Cancelled);
    let existing_id = existing.id;
    let mut harness = Harness::new();
    harness
        .appointments
        .expect_find_by_id()
        .returning(move |_, _| Ok(Some(existing.clone())));
    let audit = Arc::clone(&harness.audit);
    let service = harness.build();

    let result = service
        .cancel(owner(), existing_id, None)
        .await
        .expect("noop cancel");
    assert_eq!(result.status, AppointmentStatus::Cancelled);
    assert!(audit.actions().is_empty());
}

#[tokio::test]
async fn cancel_notifies_unconditionally() {
    // No visible change beyond status, reminders never enabled: the shortcut
    // still emails the patient.
    let existing = appointment(owner(), AppointmentStatus::Unconfirmed);
    let existing_id = existing.id;
    let mut harness = Harness::new().with_patient(Some(patient(owner(), Some("jane@example.org"))));
    harness
        .appointments
        .expect_find_by_id()
        .returning(move |_, _| Ok(Some(existing.clone())));
    harness
        .appointments
        .expect_update()
        .times(1)
        .returning(|_| Ok(()));
    let notifier = Arc::clone(&harness.notifier);
    let audit = Arc::clone(&harness.audit);
    let service = harness.build();

    let cancelled = service
        .cancel(owner(), existing_id, None)
        .await
        .expect("cancelled");
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert_eq!(audit.actions(), vec!["appointment.cancel".to_owned()]);
    assert_eq!(
        notifier.subjects(),
        vec!["Appointment cancelled - Riverside Clinic".to_owned()]
    );
}

#[tokio::test]
async fn delete_removes_row_and_audits() {
    let existing = appointment(owner(), AppointmentStatus::Scheduled);
    let existing_id = existing.id;
    let mut harness = Harness::new();
    harness
        .appointments
        .expect_find_by_id()
        .returning(move |_, _| Ok(Some(existing.clone())));
    harness
        .appointments
        .expect_delete()
        .times(1)
        .returning(|_, _| Ok(true));
    let audit = Arc::clone(&harness.audit);
    let service = harness.build();

    service
        .delete(owner(), existing_id, None)
        .await
        .expect("deleted");
    assert_eq!(audit.actions(), vec!["appointment.delete".to_owned()]);
}

#[tokio::test]
async fn simulate_requires_confirmed_future_and_channels() {
    let cases = [
        (appointment(owner(), AppointmentStatus::Scheduled), "status"),
        (
            {
                let mut past = appointment(owner(), AppointmentStatus::Confirmed);
                past.start_at = at(1, 0, 0) - chrono::Duration::hours(1);
                past
            },
            "past",
        ),
        (
            // Confirmed and future but no channel enabled.
            appointment(owner(), AppointmentStatus::Confirmed),
            "channels",
        ),
    ];
    for (existing, label) in cases {
        let existing_id = existing.id;
        let mut harness = Harness::new();
        harness
            .appointments
            .expect_find_by_id()
            .returning(move |_, _| Ok(Some(existing.clone())));
        let service = harness.build();

        let error = service
            .simulate_reminder(owner(), existing_id, None)
            .await
            .unwrap_err();
        assert_eq!(error.code(), ErrorCode::InvalidRequest, "case: {label}");
        assert_eq!(error.details().expect("details")["code"], "invalid_state");
    }
}

#[tokio::test]
async fn simulate_reports_channels_and_schedule() {
    let mut existing = appointment(owner(), AppointmentStatus::Confirmed);
    existing.reminder_email_enabled = true;
    existing.reminder_next_run_at = Some(at(1, 9, 0));
    let existing_id = existing.id;
    let mut harness = Harness::new();
    harness
        .appointments
        .expect_find_by_id()
        .returning(move |_, _| Ok(Some(existing.clone())));
    let audit = Arc::clone(&harness.audit);
    let service = harness.build();

    let simulation = service
        .simulate_reminder(owner(), existing_id, None)
        .await
        .expect("simulated");
    assert_eq!(simulation.channels, vec!["email".to_owned()]);
    assert_eq!(simulation.scheduled_for, Some(at(1, 9, 0)));
    assert_eq!(
        audit.actions(),
        vec!["appointment.reminder_simulated".to_owned()]
    );
}

#[tokio::test]
async fn operations_on_foreign_rows_look_like_missing_rows() {
    // The repository contract already scopes by owner; a wrong-owner id comes
    // back as None and every operation must answer NotFound.
    let target = Uuid::from_u128(0xD00D);

    let mut harness = Harness::new();
    harness
        .appointments
        .expect_find_by_id()
        .returning(|_, _| Ok(None));
    let service = harness.build();

    let get_err = service.get(owner(), target).await.unwrap_err();
    let update_err = service
        .update(owner(), target, AppointmentPatch::default(), None)
        .await
        .unwrap_err();
    let cancel_err = service.cancel(owner(), target, None).await.unwrap_err();
    let complete_err = service.complete(owner(), target, None).await.unwrap_err();
    let delete_err = service.delete(owner(), target, None).await.unwrap_err();
    let simulate_err = service
        .simulate_reminder(owner(), target, None)
        .await
        .unwrap_err();

    for error in [
        get_err,
        update_err,
        cancel_err,
        complete_err,
        delete_err,
        simulate_err,
    ] {
        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(error.message(), "Appointment not found");
    }
}
