//! End-to-end service flows over the in-memory adapter set.
//!
//! These tests drive the lifecycle service and the reminder dispatcher the
//! way the HTTP layer does, with a pinned clock and real (in-memory)
//! adapters, so the scheduling rules are exercised as one system.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use uuid::Uuid;

use clinic_backend::domain::appointment::{AppointmentDraft, AppointmentPatch, AppointmentStatus};
use clinic_backend::domain::{
    AppointmentService, ErrorCode, Patient, ReminderDispatcher, ReminderSweepSettings,
    SchedulingSettings,
};
use clinic_backend::outbound::notify::RecordingNotifier;
use clinic_backend::outbound::persistence::{
    InMemoryAppointmentRepository, InMemoryAuditSink, InMemoryPatientRepository,
};

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, day, hour, minute, 0)
        .single()
        .expect("valid timestamp")
}

fn now() -> DateTime<Utc> {
    at(1, 8, 0)
}

struct World {
    owner_id: Uuid,
    patient_id: Uuid,
    appointments: Arc<InMemoryAppointmentRepository>,
    patients: Arc<InMemoryPatientRepository>,
    notifier: Arc<RecordingNotifier>,
    audit: Arc<InMemoryAuditSink>,
    service: AppointmentService,
    dispatcher: ReminderDispatcher,
}

fn world() -> World {
    let owner_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let appointments = Arc::new(InMemoryAppointmentRepository::new());
    let patients = Arc::new(InMemoryPatientRepository::new());
    patients.seed(Patient {
        id: patient_id,
        owner_id,
        full_name: "Jane Doe".to_owned(),
        date_of_birth: None,
        phone: None,
        email: Some("jane@example.org".to_owned()),
        medical_history: None,
        medications: None,
        notes: None,
        created_at: now(),
    });
    let notifier = Arc::new(RecordingNotifier::new());
    let audit = Arc::new(InMemoryAuditSink::new());
    let scheduling = SchedulingSettings {
        clinic_name: "Riverside Clinic".to_owned(),
        default_duration_minutes: 30,
    };
    let service = AppointmentService::new(
        appointments.clone(),
        patients.clone(),
        notifier.clone(),
        audit.clone(),
        Arc::new(FixedClock(now())),
        scheduling.clone(),
    );
    let dispatcher = ReminderDispatcher::new(
        appointments.clone(),
        patients.clone(),
        notifier.clone(),
        Arc::new(FixedClock(now())),
        scheduling,
        ReminderSweepSettings::default(),
    );
    World {
        owner_id,
        patient_id,
        appointments,
        patients,
        notifier,
        audit,
        service,
        dispatcher,
    }
}

fn draft(world: &World, start: DateTime<Utc>, status: AppointmentStatus) -> AppointmentDraft {
    AppointmentDraft {
        patient_id: world.patient_id,
        doctor_name: Some("Dr. Osei".to_owned()),
        department: None,
        start_at: start,
        end_at: None,
        notes: None,
        status: Some(status),
        reminder_email_enabled: None,
        reminder_sms_enabled: None,
        reminder_email_lead_minutes: None,
        reminder_sms_lead_minutes: None,
    }
}

fn audit_actions(world: &World) -> Vec<String> {
    world
        .audit
        .events()
        .into_iter()
        .map(|event| event.action)
        .collect()
}

#[tokio::test]
async fn overlap_scenario_from_first_principles() {
    let world = world();

    // 09:00 with no end: effective interval 09:00-09:30.
    world
        .service
        .create(
            world.owner_id,
            draft(&world, at(1, 9, 0), AppointmentStatus::Scheduled),
            None,
        )
        .await
        .expect("first booking");

    // 09:15-09:45 overlaps.
    let mut second = draft(&world, at(1, 9, 15), AppointmentStatus::Scheduled);
    second.end_at = Some(at(1, 9, 45));
    let error = world
        .service
        .create(world.owner_id, second, None)
        .await
        .expect_err("overlap");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);

    // 09:30-10:00 touches the edge and is allowed.
    let mut third = draft(&world, at(1, 9, 30), AppointmentStatus::Scheduled);
    third.end_at = Some(at(1, 10, 0));
    world
        .service
        .create(world.owner_id, third, None)
        .await
        .expect("touching edge");
}

#[tokio::test]
async fn cancelled_and_completed_rows_never_block() {
    let world = world();

    let first = world
        .service
        .create(
            world.owner_id,
            draft(&world, at(1, 9, 0), AppointmentStatus::Scheduled),
            None,
        )
        .await
        .expect("first booking");
    world
        .service
        .cancel(world.owner_id, first.id, None)
        .await
        .expect("cancel");

    // Same slot is free again once the original is cancelled.
    let replacement = world
        .service
        .create(
            world.owner_id,
            draft(&world, at(1, 9, 0), AppointmentStatus::Scheduled),
            None,
        )
        .await
        .expect("rebooking over a cancelled slot");
    world
        .service
        .complete(world.owner_id, replacement.id, None)
        .await
        .expect("complete");

    world
        .service
        .create(
            world.owner_id,
            draft(&world, at(1, 9, 0), AppointmentStatus::Scheduled),
            None,
        )
        .await
        .expect("rebooking over a completed slot");
}

#[tokio::test]
async fn owners_do_not_contend_for_slots() {
    let world = world();
    let other_owner = Uuid::new_v4();
    let other_patient = Uuid::new_v4();
    world.patients.seed(Patient {
        id: other_patient,
        owner_id: other_owner,
        full_name: "Ola Nordmann".to_owned(),
        date_of_birth: None,
        phone: None,
        email: None,
        medical_history: None,
        medications: None,
        notes: None,
        created_at: now(),
    });

    world
        .service
        .create(
            world.owner_id,
            draft(&world, at(1, 9, 0), AppointmentStatus::Scheduled),
            None,
        )
        .await
        .expect("owner A books");

    // A different tenant books the same wall-clock slot without conflict,
    // against the same store.
    let mut second = draft(&world, at(1, 9, 0), AppointmentStatus::Scheduled);
    second.patient_id = other_patient;
    world
        .service
        .create(other_owner, second, None)
        .await
        .expect("owner B books the same slot");
}

#[tokio::test]
async fn reminder_state_follows_status_transitions() {
    let world = world();

    let mut wanted = draft(&world, at(2, 9, 0), AppointmentStatus::Unconfirmed);
    wanted.reminder_email_enabled = Some(true);
    wanted.reminder_sms_enabled = Some(true);
    let created = world
        .service
        .create(world.owner_id, wanted, None)
        .await
        .expect("created");
    // Unconfirmed bookings cannot carry reminders, whatever the caller sent.
    assert!(!created.reminder_email_enabled);
    assert!(!created.reminder_sms_enabled);
    assert_eq!(created.reminder_next_run_at, None);

    // Confirming with reminders re-enabled derives the earliest channel time.
    let patch = AppointmentPatch {
        status: Some(AppointmentStatus::Confirmed),
        reminder_email_enabled: Some(true),
        reminder_sms_enabled: Some(true),
        ..AppointmentPatch::default()
    };
    let confirmed = world
        .service
        .update(world.owner_id, created.id, patch, None)
        .await
        .expect("confirmed");
    assert_eq!(
        confirmed.reminder_next_run_at,
        Some(at(2, 9, 0) - Duration::minutes(1440))
    );

    // Cancelling suppresses the reminder and audits the auto-disable.
    world
        .service
        .cancel(world.owner_id, confirmed.id, None)
        .await
        .expect("cancelled");
    let stored = world
        .appointments
        .get(confirmed.id)
        .expect("row kept");
    assert!(!stored.reminder_email_enabled);
    assert_eq!(stored.reminder_next_run_at, None);

    let actions = audit_actions(&world);
    assert_eq!(
        actions,
        vec![
            "appointment.create".to_owned(),
            "appointment.confirmed".to_owned(),
            "appointment.reminder_updated".to_owned(),
            "appointment.cancel".to_owned(),
            "appointment.reminder_disabled_auto".to_owned(),
        ]
    );
}

#[tokio::test]
async fn sweep_is_idempotent_for_one_occurrence() {
    let world = world();

    let mut wanted = draft(&world, at(1, 9, 0), AppointmentStatus::Confirmed);
    wanted.reminder_email_enabled = Some(true);
    let created = world
        .service
        .create(world.owner_id, wanted, None)
        .await
        .expect("created");

    let sweep_now = at(1, 9, 0);
    let first = world
        .dispatcher
        .run_sweep_at(sweep_now)
        .await
        .expect("first sweep");
    assert_eq!((first.processed, first.sent, first.skipped), (1, 1, 0));
    assert_eq!(
        world
            .appointments
            .get(created.id)
            .expect("row kept")
            .reminder_sent_at,
        Some(sweep_now)
    );

    let second = world
        .dispatcher
        .run_sweep_at(sweep_now)
        .await
        .expect("second sweep");
    assert_eq!(second.sent, 0);

    // One confirmation email from create, one reminder from the sweep.
    assert_eq!(
        world.notifier.subjects(),
        vec![
            "Appointment confirmation - Riverside Clinic".to_owned(),
            "Appointment reminder - Riverside Clinic".to_owned(),
        ]
    );
}

#[tokio::test]
async fn rescheduling_recomputes_the_reminder_occurrence() {
    let world = world();

    let mut wanted = draft(&world, at(2, 9, 0), AppointmentStatus::Confirmed);
    wanted.reminder_email_enabled = Some(true);
    let created = world
        .service
        .create(world.owner_id, wanted, None)
        .await
        .expect("created");
    assert_eq!(created.reminder_next_run_at, Some(at(1, 9, 0)));

    let patch = AppointmentPatch {
        start_at: Some(at(3, 9, 0)),
        ..AppointmentPatch::default()
    };
    let moved = world
        .service
        .update(world.owner_id, created.id, patch, None)
        .await
        .expect("rescheduled");
    assert_eq!(moved.reminder_next_run_at, Some(at(2, 9, 0)));

    let actions = audit_actions(&world);
    assert!(actions.contains(&"appointment.reschedule".to_owned()));
}
