//! Handler-level tests over the in-memory adapter set.

use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_session::storage::CookieSessionStore;
use actix_web::cookie::Key;
use actix_web::{App, HttpResponse, post, test, web};
use chrono::{TimeZone, Utc};
use mockable::DefaultClock;
use serde_json::json;
use uuid::Uuid;

use crate::domain::ports::AuditSink;
use crate::domain::{
    AppointmentService, Patient, ReminderDispatcher, ReminderSweepSettings, SchedulingSettings,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{ApiResult, appointments, reminders};
use crate::outbound::notify::RecordingNotifier;
use crate::outbound::persistence::{
    InMemoryAppointmentRepository, InMemoryAuditSink, InMemoryPatientRepository,
};

struct World {
    state: HttpState,
    patients: Arc<InMemoryPatientRepository>,
    audit: Arc<InMemoryAuditSink>,
}

fn world() -> World {
    let appointments_repo = Arc::new(InMemoryAppointmentRepository::new());
    let patients = Arc::new(InMemoryPatientRepository::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let audit = Arc::new(InMemoryAuditSink::new());
    let clock = Arc::new(DefaultClock);
    let scheduling = SchedulingSettings {
        clinic_name: "Riverside Clinic".to_owned(),
        default_duration_minutes: 30,
    };
    let service = Arc::new(AppointmentService::new(
        appointments_repo.clone(),
        patients.clone(),
        notifier.clone(),
        audit.clone(),
        clock.clone(),
        scheduling.clone(),
    ));
    let dispatcher = Arc::new(ReminderDispatcher::new(
        appointments_repo.clone(),
        patients.clone(),
        notifier.clone(),
        clock,
        scheduling,
        ReminderSweepSettings::default(),
    ));
    let audit_sink: Arc<dyn AuditSink> = audit.clone();
    World {
        state: HttpState::new(service, dispatcher, audit_sink),
        patients,
        audit,
    }
}

#[post("/test/login")]
async fn test_login(session: SessionContext, owner: web::Json<Uuid>) -> ApiResult<HttpResponse> {
    session.persist_owner(owner.into_inner())?;
    Ok(HttpResponse::Ok().finish())
}

/// Build the test application with one session middleware spanning the login
/// helper and the API scope, so the same cookie works for both.
macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .wrap(
                    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
                        .cookie_secure(false)
                        .build(),
                )
                .service(test_login)
                .service(
                    web::scope("/api/v1")
                        .service(appointments::list_appointments)
                        .service(appointments::create_appointment)
                        .service(appointments::get_appointment)
                        .service(appointments::update_appointment)
                        .service(appointments::cancel_appointment)
                        .service(appointments::complete_appointment)
                        .service(appointments::delete_appointment)
                        .service(appointments::simulate_reminder)
                        .service(reminders::run_reminders),
                ),
        )
        .await
    };
}

/// Log in as `$owner` and evaluate to the session cookie.
macro_rules! login {
    ($app:expr, $owner:expr) => {{
        let request = test::TestRequest::post()
            .uri("/test/login")
            .set_json($owner)
            .to_request();
        let response = test::call_service(&$app, request).await;
        assert!(response.status().is_success(), "login should succeed");
        response
            .response()
            .cookies()
            .next()
            .expect("session cookie")
            .into_owned()
    }};
}

fn seed_patient(world: &World, owner_id: Uuid) -> Uuid {
    let patient_id = Uuid::new_v4();
    world.patients.seed(Patient {
        id: patient_id,
        owner_id,
        full_name: "Jane Doe".to_owned(),
        date_of_birth: None,
        phone: None,
        email: Some("jane@example.org".to_owned()),
        medical_history: None,
        medications: None,
        notes: None,
        created_at: Utc::now(),
    });
    patient_id
}

fn start_at(hour: u32, minute: u32) -> String {
    Utc.with_ymd_and_hms(2030, 1, 1, hour, minute, 0)
        .single()
        .expect("valid timestamp")
        .to_rfc3339()
}

#[actix_rt::test]
async fn appointment_endpoints_require_a_session() {
    let world = world();
    let app = test_app!(world.state);

    let request = test::TestRequest::get()
        .uri("/api/v1/appointments")
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn create_conflict_and_touching_edge_round_trip() {
    let world = world();
    let owner_id = Uuid::new_v4();
    let patient_id = seed_patient(&world, owner_id);
    let app = test_app!(world.state);
    let cookie = login!(app, owner_id);

    // 09:00, end defaulting to +30 via the default duration.
    let request = test::TestRequest::post()
        .uri("/api/v1/appointments")
        .cookie(cookie.clone())
        .set_json(json!({
            "patientId": patient_id,
            "startAt": start_at(9, 0),
            "status": "Scheduled",
        }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::CREATED);

    // 09:15-09:45 collides.
    let request = test::TestRequest::post()
        .uri("/api/v1/appointments")
        .cookie(cookie.clone())
        .set_json(json!({
            "patientId": patient_id,
            "startAt": start_at(9, 15),
            "endAt": start_at(9, 45),
            "status": "Scheduled",
        }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);

    // 09:30-10:00 only touches the edge.
    let request = test::TestRequest::post()
        .uri("/api/v1/appointments")
        .cookie(cookie)
        .set_json(json!({
            "patientId": patient_id,
            "startAt": start_at(9, 30),
            "endAt": start_at(10, 0),
            "status": "Scheduled",
        }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::CREATED);
}

#[actix_rt::test]
async fn inverted_range_yields_422() {
    let world = world();
    let owner_id = Uuid::new_v4();
    let patient_id = seed_patient(&world, owner_id);
    let app = test_app!(world.state);
    let cookie = login!(app, owner_id);

    let request = test::TestRequest::post()
        .uri("/api/v1/appointments")
        .cookie(cookie)
        .set_json(json!({
            "patientId": patient_id,
            "startAt": start_at(9, 0),
            "endAt": start_at(9, 0),
        }))
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(
        response.status(),
        actix_web::http::StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[actix_rt::test]
async fn cross_tenant_lookup_is_indistinguishable_from_missing() {
    let world = world();
    let owner_a = Uuid::new_v4();
    let owner_b = Uuid::new_v4();
    let patient_id = seed_patient(&world, owner_a);
    let app = test_app!(world.state);

    let cookie_a = login!(app, owner_a);
    let request = test::TestRequest::post()
        .uri("/api/v1/appointments")
        .cookie(cookie_a)
        .set_json(json!({
            "patientId": patient_id,
            "startAt": start_at(9, 0),
        }))
        .to_request();
    let created: serde_json::Value = test::call_and_read_body_json(&app, request).await;
    let appointment_id = created["id"].as_str().expect("id").to_owned();

    let cookie_b = login!(app, owner_b);
    let request = test::TestRequest::get()
        .uri(&format!("/api/v1/appointments/{appointment_id}"))
        .cookie(cookie_b)
        .to_request();
    let response = test::call_service(&app, request).await;
    assert_eq!(response.status(), actix_web::http::StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn manual_sweep_run_reports_counts_and_audits() {
    let world = world();
    let owner_id = Uuid::new_v4();
    let app = test_app!(world.state);
    let cookie = login!(app, owner_id);

    let request = test::TestRequest::post()
        .uri("/api/v1/reminders/run")
        .cookie(cookie)
        .to_request();
    let summary: serde_json::Value = test::call_and_read_body_json(&app, request).await;
    assert_eq!(summary["processed"], 0);
    assert_eq!(summary["sent"], 0);

    let actions: Vec<String> = world
        .audit
        .events()
        .into_iter()
        .map(|event| event.action)
        .collect();
    assert!(actions.contains(&"reminder.run".to_owned()));
}
