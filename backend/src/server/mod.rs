//! Server construction and process lifecycle.
//!
//! Wires the adapter set selected by configuration (PostgreSQL or in-memory,
//! HTTP relay or log-only notifier) into the domain services, builds the
//! actix application, and owns the reminder dispatcher task around the HTTP
//! server's lifetime.

mod config;

pub use config::AppSettings;

use std::env;
use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Key, SameSite};
use actix_web::{App, HttpServer, web};
use mockable::{Clock, DefaultClock};
use tracing::warn;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;
use zeroize::Zeroize;

#[cfg(debug_assertions)]
use clinic_backend::ApiDoc;
use clinic_backend::domain::ports::{AppointmentRepository, AuditSink, Notifier, PatientRepository};
use clinic_backend::domain::{AppointmentService, ReminderDispatcher};
use clinic_backend::inbound::http::health::{HealthState, live, ready};
use clinic_backend::inbound::http::{HttpState, appointments, reminders};
use clinic_backend::outbound::notify::{HttpRelayNotifier, TracingNotifier};
use clinic_backend::outbound::persistence::{
    DbPool, DieselAppointmentRepository, DieselAuditSink, DieselPatientRepository,
    InMemoryAppointmentRepository, InMemoryAuditSink, InMemoryPatientRepository, PoolConfig,
};

fn load_session_key() -> std::io::Result<Key> {
    let key_path =
        env::var("SESSION_KEY_FILE").unwrap_or_else(|_| "/var/run/secrets/session_key".into());
    match std::fs::read(&key_path) {
        Ok(mut bytes) => {
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) => {
            let allow_dev = env::var("SESSION_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
            if cfg!(debug_assertions) || allow_dev {
                warn!(path = %key_path, error = %error, "using temporary session key (dev only)");
                Ok(Key::generate())
            } else {
                Err(std::io::Error::other(format!(
                    "failed to read session key at {key_path}: {error}"
                )))
            }
        }
    }
}

async fn build_state(settings: &AppSettings) -> std::io::Result<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let notifier: Arc<dyn Notifier> = match settings.relay_settings() {
        Some(relay) => Arc::new(HttpRelayNotifier::new(relay)),
        None => {
            warn!("no mail relay configured; notifications are logged only");
            Arc::new(TracingNotifier)
        }
    };

    let (appointments_repo, patients_repo, audit): (
        Arc<dyn AppointmentRepository>,
        Arc<dyn PatientRepository>,
        Arc<dyn AuditSink>,
    ) = match &settings.database_url {
        Some(url) => {
            let pool = DbPool::new(PoolConfig::new(url))
                .await
                .map_err(|error| std::io::Error::other(error.to_string()))?;
            (
                Arc::new(DieselAppointmentRepository::new(pool.clone())),
                Arc::new(DieselPatientRepository::new(pool.clone())),
                Arc::new(DieselAuditSink::new(pool)),
            )
        }
        None => {
            warn!("no database configured; using in-memory stores (dev only)");
            (
                Arc::new(InMemoryAppointmentRepository::new()),
                Arc::new(InMemoryPatientRepository::new()),
                Arc::new(InMemoryAuditSink::new()),
            )
        }
    };

    let service = Arc::new(AppointmentService::new(
        Arc::clone(&appointments_repo),
        Arc::clone(&patients_repo),
        Arc::clone(&notifier),
        Arc::clone(&audit),
        Arc::clone(&clock),
        settings.scheduling_settings(),
    ));
    let dispatcher = Arc::new(ReminderDispatcher::new(
        appointments_repo,
        patients_repo,
        notifier,
        clock,
        settings.scheduling_settings(),
        settings.sweep_settings(),
    ));
    Ok(HttpState::new(service, dispatcher, audit))
}

/// Run the HTTP server and the background reminder dispatcher to completion.
pub async fn run(settings: AppSettings) -> std::io::Result<()> {
    let key = load_session_key()?;
    let cookie_secure = env::var("SESSION_COOKIE_SECURE")
        .map(|v| v != "0")
        .unwrap_or(true);
    let bind_addr = settings
        .bind_addr()
        .map_err(|error| std::io::Error::other(format!("invalid bind address: {error}")))?;

    let state = build_state(&settings).await?;
    let dispatcher = Arc::clone(&state.dispatcher);
    let http_state = web::Data::new(state);
    let health_state = web::Data::new(HealthState::new());
    let server_health_state = health_state.clone();

    let server = HttpServer::new(move || {
        let session = SessionMiddleware::builder(CookieSessionStore::default(), key.clone())
            .cookie_name("session".into())
            .cookie_path("/".into())
            .cookie_secure(cookie_secure)
            .cookie_http_only(true)
            .cookie_same_site(SameSite::Lax)
            .build();

        let api = web::scope("/api/v1")
            .wrap(session)
            .service(appointments::list_appointments)
            .service(appointments::create_appointment)
            .service(appointments::get_appointment)
            .service(appointments::update_appointment)
            .service(appointments::cancel_appointment)
            .service(appointments::complete_appointment)
            .service(appointments::delete_appointment)
            .service(appointments::simulate_reminder)
            .service(reminders::run_reminders);

        #[cfg_attr(not(debug_assertions), expect(unused_mut, reason = "mutated in debug builds"))]
        let mut app = App::new()
            .app_data(http_state.clone())
            .app_data(server_health_state.clone())
            .service(api)
            .service(ready)
            .service(live);

        #[cfg(debug_assertions)]
        {
            app = app
                .service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
        }

        app
    })
    .bind(bind_addr)?;

    let sweep_handle = dispatcher.spawn_interval(settings.sweep_interval());
    health_state.mark_ready();
    let result = server.run().await;
    health_state.mark_unhealthy();
    sweep_handle.shutdown();
    result
}
