//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct which generates the OpenAPI specification
//! for the REST API: all appointment and reminder endpoints, the health
//! probes, and the shared schemas. Swagger UI serves the document in debug
//! builds.

use utoipa::OpenApi;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::Modify;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie carrying the authenticated owner id.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Clinic scheduling API",
        description = "Appointment lifecycle, reminder scheduling, and audit trail."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::appointments::list_appointments,
        crate::inbound::http::appointments::get_appointment,
        crate::inbound::http::appointments::create_appointment,
        crate::inbound::http::appointments::update_appointment,
        crate::inbound::http::appointments::cancel_appointment,
        crate::inbound::http::appointments::complete_appointment,
        crate::inbound::http::appointments::delete_appointment,
        crate::inbound::http::appointments::simulate_reminder,
        crate::inbound::http::reminders::run_reminders,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        crate::domain::Error,
        crate::domain::ErrorCode,
        crate::domain::AppointmentStatus,
        crate::domain::SweepSummary,
        crate::inbound::http::appointments::CreateAppointmentRequest,
        crate::inbound::http::appointments::UpdateAppointmentRequest,
        crate::inbound::http::appointments::AppointmentResponse,
        crate::inbound::http::appointments::SimulateReminderResponse,
    ))
)]
pub struct ApiDoc;
