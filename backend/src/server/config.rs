//! Application settings loaded via OrthoConfig.
//!
//! Every knob can come from the environment (prefix `CLINIC_`), a config
//! file, or CLI arguments; optional values fall back through accessor
//! methods so a bare checkout boots with sensible defaults.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use clinic_backend::domain::{ReminderSweepSettings, SchedulingSettings};
use clinic_backend::outbound::notify::HttpRelaySettings;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_CLINIC_NAME: &str = "Riverside Clinic";

/// Configuration values for the scheduling backend.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CLINIC")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection URL; absent selects the in-memory adapter set,
    /// which is development-only and loses everything on restart.
    pub database_url: Option<String>,
    /// Clinic display name used in patient-facing notifications.
    pub clinic_name: Option<String>,
    /// Visit length assumed when an appointment has no explicit end.
    #[ortho_config(default = 30)]
    pub default_duration_minutes: i64,
    /// Hours ahead of now the reminder sweep scans.
    #[ortho_config(default = 24)]
    pub reminder_window_hours: i64,
    /// Minimum sweep lookahead in minutes.
    #[ortho_config(default = 60)]
    pub reminder_lookahead_minutes: i64,
    /// Minutes between background sweep runs.
    #[ortho_config(default = 60)]
    pub sweep_interval_minutes: u64,
    /// Mail relay endpoint; absent selects the log-only notifier.
    pub notifier_endpoint: Option<String>,
    /// Sender address attached to outbound mail.
    pub notifier_from: Option<String>,
    /// Optional bearer token for the mail relay.
    pub notifier_token: Option<String>,
}

impl AppSettings {
    /// Bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        self.bind_addr
            .as_deref()
            .unwrap_or(DEFAULT_BIND_ADDR)
            .parse()
    }

    /// Clinic display name with the default applied.
    pub fn clinic_name(&self) -> &str {
        self.clinic_name.as_deref().unwrap_or(DEFAULT_CLINIC_NAME)
    }

    /// Scheduling policy shared by the lifecycle service and the sweep.
    pub fn scheduling_settings(&self) -> SchedulingSettings {
        SchedulingSettings {
            clinic_name: self.clinic_name().to_owned(),
            default_duration_minutes: self.default_duration_minutes,
        }
    }

    /// Window configuration for the reminder sweep.
    pub fn sweep_settings(&self) -> ReminderSweepSettings {
        ReminderSweepSettings {
            window_hours: self.reminder_window_hours,
            lookahead_minutes: self.reminder_lookahead_minutes,
        }
    }

    /// Background sweep period.
    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_minutes.saturating_mul(60))
    }

    /// Relay settings when an endpoint is configured.
    pub fn relay_settings(&self) -> Option<HttpRelaySettings> {
        let endpoint = self.notifier_endpoint.clone()?;
        Some(HttpRelaySettings {
            endpoint,
            from_address: self
                .notifier_from
                .clone()
                .unwrap_or_else(|| "no-reply@clinic.invalid".to_owned()),
            api_token: self.notifier_token.clone(),
        })
    }
}
