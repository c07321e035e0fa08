use std::env;
use tracing::warn;

pub const DEFAULT_APPOINTMENTS_SERVICE_URL: &str = "http://localhost:8001/api/v1/appointments";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the appointments service. Empty selects the in-memory directory.
    pub appointments_service_url: String,
    pub request_timeout_secs: u64,
    pub session_ttl_minutes: i64,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            appointments_service_url: env::var("APPOINTMENTS_SERVICE_URL")
                .unwrap_or_else(|_| {
                    warn!("APPOINTMENTS_SERVICE_URL not set, using default");
                    DEFAULT_APPOINTMENTS_SERVICE_URL.to_string()
                }),
            request_timeout_secs: parse_or("APPOINTMENTS_REQUEST_TIMEOUT_SECS", 30),
            session_ttl_minutes: parse_or("WIZARD_SESSION_TTL_MINUTES", 30),
            server_port: parse_or("PORT", 3000),
        };

        if !config.is_remote_configured() {
            warn!("Appointments service URL is empty - booking against the in-memory directory");
        }

        config
    }

    /// Configuration for running without an appointments service.
    pub fn in_memory() -> Self {
        Self {
            appointments_service_url: String::new(),
            request_timeout_secs: 30,
            session_ttl_minutes: 30,
            server_port: 3000,
        }
    }

    pub fn is_remote_configured(&self) -> bool {
        !self.appointments_service_url.trim().is_empty()
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {}", key, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using default {}", key, default);
            default
        }
    }
}
