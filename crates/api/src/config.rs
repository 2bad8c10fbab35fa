use std::path::PathBuf;

use chrono::Duration;
use oneshot_core::journey::ranking::{
    CadencePolicy, DEFAULT_MAX_NOTIFICATIONS_PER_RUN, DEFAULT_MIN_NOTIFICATION_INTERVAL_HOURS,
    DEFAULT_REMINDER_AFTER_DAYS,
};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    /// Catalog source and notification cadence.
    pub journey: JourneyConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            journey: JourneyConfig::from_env(),
        }
    }
}

/// Journey engine configuration.
#[derive(Debug, Clone, Default)]
pub struct JourneyConfig {
    /// Catalog file to load instead of the embedded default.
    pub catalog_path: Option<PathBuf>,
    pub cadence: CadencePolicy,
}

impl JourneyConfig {
    /// | Env Var                           | Default          |
    /// |-----------------------------------|------------------|
    /// | `CATALOG_PATH`                    | embedded catalog |
    /// | `REMINDER_AFTER_DAYS`             | `3`              |
    /// | `MIN_NOTIFICATION_INTERVAL_HOURS` | `24`             |
    /// | `MAX_NOTIFICATIONS_PER_RUN`       | `3`              |
    pub fn from_env() -> Self {
        let catalog_path = std::env::var("CATALOG_PATH")
            .ok()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let reminder_after_days: i64 = std::env::var("REMINDER_AFTER_DAYS")
            .unwrap_or_else(|_| DEFAULT_REMINDER_AFTER_DAYS.to_string())
            .parse()
            .expect("REMINDER_AFTER_DAYS must be a valid i64");

        let min_interval_hours: i64 = std::env::var("MIN_NOTIFICATION_INTERVAL_HOURS")
            .unwrap_or_else(|_| DEFAULT_MIN_NOTIFICATION_INTERVAL_HOURS.to_string())
            .parse()
            .expect("MIN_NOTIFICATION_INTERVAL_HOURS must be a valid i64");

        let max_per_run: usize = std::env::var("MAX_NOTIFICATIONS_PER_RUN")
            .unwrap_or_else(|_| DEFAULT_MAX_NOTIFICATIONS_PER_RUN.to_string())
            .parse()
            .expect("MAX_NOTIFICATIONS_PER_RUN must be a valid usize");

        Self {
            catalog_path,
            cadence: CadencePolicy {
                reminder_after: Duration::days(reminder_after_days),
                min_interval: Duration::hours(min_interval_hours),
                max_per_run,
            },
        }
    }
}
