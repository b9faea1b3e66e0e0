//! Runtime configuration, read once from the environment at startup.
//!
//! Secrets, thresholds, and timeouts are supplied externally; nothing
//! here is computed or defaulted in a way that hides a missing secret.

use std::time::Duration;

use paygate_pipeline::domain::notification::FallbackPolicy;

use crate::error::AppError;

/// All externally supplied configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Shared secret the provider signs webhook bodies with.
    pub webhook_secret: String,
    /// Accepted clock skew for signature timestamps.
    pub signature_tolerance: Duration,
    /// Requests allowed per source per window.
    pub rate_limit_max: u64,
    /// Rate-limit window length.
    pub rate_limit_window: Duration,
    /// Timeout for one ledger apply call.
    pub ledger_timeout: Duration,
    /// Timeout for one notification send attempt.
    pub notify_timeout: Duration,
    /// Which notification failures fall through to the next path.
    pub notify_fallback_policy: FallbackPolicy,
    /// Age after which a `processing` row counts as stuck.
    pub stale_processing_after: Duration,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when a required variable is missing
    /// or a value does not parse.
    pub fn from_env() -> Result<Self, AppError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_owned()),
            port: parsed("PORT", 3000)?,
            webhook_secret: required("WEBHOOK_SECRET")?,
            signature_tolerance: seconds("SIGNATURE_TOLERANCE_SECS", 300)?,
            rate_limit_max: parsed("RATE_LIMIT_MAX", 120)?,
            rate_limit_window: seconds("RATE_LIMIT_WINDOW_SECS", 60)?,
            ledger_timeout: seconds("LEDGER_TIMEOUT_SECS", 10)?,
            notify_timeout: seconds("NOTIFY_TIMEOUT_SECS", 5)?,
            notify_fallback_policy: fallback_policy()?,
            stale_processing_after: seconds("STALE_PROCESSING_SECS", 900)?,
        })
    }
}

fn required(name: &str) -> Result<String, AppError> {
    std::env::var(name)
        .map_err(|_| AppError::Config(format!("{name} environment variable must be set")))
}

fn parsed<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AppError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| AppError::Config(format!("{name} is invalid: {e}"))),
        Err(_) => Ok(default),
    }
}

fn seconds(name: &str, default: u64) -> Result<Duration, AppError> {
    Ok(Duration::from_secs(parsed(name, default)?))
}

fn fallback_policy() -> Result<FallbackPolicy, AppError> {
    match std::env::var("NOTIFY_FALLBACK_POLICY").as_deref() {
        Ok("any") | Err(_) => Ok(FallbackPolicy::AnyError),
        Ok("transient") => Ok(FallbackPolicy::TransientOnly),
        Ok(other) => Err(AppError::Config(format!(
            "NOTIFY_FALLBACK_POLICY must be 'any' or 'transient', got '{other}'"
        ))),
    }
}
