//! Backend client configuration.
//!
//! The kiosk talks to a single backend base URL. Defaults target the
//! backend running on the kiosk itself; override via environment variables
//! or explicit construction for testing.

use std::str::FromStr;

use url::Url;

/// Default backend base URL.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Configuration for connecting to the locker backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockerApiConfig {
    /// Base URL; endpoint paths (`/api/...`) are appended to it.
    pub base_url: Url,
    /// Transport timeout in seconds. `None` disables the timeout.
    pub timeout_secs: Option<u64>,
}

impl LockerApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `KIOSK_BACKEND_URL` (default: `http://localhost:8000`)
    /// - `KIOSK_REQUEST_TIMEOUT_SECS` (default: unset, no timeout)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: env_url("KIOSK_BACKEND_URL", DEFAULT_BACKEND_URL)?,
            timeout_secs: env_opt("KIOSK_REQUEST_TIMEOUT_SECS")?,
        })
    }

    /// Configuration pointing at a local mock server (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the localhost URL cannot be parsed.
    pub fn local_mock(port: u16) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("localhost", &format!("http://127.0.0.1:{port}"))?,
            timeout_secs: Some(5),
        })
    }

    /// Configuration for an explicit base URL, no timeout.
    pub fn with_base_url(raw: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("base_url", raw)?,
            timeout_secs: None,
        })
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

/// Read `var` as a number, `Ok(None)` when unset or empty.
pub fn env_opt<T>(var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidNumber(var.to_string(), e.to_string())),
        _ => Ok(None),
    }
}

/// Read `var` as a number, `default` when unset.
pub fn env_or<T>(var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(env_opt(var)?.unwrap_or(default))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid number for {0}: {1}")]
    InvalidNumber(String, String),
}
