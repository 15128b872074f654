//! Runtime configuration: backend access plus kiosk timings.

use std::time::Duration;

use kiosk_client::config::{env_or, ConfigError};
use kiosk_client::LockerApiConfig;
use kiosk_core::{LockerRange, DEFAULT_LOCKER_COUNT};
use kiosk_state::ReturnDelay;

/// Default status poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 6;
/// Default exit-animation delay of a screen switch in milliseconds.
pub const DEFAULT_SCREEN_TRANSITION_MS: u64 = 300;
/// Default delay before returning home when a password is displayed.
pub const DEFAULT_PASSWORD_RETURN_SECS: u64 = 15;
/// Default delay before returning home after a plain confirmation.
pub const DEFAULT_CONFIRM_RETURN_SECS: u64 = 3;

/// Everything the kiosk runtime needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KioskConfig {
    /// Backend access.
    pub api: LockerApiConfig,
    /// Highest valid locker id.
    pub locker_count: u32,
    /// Status poller period.
    pub poll_interval: Duration,
    /// Exit-animation delay between hiding one screen and showing the next.
    pub screen_transition: Duration,
    /// Completion screen time when a retrieval password is shown.
    pub password_return: Duration,
    /// Completion screen time otherwise.
    pub confirm_return: Duration,
}

impl KioskConfig {
    /// Default timings around `api`.
    pub fn new(api: LockerApiConfig) -> Self {
        Self {
            api,
            locker_count: DEFAULT_LOCKER_COUNT,
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            screen_transition: Duration::from_millis(DEFAULT_SCREEN_TRANSITION_MS),
            password_return: Duration::from_secs(DEFAULT_PASSWORD_RETURN_SECS),
            confirm_return: Duration::from_secs(DEFAULT_CONFIRM_RETURN_SECS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Variables (in addition to those of [`LockerApiConfig::from_env`]):
    /// - `KIOSK_LOCKER_COUNT` (default: 15)
    /// - `KIOSK_POLL_INTERVAL_SECS` (default: 6)
    /// - `KIOSK_SCREEN_TRANSITION_MS` (default: 300)
    /// - `KIOSK_PASSWORD_RETURN_SECS` (default: 15)
    /// - `KIOSK_CONFIRM_RETURN_SECS` (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api: LockerApiConfig::from_env()?,
            locker_count: env_or("KIOSK_LOCKER_COUNT", DEFAULT_LOCKER_COUNT)?,
            poll_interval: Duration::from_secs(env_or(
                "KIOSK_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )?),
            screen_transition: Duration::from_millis(env_or(
                "KIOSK_SCREEN_TRANSITION_MS",
                DEFAULT_SCREEN_TRANSITION_MS,
            )?),
            password_return: Duration::from_secs(env_or(
                "KIOSK_PASSWORD_RETURN_SECS",
                DEFAULT_PASSWORD_RETURN_SECS,
            )?),
            confirm_return: Duration::from_secs(env_or(
                "KIOSK_CONFIRM_RETURN_SECS",
                DEFAULT_CONFIRM_RETURN_SECS,
            )?),
        })
    }

    /// Valid locker ids.
    pub fn range(&self) -> LockerRange {
        LockerRange::new(self.locker_count)
    }

    /// Concrete duration of a completion delay class.
    pub fn return_delay(&self, delay: ReturnDelay) -> Duration {
        match delay {
            ReturnDelay::PasswordDisplay => self.password_return,
            ReturnDelay::Confirmation => self.confirm_return,
        }
    }
}
