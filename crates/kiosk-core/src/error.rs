//! # Validation Errors
//!
//! Local input problems detected before any network call is made. These
//! are non-fatal: the flow stays in its selection phase and the user is
//! re-prompted with [`ValidationError::user_message`].

use thiserror::Error;

use crate::locker::{LockerId, LockerStatus};

/// A submission or selection rejected by local validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Deposit submitted without a tracking code.
    #[error("tracking code is required")]
    MissingTrackingCode,

    /// Withdrawal submitted without a password.
    #[error("password is required")]
    MissingPassword,

    /// Submitted without choosing a locker.
    #[error("no locker selected")]
    NoSelection,

    /// Selected locker lies outside the installed range.
    #[error("locker {id} is outside the valid range 1..={max}")]
    LockerOutOfRange {
        /// The rejected raw id.
        id: u32,
        /// Highest valid id of the installation.
        max: u32,
    },

    /// Selected locker was occupied or open when it was chosen.
    #[error("locker {id} is {status} and cannot be selected")]
    LockerUnavailable {
        /// The locker the user tried to select.
        id: LockerId,
        /// Its last-known status.
        status: LockerStatus,
    },
}

impl ValidationError {
    /// Warning text shown on the kiosk screen.
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingTrackingCode => "Please enter the tracking code.".to_string(),
            Self::MissingPassword => "Please enter your password.".to_string(),
            Self::NoSelection => "Please choose a locker.".to_string(),
            Self::LockerOutOfRange { max, .. } => {
                format!("Please choose a locker between 1 and {max}.")
            }
            Self::LockerUnavailable { id, .. } => {
                format!("Locker {id} is not available, please choose another one.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_mentions_bounds() {
        let err = ValidationError::LockerOutOfRange { id: 16, max: 15 };
        assert_eq!(err.to_string(), "locker 16 is outside the valid range 1..=15");
        assert!(err.user_message().contains("between 1 and 15"));
    }

    #[test]
    fn unavailable_mentions_status() {
        let err = ValidationError::LockerUnavailable {
            id: LockerId::from_raw(3),
            status: LockerStatus::Occupied,
        };
        assert_eq!(err.to_string(), "locker 3 is occupied and cannot be selected");
        assert!(err.user_message().starts_with("Locker 3"));
    }
}
