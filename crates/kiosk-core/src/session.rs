//! # Transaction Sessions
//!
//! A session is the kiosk's record of one in-progress deposit or
//! withdrawal. It is created when the backend accepts the open request and
//! carries everything the matching close request needs.

use serde::{Deserialize, Serialize};

use crate::locker::LockerId;

/// The two transaction flows offered by the kiosk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    /// A courier places a parcel and receives a retrieval password.
    Deposit,
    /// A recipient removes a parcel using its retrieval password.
    Withdrawal,
}

impl FlowKind {
    /// Both flows, deposit first.
    pub const ALL: [FlowKind; 2] = [FlowKind::Deposit, FlowKind::Withdrawal];

    /// Lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Backend-assigned identifier of the locker bank, opaque to the kiosk.
///
/// Deployed backends return it either as a string or as an integer; the
/// original JSON shape is preserved for the close request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClosetId {
    /// String form, e.g. `"C9"`.
    Text(String),
    /// Integer form, e.g. `4821`.
    Number(i64),
}

impl std::fmt::Display for ClosetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for ClosetId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// A password that must not appear in logs.
///
/// `Debug` is redacted; use [`Secret::expose`] where the value is needed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Flow-specific part of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPayload {
    /// Deposit sessions echo the tracking code on close.
    Deposit {
        /// Courier-supplied tracking code.
        tracking_code: String,
    },
    /// Withdrawal sessions need nothing beyond the consumed password.
    Withdrawal,
}

/// An in-progress transaction for one locker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The locker being used.
    pub locker_id: LockerId,
    /// Closet id returned by the open call.
    pub closet_id: ClosetId,
    /// Flow-specific data.
    pub payload: SessionPayload,
}

impl Session {
    /// Deposit session for `locker_id`.
    pub fn deposit(locker_id: LockerId, closet_id: ClosetId, tracking_code: impl Into<String>) -> Self {
        Self {
            locker_id,
            closet_id,
            payload: SessionPayload::Deposit {
                tracking_code: tracking_code.into(),
            },
        }
    }

    /// Withdrawal session for `locker_id`.
    pub fn withdrawal(locker_id: LockerId, closet_id: ClosetId) -> Self {
        Self {
            locker_id,
            closet_id,
            payload: SessionPayload::Withdrawal,
        }
    }

    /// Which flow this session belongs to.
    pub fn flow(&self) -> FlowKind {
        match self.payload {
            SessionPayload::Deposit { .. } => FlowKind::Deposit,
            SessionPayload::Withdrawal => FlowKind::Withdrawal,
        }
    }

    /// Tracking code of a deposit session.
    pub fn tracking_code(&self) -> Option<&str> {
        match &self.payload {
            SessionPayload::Deposit { tracking_code } => Some(tracking_code),
            SessionPayload::Withdrawal => None,
        }
    }
}
