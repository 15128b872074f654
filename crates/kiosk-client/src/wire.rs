//! JSON bodies exchanged with the backend.
//!
//! | Method | Path | Request | Response |
//! |--------|------|---------|----------|
//! | POST | `/api/deposit/open` | `{trackingCode, lockerId}` | `{closetId, message?}` |
//! | POST | `/api/deposit/close` | `{lockerId, closetId, trackingCode}` | `{password?, message?}` |
//! | POST | `/api/withdraw/open` | `{password, lockerId}` | `{closetId, message?}` |
//! | POST | `/api/withdraw/close` | `{lockerId, closetId}` | `{message?}` |
//! | GET | `/api/lockers/status` | | `{lockers: [{id, status}]}` |
//! | GET | `/api/ping` | | `{status}` |
//!
//! Error responses carry `{message}`.

use kiosk_core::{ClosetId, LockerId, LockerStatus, Secret, StatusMap};
use serde::{Deserialize, Serialize};

// -- Requests -----------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DepositOpenBody<'a> {
    pub tracking_code: &'a str,
    pub locker_id: LockerId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DepositCloseBody<'a> {
    pub locker_id: LockerId,
    pub closet_id: &'a ClosetId,
    pub tracking_code: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WithdrawOpenBody<'a> {
    pub password: &'a Secret,
    pub locker_id: LockerId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WithdrawCloseBody<'a> {
    pub locker_id: LockerId,
    pub closet_id: &'a ClosetId,
}

// -- Responses ----------------------------------------------------------------

/// Successful open of either flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenReceipt {
    /// Opaque closet id to echo on close.
    pub closet_id: ClosetId,
    /// Optional server text.
    #[serde(default)]
    pub message: Option<String>,
}

/// Successful close of either flow.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseReceipt {
    /// Retrieval password, returned by deposit close.
    #[serde(default)]
    pub password: Option<Secret>,
    /// Optional server text.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LockerEntry {
    id: LockerId,
    status: LockerStatus,
}

/// `GET /api/lockers/status` payload. An unknown status string fails the
/// whole payload.
#[derive(Debug, Deserialize)]
pub(crate) struct StatusPayload {
    lockers: Vec<LockerEntry>,
}

impl StatusPayload {
    pub(crate) fn into_map(self) -> StatusMap {
        self.lockers.into_iter().map(|e| (e.id, e.status)).collect()
    }
}

/// `GET /api/ping` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `"ok"` when the backend is healthy.
    pub status: String,
}

impl HealthStatus {
    /// Whether the backend reported `ok`.
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// `message` of an error body, if it is JSON and has one.
pub(crate) fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body).ok()?.message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_bodies_use_camel_case() {
        let closet = ClosetId::from("C9");
        let body = DepositCloseBody {
            locker_id: LockerId::from_raw(4),
            closet_id: &closet,
            tracking_code: "PKG123",
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"lockerId": 4, "closetId": "C9", "trackingCode": "PKG123"})
        );

        let password = Secret::new("482913");
        let body = WithdrawOpenBody {
            password: &password,
            locker_id: LockerId::from_raw(2),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"password": "482913", "lockerId": 2})
        );
    }

    #[test]
    fn close_receipt_fields_are_optional() {
        let receipt: CloseReceipt = serde_json::from_value(json!({})).unwrap();
        assert_eq!(receipt, CloseReceipt::default());

        let receipt: CloseReceipt =
            serde_json::from_value(json!({"password": "7731", "message": "Done"})).unwrap();
        assert_eq!(receipt.password.unwrap().expose(), "7731");
    }

    #[test]
    fn status_payload_rejects_unknown_status() {
        let bad = json!({"lockers": [{"id": 1, "status": "jammed"}]});
        assert!(serde_json::from_value::<StatusPayload>(bad).is_err());

        let good = json!({"lockers": [{"id": 1, "status": "open"}, {"id": 2, "status": "available"}]});
        let map = serde_json::from_value::<StatusPayload>(good).unwrap().into_map();
        assert_eq!(map.get(LockerId::from_raw(1)), Some(LockerStatus::Open));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn error_message_extraction() {
        assert_eq!(
            error_message(r#"{"message":"Invalid password"}"#).as_deref(),
            Some("Invalid password")
        );
        assert_eq!(error_message("Bad Gateway"), None);
        assert_eq!(error_message(r#"{"error":"x"}"#), None);
    }
}
