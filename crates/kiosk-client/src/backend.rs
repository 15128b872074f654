//! The seam between the kiosk runtime and the backend.
//!
//! [`LockerBackend`] lists every call the kiosk makes. The runtime is
//! generic over it so tests can drive the kiosk with an in-memory backend;
//! [`crate::LockerClient`] is the HTTP implementation.

use std::future::Future;

use kiosk_core::{ClosetId, LockerId, Secret, StatusMap};

use crate::error::LockerApiError;
use crate::wire::{CloseReceipt, HealthStatus, OpenReceipt};

/// Operations the kiosk needs from the locker backend.
pub trait LockerBackend: Send + Sync + 'static {
    /// Open `locker_id` for a courier.
    fn open_deposit(
        &self,
        tracking_code: &str,
        locker_id: LockerId,
    ) -> impl Future<Output = Result<OpenReceipt, LockerApiError>> + Send;

    /// Close a deposit; the receipt may carry the retrieval password.
    fn close_deposit(
        &self,
        locker_id: LockerId,
        closet_id: &ClosetId,
        tracking_code: &str,
    ) -> impl Future<Output = Result<CloseReceipt, LockerApiError>> + Send;

    /// Open `locker_id` for a recipient holding `password`.
    fn open_withdrawal(
        &self,
        password: &Secret,
        locker_id: LockerId,
    ) -> impl Future<Output = Result<OpenReceipt, LockerApiError>> + Send;

    /// Close a withdrawal.
    fn close_withdrawal(
        &self,
        locker_id: LockerId,
        closet_id: &ClosetId,
    ) -> impl Future<Output = Result<CloseReceipt, LockerApiError>> + Send;

    /// Current status of every locker.
    fn locker_statuses(&self) -> impl Future<Output = Result<StatusMap, LockerApiError>> + Send;

    /// Liveness check.
    fn health_check(&self) -> impl Future<Output = Result<HealthStatus, LockerApiError>> + Send;
}
