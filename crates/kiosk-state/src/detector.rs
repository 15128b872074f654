//! # Door-Closure Detection
//!
//! Infers from polled status alone that the user finished with the locker:
//! a deposit is done once its locker reads `occupied`, a withdrawal once its
//! locker reads `available`.
//!
//! Detection is edge-triggered. The detector is armed with the status the
//! cache held when the session was created and fires only on a change *to*
//! the target status, so a poll that keeps reporting the target value never
//! fires twice, and a locker that already showed the target at creation
//! must first be observed in another state.

use kiosk_core::{FlowKind, LockerId, LockerStatus, StatusMap};

/// Status that signals a completed transaction for `flow`.
pub fn door_closed_status(flow: FlowKind) -> LockerStatus {
    match flow {
        FlowKind::Deposit => LockerStatus::Occupied,
        FlowKind::Withdrawal => LockerStatus::Available,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Watch {
    locker_id: LockerId,
    target: LockerStatus,
    last_seen: Option<LockerStatus>,
}

/// Edge detector for one flow's session locker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoorClosureDetector {
    watch: Option<Watch>,
}

impl DoorClosureDetector {
    /// Disarmed detector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start watching `locker_id`. `baseline` is the cached status at the
    /// time the session was created, if any.
    pub fn arm(&mut self, flow: FlowKind, locker_id: LockerId, baseline: Option<LockerStatus>) {
        self.watch = Some(Watch {
            locker_id,
            target: door_closed_status(flow),
            last_seen: baseline,
        });
    }

    /// Stop watching.
    pub fn disarm(&mut self) {
        self.watch = None;
    }

    /// Whether a locker is being watched.
    pub fn is_armed(&self) -> bool {
        self.watch.is_some()
    }

    /// Feed one poll result. Returns `true` when the watched locker has just
    /// changed to the target status.
    ///
    /// A payload that omits the locker carries no information and leaves the
    /// remembered status untouched.
    pub fn observe(&mut self, statuses: &StatusMap) -> bool {
        let Some(watch) = self.watch.as_mut() else {
            return false;
        };
        let Some(current) = statuses.get(watch.locker_id) else {
            return false;
        };
        let fired = current == watch.target && watch.last_seen != Some(watch.target);
        watch.last_seen = Some(current);
        fired
    }
}
