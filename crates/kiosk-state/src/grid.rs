//! # Locker Grid Presenter
//!
//! Derives, for every installed locker, the style class and whether its
//! button accepts input. The derivation is pure and idempotent; it is
//! recomputed in full after every poll and every selection change.
//!
//! ## Policy
//!
//! - An open locker is disabled unless it is the selection or the locker of
//!   the active request or session.
//! - Deposit: an occupied locker is enabled solely when it is the locker of
//!   the active request or session.
//! - Withdrawal: occupied lockers are enabled; the parcel being collected
//!   sits in one.
//! - A locker missing from the payload is shown as available.

use chrono::{DateTime, Utc};
use kiosk_core::{FlowKind, LockerId, LockerRange, LockerStatus, StatusMap};
use serde::{Deserialize, Serialize};

/// Presentation of one locker button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockerCell {
    /// Locker id, also the button label.
    pub id: LockerId,
    /// Status class (`available`, `occupied`, `open`).
    pub status: LockerStatus,
    /// Whether this is the user's selection.
    pub selected: bool,
    /// Whether the button accepts input.
    pub enabled: bool,
}

/// The full grid for one flow screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridView {
    /// Flow the grid is shown on.
    pub flow: FlowKind,
    /// One cell per installed locker, ascending ids.
    pub cells: Vec<LockerCell>,
    /// Time of the status fetch the grid reflects.
    pub updated_at: Option<DateTime<Utc>>,
}

impl GridView {
    /// Cell for `id`, if installed.
    pub fn cell(&self, id: LockerId) -> Option<&LockerCell> {
        self.cells.iter().find(|cell| cell.id == id)
    }
}

/// Compute the cells of every locker in `range`.
///
/// `active` is the locker of the flow's in-flight open request or session.
pub fn present_grid(
    range: LockerRange,
    statuses: &StatusMap,
    flow: FlowKind,
    selection: Option<LockerId>,
    active: Option<LockerId>,
) -> Vec<LockerCell> {
    range
        .ids()
        .map(|id| {
            let status = statuses.get(id).unwrap_or(LockerStatus::Available);
            let selected = selection == Some(id);
            LockerCell {
                id,
                status,
                selected,
                enabled: is_enabled(flow, status, selected, active == Some(id)),
            }
        })
        .collect()
}

/// Whether a locker last reported as `status` may be chosen in `flow`.
pub fn is_selectable(flow: FlowKind, status: LockerStatus) -> bool {
    match status {
        LockerStatus::Available => true,
        LockerStatus::Occupied => flow == FlowKind::Withdrawal,
        LockerStatus::Open => false,
    }
}

fn is_enabled(flow: FlowKind, status: LockerStatus, selected: bool, in_session: bool) -> bool {
    if in_session || is_selectable(flow, status) {
        return true;
    }
    selected && status == LockerStatus::Open
}
