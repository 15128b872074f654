//! # Session Store
//!
//! Owns everything the kiosk remembers between events: the deposit and
//! withdrawal machines and the cached locker statuses. The runtime holds a
//! single store and passes it where needed; [`SessionStore::reset`] is the
//! one way back to a clean state.

use chrono::{DateTime, Utc};
use kiosk_core::{
    ClosetId, FlowKind, LockerId, LockerRange, Secret, Session, StatusMap, StatusSnapshot,
};

use crate::grid::{present_grid, GridView};
use crate::machine::{
    CloseRequest, CloseTrigger, Completion, FlowError, FlowMachine, OpenRequest, Ticket,
};

/// Last successfully fetched status mapping.
///
/// Each snapshot replaces the previous one whole; entries are never merged.
#[derive(Debug, Clone, Default)]
pub struct StatusCache {
    statuses: StatusMap,
    updated_at: Option<DateTime<Utc>>,
}

impl StatusCache {
    /// Nothing fetched yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached mapping.
    pub fn replace(&mut self, snapshot: StatusSnapshot) {
        self.statuses = snapshot.statuses;
        self.updated_at = Some(snapshot.fetched_at);
    }

    /// The cached mapping, empty before the first fetch.
    pub fn statuses(&self) -> &StatusMap {
        &self.statuses
    }

    /// When the cached mapping was fetched.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

/// Both flow machines plus the status cache.
#[derive(Debug, Clone)]
pub struct SessionStore {
    range: LockerRange,
    cache: StatusCache,
    deposit: FlowMachine,
    withdrawal: FlowMachine,
}

impl SessionStore {
    /// Fresh store for lockers in `range`.
    pub fn new(range: LockerRange) -> Self {
        Self {
            range,
            cache: StatusCache::new(),
            deposit: FlowMachine::new(FlowKind::Deposit, range),
            withdrawal: FlowMachine::new(FlowKind::Withdrawal, range),
        }
    }

    /// Accepted locker ids.
    pub fn range(&self) -> LockerRange {
        self.range
    }

    /// Cached statuses.
    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    /// Machine of `flow`.
    pub fn flow(&self, flow: FlowKind) -> &FlowMachine {
        match flow {
            FlowKind::Deposit => &self.deposit,
            FlowKind::Withdrawal => &self.withdrawal,
        }
    }

    fn flow_mut(&mut self, flow: FlowKind) -> &mut FlowMachine {
        match flow {
            FlowKind::Deposit => &mut self.deposit,
            FlowKind::Withdrawal => &mut self.withdrawal,
        }
    }

    /// Enter `flow`'s screen.
    pub fn enter(&mut self, flow: FlowKind) -> Result<(), FlowError> {
        self.flow_mut(flow).enter()
    }

    /// Update the tracking code or password draft of `flow`.
    pub fn set_input(&mut self, flow: FlowKind, text: impl Into<String>) -> Result<(), FlowError> {
        self.flow_mut(flow).set_input(text)
    }

    /// Select locker `raw` in `flow`, checked against the cached statuses.
    pub fn select(&mut self, flow: FlowKind, raw: u32) -> Result<LockerId, FlowError> {
        let Self {
            cache,
            deposit,
            withdrawal,
            ..
        } = self;
        let machine = match flow {
            FlowKind::Deposit => deposit,
            FlowKind::Withdrawal => withdrawal,
        };
        machine.select(raw, cache.statuses())
    }

    /// Submit `flow`'s input; see [`FlowMachine::submit`].
    pub fn submit(&mut self, flow: FlowKind) -> Result<OpenRequest, FlowError> {
        self.flow_mut(flow).submit()
    }

    /// Apply a successful open response and return the new session. The
    /// door detector is seeded with the cached status of the opened locker.
    pub fn open_succeeded(
        &mut self,
        ticket: Ticket,
        closet_id: ClosetId,
        message: Option<String>,
    ) -> Result<Session, FlowError> {
        let machine = self.flow(ticket.flow());
        let baseline = machine
            .active_locker()
            .and_then(|id| self.cache.statuses().get(id));
        self.flow_mut(ticket.flow())
            .open_succeeded(ticket, closet_id, message, baseline)
            .cloned()
    }

    /// Apply a failed open response.
    pub fn open_failed(&mut self, ticket: Ticket, message: impl Into<String>) -> Result<(), FlowError> {
        self.flow_mut(ticket.flow()).open_failed(ticket, message)
    }

    /// Ask to close `flow`'s session; see [`FlowMachine::request_close`].
    pub fn request_close(
        &mut self,
        flow: FlowKind,
        trigger: CloseTrigger,
    ) -> Result<Option<CloseRequest>, FlowError> {
        self.flow_mut(flow).request_close(trigger)
    }

    /// Apply a successful close response.
    pub fn close_succeeded(
        &mut self,
        ticket: Ticket,
        password: Option<Secret>,
        message: Option<String>,
    ) -> Result<Completion, FlowError> {
        self.flow_mut(ticket.flow()).close_succeeded(ticket, password, message)
    }

    /// Apply a failed close response.
    pub fn close_failed(&mut self, ticket: Ticket, message: impl Into<String>) -> Result<(), FlowError> {
        self.flow_mut(ticket.flow()).close_failed(ticket, message)
    }

    /// Replace the cache with `snapshot` and let both flows react. Returns
    /// the close requests raised by door detection.
    pub fn apply_snapshot(&mut self, snapshot: StatusSnapshot) -> Vec<CloseRequest> {
        self.cache.replace(snapshot);
        let statuses = self.cache.statuses();
        [&mut self.deposit, &mut self.withdrawal]
            .into_iter()
            .filter_map(|machine| machine.observe(statuses))
            .collect()
    }

    /// Grid for `flow` from the cached statuses and its selection.
    pub fn grid(&self, flow: FlowKind) -> GridView {
        let machine = self.flow(flow);
        GridView {
            flow,
            cells: present_grid(
                self.range,
                self.cache.statuses(),
                flow,
                machine.selection(),
                machine.active_locker(),
            ),
            updated_at: self.cache.updated_at(),
        }
    }

    /// Whether either flow has a session or request in progress.
    pub fn has_activity(&self) -> bool {
        FlowKind::ALL
            .iter()
            .any(|flow| self.flow(*flow).active_locker().is_some())
    }

    /// Drop both sessions, selections and drafts. The status cache is kept.
    pub fn reset(&mut self) {
        self.deposit.reset();
        self.withdrawal.reset();
    }
}
