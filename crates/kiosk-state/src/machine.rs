//! # Flow Session State Machine
//!
//! One [`FlowMachine`] per flow drives a deposit or withdrawal through its
//! lifecycle.
//!
//! ## Phases
//!
//! IDLE → SELECTING → OPENING → OPEN → CLOSING → IDLE
//!
//! Failure edges: OPENING → SELECTING (open rejected), CLOSING → OPEN
//! (close rejected, session retained so the close can be re-offered).
//!
//! ## Requests and Tickets
//!
//! The machine performs no I/O. Transitions that need the backend return a
//! request value ([`OpenRequest`], [`CloseRequest`]) stamped with a
//! [`Ticket`]; the caller performs the call and reports the outcome with
//! that ticket. Issuing a new request or calling [`FlowMachine::reset`]
//! retires every earlier ticket, so a response arriving after the user left
//! the flow is refused with [`FlowError::StaleResponse`].
//!
//! ## Single Close
//!
//! [`FlowMachine::request_close`] issues a close request only from OPEN.
//! While CLOSING, further triggers (manual button or door detector) are
//! absorbed and return `Ok(None)`.

use kiosk_core::{
    ClosetId, FlowKind, LockerId, LockerRange, LockerStatus, Secret, Session, StatusMap,
    ValidationError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detector::DoorClosureDetector;
use crate::grid::is_selectable;
use crate::notice::Notice;

const OPENING_TEXT: &str = "Requesting...";
const DEPOSIT_CLOSING_TEXT: &str = "Verifying and closing...";
const WITHDRAWAL_CLOSING_TEXT: &str = "Closing...";

// ── Phases ──────────────────────────────────────────────────────────────

/// Lifecycle phase of a flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    /// Flow screen not entered, or the last transaction completed.
    Idle,
    /// Screen shown, user choosing a locker and typing input.
    Selecting,
    /// Open request in flight.
    Opening,
    /// Door open, session active, close offered.
    Open,
    /// Close request in flight.
    Closing,
}

impl SessionPhase {
    /// Whether a request is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }

    /// Uppercase name used in logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Selecting => "SELECTING",
            Self::Opening => "OPENING",
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Errors ──────────────────────────────────────────────────────────────

/// An operation attempted from a phase that does not allow it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot {action} in {flow} flow while {phase}")]
pub struct TransitionError {
    /// Flow the operation targeted.
    pub flow: FlowKind,
    /// Phase at the time of the attempt.
    pub phase: SessionPhase,
    /// What was attempted.
    pub action: &'static str,
}

/// Errors returned by [`FlowMachine`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// Local validation failed; the flow stays in SELECTING.
    #[error("{flow} input rejected: {reason}")]
    Validation {
        /// Flow that rejected the input.
        flow: FlowKind,
        /// What was wrong.
        reason: ValidationError,
    },

    /// The operation is not valid in the current phase.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// A response for a retired request.
    #[error("discarding stale {flow} response")]
    StaleResponse {
        /// Flow the response was addressed to.
        flow: FlowKind,
    },
}

// ── Requests and outcomes ───────────────────────────────────────────────

/// Identifies one backend request issued by a [`FlowMachine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    flow: FlowKind,
    seq: u64,
}

impl Ticket {
    /// Flow that issued the request.
    pub fn flow(&self) -> FlowKind {
        self.flow
    }
}

/// Input that authorises an open call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Deposit: the courier's tracking code.
    TrackingCode(String),
    /// Withdrawal: the retrieval password.
    Password(Secret),
}

/// An open call the caller must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    /// Report the outcome with this ticket.
    pub ticket: Ticket,
    /// Locker to open.
    pub locker_id: LockerId,
    /// Tracking code or password.
    pub credentials: Credentials,
}

/// What initiated a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseTrigger {
    /// The user pressed the close button.
    Manual,
    /// The door-closure detector observed the target status.
    DoorClosed,
}

impl CloseTrigger {
    /// Name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::DoorClosed => "door_closed",
        }
    }
}

impl std::fmt::Display for CloseTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A close call the caller must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRequest {
    /// Report the outcome with this ticket.
    pub ticket: Ticket,
    /// What initiated the close.
    pub trigger: CloseTrigger,
    /// The session being closed.
    pub session: Session,
}

/// How long the completion screen stays before returning home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnDelay {
    /// A retrieval password is on screen; give the user time to note it.
    PasswordDisplay,
    /// Plain confirmation.
    Confirmation,
}

/// Result of a successful close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Flow that completed.
    pub flow: FlowKind,
    /// Locker that was closed.
    pub locker_id: LockerId,
    /// What initiated the close.
    pub trigger: CloseTrigger,
    /// Retrieval password returned by a deposit close.
    pub password: Option<Secret>,
    /// Delay class before the automatic return home.
    pub return_delay: ReturnDelay,
}

#[derive(Debug, Clone)]
enum Pending {
    Open {
        ticket: Ticket,
        locker_id: LockerId,
        tracking_code: Option<String>,
    },
    Close {
        ticket: Ticket,
        trigger: CloseTrigger,
    },
}

// ── Machine ─────────────────────────────────────────────────────────────

/// Session lifecycle of one flow.
#[derive(Debug, Clone)]
pub struct FlowMachine {
    kind: FlowKind,
    range: LockerRange,
    phase: SessionPhase,
    input: String,
    selection: Option<LockerId>,
    session: Option<Session>,
    pending: Option<Pending>,
    detector: DoorClosureDetector,
    notice: Option<Notice>,
    seq: u64,
}

impl FlowMachine {
    /// Idle machine for `kind` accepting lockers in `range`.
    pub fn new(kind: FlowKind, range: LockerRange) -> Self {
        Self {
            kind,
            range,
            phase: SessionPhase::Idle,
            input: String::new(),
            selection: None,
            session: None,
            pending: None,
            detector: DoorClosureDetector::new(),
            notice: None,
            seq: 0,
        }
    }

    /// The flow this machine drives.
    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Accepted locker ids.
    pub fn range(&self) -> LockerRange {
        self.range
    }

    /// Currently selected locker.
    pub fn selection(&self) -> Option<LockerId> {
        self.selection
    }

    /// The active session, present in OPEN and CLOSING.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Draft tracking code or password as typed.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Message to show under the flow's controls.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Whether a request is in flight (show the loading indicator).
    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    /// Whether the close button should be offered.
    pub fn close_available(&self) -> bool {
        self.phase == SessionPhase::Open
    }

    /// Locker committed to a request or session (OPENING through CLOSING).
    pub fn active_locker(&self) -> Option<LockerId> {
        match (&self.pending, &self.session) {
            (_, Some(session)) => Some(session.locker_id),
            (Some(Pending::Open { locker_id, .. }), None) => Some(*locker_id),
            _ => None,
        }
    }

    /// IDLE → SELECTING: the flow screen was entered.
    pub fn enter(&mut self) -> Result<(), FlowError> {
        self.require(SessionPhase::Idle, "enter")?;
        self.phase = SessionPhase::Selecting;
        self.notice = None;
        Ok(())
    }

    /// Replace the tracking code or password draft.
    pub fn set_input(&mut self, text: impl Into<String>) -> Result<(), FlowError> {
        self.require(SessionPhase::Selecting, "edit input")?;
        self.input = text.into();
        Ok(())
    }

    /// Choose locker `raw`. Rejects ids outside the range and lockers whose
    /// last-known status rules them out for this flow (open, or occupied in
    /// a deposit); the previous selection is kept on rejection.
    pub fn select(&mut self, raw: u32, statuses: &StatusMap) -> Result<LockerId, FlowError> {
        self.require(SessionPhase::Selecting, "select a locker")?;
        let id = match self.range.validate(Some(raw)) {
            Ok(id) => id,
            Err(reason) => return Err(self.reject(reason)),
        };
        if let Some(status) = statuses.get(id).filter(|s| !is_selectable(self.kind, *s)) {
            return Err(self.reject(ValidationError::LockerUnavailable { id, status }));
        }
        self.selection = Some(id);
        self.notice = None;
        Ok(id)
    }

    /// Drop the current selection.
    pub fn clear_selection(&mut self) -> Result<(), FlowError> {
        self.require(SessionPhase::Selecting, "clear the selection")?;
        self.selection = None;
        Ok(())
    }

    /// SELECTING → OPENING. Validates input and selection; on failure the
    /// phase is unchanged, a warning notice is set and no request is made.
    pub fn submit(&mut self) -> Result<OpenRequest, FlowError> {
        self.require(SessionPhase::Selecting, "submit")?;

        let input = self.input.trim().to_string();
        if input.is_empty() {
            let reason = match self.kind {
                FlowKind::Deposit => ValidationError::MissingTrackingCode,
                FlowKind::Withdrawal => ValidationError::MissingPassword,
            };
            return Err(self.reject(reason));
        }
        let locker_id = match self.range.validate(self.selection.map(LockerId::get)) {
            Ok(id) => id,
            Err(reason) => return Err(self.reject(reason)),
        };

        let ticket = self.next_ticket();
        let (credentials, tracking_code) = match self.kind {
            FlowKind::Deposit => (Credentials::TrackingCode(input.clone()), Some(input)),
            FlowKind::Withdrawal => (Credentials::Password(Secret::new(input)), None),
        };
        self.pending = Some(Pending::Open {
            ticket,
            locker_id,
            tracking_code,
        });
        self.phase = SessionPhase::Opening;
        self.notice = Some(Notice::progress(OPENING_TEXT));

        Ok(OpenRequest {
            ticket,
            locker_id,
            credentials,
        })
    }

    /// OPENING → OPEN. Creates the session and arms the door detector with
    /// `baseline`, the cached status of the locker right now.
    pub fn open_succeeded(
        &mut self,
        ticket: Ticket,
        closet_id: ClosetId,
        message: Option<String>,
        baseline: Option<LockerStatus>,
    ) -> Result<&Session, FlowError> {
        let (locker_id, tracking_code) = match self.pending.take() {
            Some(Pending::Open {
                ticket: issued,
                locker_id,
                tracking_code,
            }) if issued == ticket => (locker_id, tracking_code),
            other => {
                self.pending = other;
                return Err(FlowError::StaleResponse { flow: self.kind });
            }
        };

        let session = match tracking_code {
            Some(code) => Session::deposit(locker_id, closet_id, code),
            None => Session::withdrawal(locker_id, closet_id),
        };
        self.detector.arm(self.kind, locker_id, baseline);
        self.phase = SessionPhase::Open;
        self.notice = Some(Notice::info(
            message.unwrap_or_else(|| format!("Locker {locker_id} is open.")),
        ));
        let session = &*self.session.insert(session);
        Ok(session)
    }

    /// OPENING → SELECTING with `message` as the error notice.
    pub fn open_failed(&mut self, ticket: Ticket, message: impl Into<String>) -> Result<(), FlowError> {
        match &self.pending {
            Some(Pending::Open { ticket: issued, .. }) if *issued == ticket => {}
            _ => return Err(FlowError::StaleResponse { flow: self.kind }),
        }
        self.pending = None;
        self.phase = SessionPhase::Selecting;
        self.notice = Some(Notice::error(message));
        Ok(())
    }

    /// OPEN → CLOSING. Returns `Ok(None)` when a close is already in flight.
    pub fn request_close(&mut self, trigger: CloseTrigger) -> Result<Option<CloseRequest>, FlowError> {
        match (self.phase, &self.session) {
            (SessionPhase::Closing, _) => Ok(None),
            (SessionPhase::Open, Some(session)) => {
                let session = session.clone();
                let ticket = self.next_ticket();
                self.pending = Some(Pending::Close { ticket, trigger });
                self.phase = SessionPhase::Closing;
                self.notice = Some(Notice::progress(match self.kind {
                    FlowKind::Deposit => DEPOSIT_CLOSING_TEXT,
                    FlowKind::Withdrawal => WITHDRAWAL_CLOSING_TEXT,
                }));
                Ok(Some(CloseRequest {
                    ticket,
                    trigger,
                    session,
                }))
            }
            _ => Err(self.invalid("close").into()),
        }
    }

    /// CLOSING → IDLE. Destroys the session and clears selection and input.
    /// A password is only honoured for deposits.
    pub fn close_succeeded(
        &mut self,
        ticket: Ticket,
        password: Option<Secret>,
        message: Option<String>,
    ) -> Result<Completion, FlowError> {
        let trigger = match &self.pending {
            Some(Pending::Close {
                ticket: issued,
                trigger,
            }) if *issued == ticket => *trigger,
            _ => return Err(FlowError::StaleResponse { flow: self.kind }),
        };
        let Some(session) = self.session.take() else {
            return Err(FlowError::StaleResponse { flow: self.kind });
        };

        let password = match self.kind {
            FlowKind::Deposit => password,
            FlowKind::Withdrawal => None,
        };
        let text = match (&password, message) {
            (Some(pw), Some(msg)) => format!("{msg} Retrieval password: {}", pw.expose()),
            (Some(pw), None) => format!("Parcel stored. Retrieval password: {}", pw.expose()),
            (None, Some(msg)) => msg,
            (None, None) => "Thank you, the locker is closed.".to_string(),
        };
        let return_delay = if password.is_some() {
            ReturnDelay::PasswordDisplay
        } else {
            ReturnDelay::Confirmation
        };

        self.pending = None;
        self.detector.disarm();
        self.selection = None;
        self.input.clear();
        self.phase = SessionPhase::Idle;
        self.notice = Some(Notice::success(text));

        Ok(Completion {
            flow: self.kind,
            locker_id: session.locker_id,
            trigger,
            password,
            return_delay,
        })
    }

    /// CLOSING → OPEN with `message` as the error notice. The session is
    /// kept and the close button is offered again.
    pub fn close_failed(&mut self, ticket: Ticket, message: impl Into<String>) -> Result<(), FlowError> {
        match &self.pending {
            Some(Pending::Close { ticket: issued, .. }) if *issued == ticket => {}
            _ => return Err(FlowError::StaleResponse { flow: self.kind }),
        }
        self.pending = None;
        self.phase = SessionPhase::Open;
        self.notice = Some(Notice::error(message));
        Ok(())
    }

    /// React to a fresh status mapping.
    ///
    /// In SELECTING a deposit drops a selection that is now occupied. In
    /// OPEN the door detector may fire, yielding a close request; in CLOSING
    /// a firing detector is absorbed by the single-close guard.
    pub fn observe(&mut self, statuses: &StatusMap) -> Option<CloseRequest> {
        if self.phase == SessionPhase::Selecting && self.kind == FlowKind::Deposit {
            if let Some(id) = self.selection {
                if statuses.get(id) == Some(LockerStatus::Occupied) {
                    self.selection = None;
                    self.notice = Some(Notice::warning(
                        ValidationError::LockerUnavailable {
                            id,
                            status: LockerStatus::Occupied,
                        }
                        .user_message(),
                    ));
                }
            }
        }

        if !self.detector.observe(statuses) {
            return None;
        }
        self.request_close(CloseTrigger::DoorClosed).ok().flatten()
    }

    /// Back to IDLE, dropping session, selection, input and notice, and
    /// retiring every outstanding ticket.
    pub fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
        self.input.clear();
        self.selection = None;
        self.session = None;
        self.pending = None;
        self.detector.disarm();
        self.notice = None;
        self.seq += 1;
    }

    fn next_ticket(&mut self) -> Ticket {
        self.seq += 1;
        Ticket {
            flow: self.kind,
            seq: self.seq,
        }
    }

    fn require(&self, phase: SessionPhase, action: &'static str) -> Result<(), TransitionError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError {
            flow: self.kind,
            phase: self.phase,
            action,
        }
    }

    fn reject(&mut self, reason: ValidationError) -> FlowError {
        self.notice = Some(Notice::warning(reason.user_message()));
        FlowError::Validation {
            flow: self.kind,
            reason,
        }
    }
}
