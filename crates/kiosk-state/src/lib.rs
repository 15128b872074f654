//! # kiosk-state — Kiosk Session and Screen State
//!
//! Synchronous, I/O-free state for the parcel-locker kiosk. Every decision
//! the kiosk makes (may the user submit, does a poll close the door, which
//! buttons are enabled, which screen is shown) is taken here; the runtime
//! in `kiosk-app` only performs the requests these types ask for and feeds
//! the results back.
//!
//! ## Modules
//!
//! - [`machine`]: per-flow session lifecycle with request tickets and the
//!   single-close guard.
//! - [`store`]: both flow machines plus the status cache, with one reset.
//! - [`detector`]: edge-triggered door-closure detection.
//! - [`grid`]: locker button presentation.
//! - [`navigator`]: two-phase screen switching.
//! - [`notice`]: user-facing message lines.

pub mod detector;
pub mod grid;
pub mod machine;
pub mod navigator;
pub mod notice;
pub mod store;

pub use detector::{door_closed_status, DoorClosureDetector};
pub use grid::{is_selectable, present_grid, GridView, LockerCell};
pub use machine::{
    CloseRequest, CloseTrigger, Completion, Credentials, FlowError, FlowMachine, OpenRequest,
    ReturnDelay, SessionPhase, Ticket, TransitionError,
};
pub use navigator::{Navigator, Screen, Transition, Visibility};
pub use notice::{Notice, NoticeLevel};
pub use store::{SessionStore, StatusCache};
