//! # kiosk-core — Foundational Types for the Parcel-Locker Kiosk
//!
//! Leaf crate of the kiosk workspace. It defines the domain primitives that
//! every other crate shares; it depends on nothing internal and performs no
//! I/O.
//!
//! ## Key Design Principles
//!
//! 1. **Locker ids from user input are range-checked.** A [`LockerId`] that
//!    reaches a session was produced by [`LockerRange::validate`], so an
//!    out-of-range or missing selection can never leave the selection phase.
//!
//! 2. **Backend status is a mirror, not a merge.** [`StatusMap`] is built
//!    whole from one payload; there is no API to patch individual entries.
//!
//! 3. **Closet ids are opaque.** [`ClosetId`] keeps the exact JSON shape the
//!    backend produced so it round-trips from open to close unchanged.
//!
//! 4. **Secrets never reach logs.** Passwords are wrapped in [`Secret`],
//!    whose `Debug` output is redacted.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `kiosk-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod locker;
pub mod session;

pub use error::ValidationError;
pub use locker::{
    LockerId, LockerRange, LockerStatus, StatusMap, StatusSnapshot, DEFAULT_LOCKER_COUNT,
};
pub use session::{ClosetId, FlowKind, Secret, Session, SessionPayload};
