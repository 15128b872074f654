//! # Lockers and Their Status
//!
//! A locker (box) is one physical compartment identified by an integer.
//! Its door and occupancy are sensed by the backend; the kiosk only ever
//! holds a cached copy of the last successful status fetch.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Number of lockers in a standard installation. Compartment 16 of the
/// physical bank is reserved and never offered.
pub const DEFAULT_LOCKER_COUNT: u32 = 15;

/// Integer identifier of a single locker.
///
/// Ids received from the backend are taken as-is; ids chosen by the user
/// are produced by [`LockerRange::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LockerId(u32);

impl LockerId {
    /// Wrap an id without range checking (backend payloads, fixtures).
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw integer id.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for LockerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The valid locker ids of an installation: `1..=capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockerRange {
    capacity: u32,
}

impl LockerRange {
    /// Range `1..=capacity`. A capacity of zero yields an empty range.
    pub const fn new(capacity: u32) -> Self {
        Self { capacity }
    }

    /// Highest valid id.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Whether `raw` names an installed locker.
    pub const fn contains(&self, raw: u32) -> bool {
        raw >= 1 && raw <= self.capacity
    }

    /// Validate a user selection. `None` means nothing was selected.
    pub fn validate(&self, raw: Option<u32>) -> Result<LockerId, ValidationError> {
        let raw = raw.ok_or(ValidationError::NoSelection)?;
        if !self.contains(raw) {
            return Err(ValidationError::LockerOutOfRange {
                id: raw,
                max: self.capacity,
            });
        }
        Ok(LockerId(raw))
    }

    /// All ids of the installation in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = LockerId> {
        (1..=self.capacity).map(LockerId)
    }
}

impl Default for LockerRange {
    fn default() -> Self {
        Self::new(DEFAULT_LOCKER_COUNT)
    }
}

/// Door/occupancy status of a locker as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockerStatus {
    /// Empty, door closed.
    Available,
    /// Holds a parcel, door closed.
    Occupied,
    /// Door open.
    Open,
}

impl LockerStatus {
    /// Wire name, also used as the grid's style class.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Open => "open",
        }
    }
}

impl std::fmt::Display for LockerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping locker id -> status built from one backend payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMap(BTreeMap<LockerId, LockerStatus>);

impl StatusMap {
    /// Empty mapping (nothing known yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-known status of `id`, if the backend reported it.
    pub fn get(&self, id: LockerId) -> Option<LockerStatus> {
        self.0.get(&id).copied()
    }

    /// Number of lockers reported.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (LockerId, LockerStatus)> + '_ {
        self.0.iter().map(|(id, status)| (*id, *status))
    }
}

impl FromIterator<(LockerId, LockerStatus)> for StatusMap {
    /// Later entries for the same id override earlier ones.
    fn from_iter<I: IntoIterator<Item = (LockerId, LockerStatus)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A complete status mapping plus the time it was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Statuses as reported.
    pub statuses: StatusMap,
    /// When the fetch completed.
    pub fetched_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// Snapshot stamped with the current time.
    pub fn now(statuses: StatusMap) -> Self {
        Self {
            statuses,
            fetched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_range_is_one_to_fifteen() {
        let range = LockerRange::default();
        assert_eq!(range.capacity(), 15);
        assert!(range.contains(1));
        assert!(range.contains(15));
        assert!(!range.contains(0));
        assert!(!range.contains(16));
        assert_eq!(range.ids().count(), 15);
    }

    #[test]
    fn validate_rejects_missing_selection() {
        assert_eq!(
            LockerRange::default().validate(None),
            Err(ValidationError::NoSelection)
        );
    }

    #[test]
    fn validate_accepts_bounds() {
        let range = LockerRange::new(15);
        assert_eq!(range.validate(Some(1)).unwrap().get(), 1);
        assert_eq!(range.validate(Some(15)).unwrap().get(), 15);
    }

    #[test]
    fn empty_range_rejects_everything() {
        let range = LockerRange::new(0);
        assert_eq!(range.ids().count(), 0);
        assert!(range.validate(Some(1)).is_err());
    }

    #[test]
    fn status_wire_names() {
        let parsed: LockerStatus = serde_json::from_str("\"occupied\"").unwrap();
        assert_eq!(parsed, LockerStatus::Occupied);
        assert_eq!(serde_json::to_string(&LockerStatus::Open).unwrap(), "\"open\"");
        assert!(serde_json::from_str::<LockerStatus>("\"broken\"").is_err());
    }

    #[test]
    fn status_map_last_entry_wins() {
        let map: StatusMap = [
            (LockerId::from_raw(2), LockerStatus::Open),
            (LockerId::from_raw(2), LockerStatus::Occupied),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(LockerId::from_raw(2)), Some(LockerStatus::Occupied));
        assert_eq!(map.get(LockerId::from_raw(9)), None);
    }

    proptest! {
        #[test]
        fn validate_matches_contains(raw in 0u32..64, capacity in 0u32..32) {
            let range = LockerRange::new(capacity);
            let result = range.validate(Some(raw));
            prop_assert_eq!(result.is_ok(), raw >= 1 && raw <= capacity);
            if let Err(err) = result {
                prop_assert_eq!(err, ValidationError::LockerOutOfRange { id: raw, max: capacity });
            }
        }
    }
}
