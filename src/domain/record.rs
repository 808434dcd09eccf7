//! Domain Layer - Core Record Traits
//!
//! Every collection the app keeps (watchlist, reviews, follows, ...) holds
//! payloads implementing [`Record`]. The controller never looks inside a
//! payload: it only applies patches and compares ids.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Core trait for all collection payloads
pub trait Record: Debug + Clone + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Partial update. Absent fields must be skipped when serialized so the
    /// patch can be sent as a JSON merge patch.
    type Patch: Debug + Clone + Send + Sync + Serialize + DeserializeOwned + 'static;

    /// Table name in the remote store
    const COLLECTION: &'static str;

    /// Human label used in notices ("watchlist entry", "review", ...)
    const LABEL: &'static str;

    /// Apply a patch in place
    fn apply(&mut self, patch: &Self::Patch);

    /// Reject payloads the store must never persist
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Records with boolean flags that carry a derived counter.
///
/// The store does not return updated aggregates (follower count, like count),
/// so the local patch adjusts the counter itself while only the flag is
/// persisted.
pub trait Toggle: Record {
    type Flag: Debug + Copy + Eq + Send + Sync + 'static;

    /// Current value of a flag
    fn flag(&self, flag: Self::Flag) -> bool;

    /// Patch persisted remotely: the flag alone
    fn flag_patch(flag: Self::Flag, value: bool) -> Self::Patch;

    /// Patch applied locally: the flag plus any derived counter
    fn toggle_patch(&self, flag: Self::Flag, value: bool) -> Self::Patch {
        Self::flag_patch(flag, value)
    }
}

/// Step a derived counter for a flag change, saturating at zero
pub fn step_counter(count: u32, was: bool, now: bool) -> u32 {
    match (was, now) {
        (false, true) => count.saturating_add(1),
        (true, false) => count.saturating_sub(1),
        _ => count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_counter() {
        assert_eq!(step_counter(3, false, true), 4);
        assert_eq!(step_counter(3, true, false), 2);
        assert_eq!(step_counter(3, true, true), 3);
        assert_eq!(step_counter(0, true, false), 0);
    }
}
