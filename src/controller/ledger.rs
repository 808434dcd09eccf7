//! In-flight mutation bookkeeping
//!
//! Each mutation moves `OptimisticApplied -> Committed | RolledBack`; the
//! entry leaves the ledger when it reaches a terminal state.

use crate::domain::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Insert,
    Update,
    Remove,
    Toggle,
}

impl MutationKind {
    fn verbs(self) -> (&'static str, &'static str) {
        match self {
            MutationKind::Insert => ("Added", "add"),
            MutationKind::Update | MutationKind::Toggle => ("Updated", "update"),
            MutationKind::Remove => ("Removed", "remove"),
        }
    }

    /// Notice title on commit
    pub fn success_title(self, label: &str) -> String {
        format!("{} {}", self.verbs().0, label)
    }

    /// Notice title on rollback
    pub fn failure_title(self, label: &str) -> String {
        format!("Couldn't {} {}", self.verbs().1, label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    OptimisticApplied,
    Committed,
    RolledBack,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    pub id: MutationId,
    pub kind: MutationKind,
    pub target: ItemId,
    pub state: MutationState,
}

#[derive(Debug, Default)]
pub(crate) struct Ledger {
    next: u64,
    entries: Vec<PendingMutation>,
}

impl Ledger {
    /// Record a freshly applied mutation. The flag is true when another
    /// mutation on the same target is still in flight.
    pub fn begin(&mut self, kind: MutationKind, target: ItemId) -> (MutationId, bool) {
        let id = MutationId(self.next);
        self.next += 1;
        let overlapping = self.entries.iter().any(|entry| entry.target == target);
        self.entries.push(PendingMutation {
            id,
            kind,
            target,
            state: MutationState::OptimisticApplied,
        });
        (id, overlapping)
    }

    /// Move a mutation to its terminal state and drop it from the ledger
    pub fn finish(&mut self, id: MutationId, state: MutationState) -> Option<PendingMutation> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        let mut entry = self.entries.remove(index);
        entry.state = state;
        Some(entry)
    }

    pub fn pending(&self) -> &[PendingMutation] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
