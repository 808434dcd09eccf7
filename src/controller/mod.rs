//! Optimistic Collection Controller
//!
//! Owns one view's collection. Every change is applied locally first, then
//! sent to the store; a rejected change is rolled back to its snapshot and
//! reported through the notifier. Store errors never escape as `Err`.

mod collection;
mod ledger;
mod mutation;


use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use crate::config::ControllerConfig;
use crate::domain::{CollectionItem, ItemId, Record, RemoteId, Scope, StoreError, StoreResult, Toggle};
use crate::notifier::{NoticeKind, Notifier};
use crate::repository::RemoteStore;
use crate::views::{self, Listing, ViewSpec};

use collection::{Collection, Overlay};
use ledger::Ledger;

pub use ledger::{MutationId, MutationKind, MutationState, PendingMutation};
pub use mutation::{Mutation, Outcome};

/// Precondition failures, reported before anything is applied
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("No item with id {0}")]
    UnknownItem(ItemId),
    #[error("Item {0} has not been saved yet")]
    Provisional(ItemId),
}

struct State<R> {
    items: Collection<R>,
    ledger: Ledger,
    /// Local effects of unsettled removes and patches, in the order they began
    overlays: Vec<(MutationId, Overlay<R>)>,
    next_provisional: u64,
}

impl<R> State<R> {
    fn finish(&mut self, mutation: MutationId, outcome: MutationState) -> Option<PendingMutation> {
        self.overlays.retain(|(id, _)| *id != mutation);
        self.ledger.finish(mutation, outcome)
    }
}

struct Shared<R> {
    state: Mutex<State<R>>,
    revision: watch::Sender<u64>,
}

impl<R> Shared<R> {
    /// Signal a visible change to subscribers
    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

/// How to take an optimistic change back
enum Undo<R> {
    /// Drop a provisional item
    Discard(ItemId),
    /// Put the pre-patch snapshot back
    Restore(CollectionItem<R>),
    /// Re-insert a removed item where it was
    Reinsert { index: usize, item: CollectionItem<R> },
}

impl<R: Record> Undo<R> {
    fn apply(self, items: &mut Collection<R>) -> bool {
        match self {
            Undo::Discard(id) => items.remove(&id).is_some(),
            Undo::Restore(snapshot) => items.restore(snapshot),
            Undo::Reinsert { index, item } => {
                if items.contains(&item.id) {
                    return false;
                }
                items.insert_at(index, item);
                true
            }
        }
    }
}

/// A patch applied locally, awaiting its remote call
struct Applied<R> {
    mutation: MutationId,
    snapshot: CollectionItem<R>,
    preview: CollectionItem<R>,
}

enum Apply<R> {
    Applied(Applied<R>),
    /// Nothing to change; carries the current item
    Unchanged(CollectionItem<R>),
}

/// Pairs one applied mutation with exactly one terminal outcome. Dropping it
/// unsettled counts as a rollback.
struct Settle<R: Record> {
    shared: Arc<Shared<R>>,
    mutation: MutationId,
    undo: Option<Undo<R>>,
}

impl<R: Record> Settle<R> {
    fn new(shared: Arc<Shared<R>>, mutation: MutationId, undo: Undo<R>) -> Self {
        Self {
            shared,
            mutation,
            undo: Some(undo),
        }
    }

    /// Finish as committed; `finalize` may adjust the collection and returns
    /// whether it changed anything visible.
    fn commit(mut self, finalize: impl FnOnce(&mut Collection<R>) -> bool) {
        self.undo = None;
        let changed = {
            let mut state = self.shared.state.lock();
            state.finish(self.mutation, MutationState::Committed);
            finalize(&mut state.items)
        };
        if changed {
            self.shared.bump();
        }
    }

    fn roll_back(mut self) {
        if let Some(undo) = self.undo.take() {
            self.undo_now(undo);
        }
    }

    fn undo_now(&self, undo: Undo<R>) {
        let (entry, changed) = {
            let mut state = self.shared.state.lock();
            let entry = state.finish(self.mutation, MutationState::RolledBack);
            (entry, undo.apply(&mut state.items))
        };
        if let Some(entry) = entry {
            log::debug!("{:?} of {} {} rolled back", entry.kind, R::LABEL, entry.target);
        }
        if changed {
            self.shared.bump();
        }
    }
}

impl<R: Record> Drop for Settle<R> {
    fn drop(&mut self) {
        if let Some(undo) = self.undo.take() {
            log::warn!("{} mutation dropped before it settled, rolling back", R::LABEL);
            self.undo_now(undo);
        }
    }
}

/// Collection controller for one view
pub struct OptimisticCollection<R: Record, S> {
    shared: Arc<Shared<R>>,
    store: Arc<S>,
    notifier: Arc<dyn Notifier>,
    scope: Scope,
    config: ControllerConfig,
}

impl<R: Record, S> Clone for OptimisticCollection<R, S> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            scope: self.scope.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R: Record, S: RemoteStore<R> + 'static> OptimisticCollection<R, S> {
    /// Empty controller over `scope`; call [`load`](Self::load) to fill it
    pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>, scope: Scope, config: ControllerConfig) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    items: Collection::default(),
                    ledger: Ledger::default(),
                    overlays: Vec::new(),
                    next_provisional: 1,
                }),
                revision,
            }),
            store,
            notifier,
            scope,
            config,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Replace the collection with a fresh `list` from the store. Mutations
    /// still in flight stay applied on top. On failure the current collection
    /// stays as it is.
    pub async fn load(&self) -> Outcome<usize> {
        match self.store.list(&self.scope).await {
            Ok(rows) => {
                let count = rows.len();
                {
                    let mut guard = self.shared.state.lock();
                    let state = &mut *guard;
                    let pending = state.overlays.iter().map(|(_, overlay)| overlay);
                    state.items.reset(rows.into_iter().map(CollectionItem::from), pending);
                }
                self.shared.bump();
                log::info!("Loaded {} {} rows", count, R::COLLECTION);
                Outcome::Committed(count)
            }
            Err(err) => {
                log::warn!("Loading {} failed: {}", R::COLLECTION, err);
                self.notifier.notify(
                    NoticeKind::Error,
                    &format!("Couldn't load {}", R::COLLECTION.replace('_', " ")),
                    &err.to_string(),
                );
                Outcome::RolledBack(err)
            }
        }
    }

    /// Current collection in canonical order
    pub fn snapshot(&self) -> Vec<CollectionItem<R>> {
        self.shared.state.lock().items.items().to_vec()
    }

    pub fn get(&self, id: &ItemId) -> Option<CollectionItem<R>> {
        self.shared.state.lock().items.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().items.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted and filtered copy of the current collection
    pub fn view(&self, spec: &ViewSpec) -> Vec<CollectionItem<R>>
    where
        R: Listing,
    {
        let state = self.shared.state.lock();
        views::view(state.items.items(), spec).into_iter().cloned().collect()
    }

    /// Number of visible changes so far
    pub fn revision(&self) -> u64 {
        *self.shared.revision.borrow()
    }

    /// Re-render signal: changes whenever the collection visibly changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    pub fn pending(&self) -> Vec<PendingMutation> {
        self.shared.state.lock().ledger.pending().to_vec()
    }

    /// No mutation in flight
    pub fn is_idle(&self) -> bool {
        self.shared.state.lock().ledger.is_empty()
    }

    /// Add a provisional item now; awaiting the mutation persists it and
    /// swaps in the stored item.
    pub fn insert(&self, payload: R) -> Mutation<CollectionItem<R>, CollectionItem<R>> {
        let (provisional, mutation) = {
            let mut state = self.shared.state.lock();
            let id = ItemId::Provisional(state.next_provisional);
            state.next_provisional += 1;

            let item = CollectionItem {
                id: id.clone(),
                payload: payload.clone(),
            };
            state.items.push(self.config.insert_at, item.clone());
            let (mutation, _) = state.ledger.begin(MutationKind::Insert, id);
            (item, mutation)
        };
        self.shared.bump();
        log::debug!("Optimistic insert of {} {}", R::LABEL, provisional.id);

        let settle = Settle::new(self.shared.clone(), mutation, Undo::Discard(provisional.id.clone()));
        let store = self.store.clone();
        let notifier = self.notifier.clone();
        let notify_success = self.config.notify_success;
        let insert_at = self.config.insert_at;
        let placeholder = provisional.id.clone();

        let fut = async move {
            match store.insert(&payload).await {
                Ok(stored) => {
                    let stored = CollectionItem::from(stored);
                    let committed = stored.clone();
                    settle.commit(|items| items.settle_insert(&placeholder, stored, insert_at));
                    if notify_success {
                        notifier.notify(NoticeKind::Success, &MutationKind::Insert.success_title(R::LABEL), "");
                    }
                    Outcome::Committed(committed)
                }
                Err(err) => {
                    settle.roll_back();
                    report_failure(notifier.as_ref(), MutationKind::Insert, R::LABEL, &err);
                    Outcome::RolledBack(err)
                }
            }
        };
        Mutation::new(provisional, Box::pin(fut))
    }

    /// Patch an item now; awaiting the mutation persists the patch
    pub fn update(&self, id: &ItemId, patch: R::Patch) -> Result<Mutation<CollectionItem<R>>, ControllerError> {
        let remote = remote_id(id)?;
        let applied = self.apply_patch(id, MutationKind::Update, |_| Some(patch.clone()))?;

        let store = self.store.clone();
        let call = async move { store.update(&remote, &patch).await };
        Ok(self.settle_patch(MutationKind::Update, applied, call))
    }

    /// Remove an item now; awaiting the mutation deletes it remotely
    pub fn remove(&self, id: &ItemId) -> Result<Mutation<CollectionItem<R>>, ControllerError> {
        let remote = remote_id(id)?;
        let (index, removed, mutation) = {
            let mut state = self.shared.state.lock();
            let (index, removed) = state
                .items
                .remove(id)
                .ok_or_else(|| ControllerError::UnknownItem(id.clone()))?;
            let mutation = begin(&mut state.ledger, MutationKind::Remove, id);
            state.overlays.push((mutation, Overlay::Removed(id.clone())));
            (index, removed, mutation)
        };
        self.shared.bump();
        log::debug!("Optimistic remove of {} {} at {}", R::LABEL, id, index);

        let settle = Settle::new(
            self.shared.clone(),
            mutation,
            Undo::Reinsert {
                index,
                item: removed.clone(),
            },
        );
        let store = self.store.clone();
        let call = async move { store.delete(&remote).await };
        Ok(self.finish(MutationKind::Remove, settle, removed, call))
    }

    /// Apply the patch `patch_for` builds from the current payload and record
    /// it in the ledger. Returning `None` leaves the item alone. The check and
    /// the apply happen under one lock.
    fn apply_patch(
        &self,
        id: &ItemId,
        kind: MutationKind,
        patch_for: impl FnOnce(&R) -> Option<R::Patch>,
    ) -> Result<Apply<R>, ControllerError> {
        let applied = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            let slot = state
                .items
                .get_mut(id)
                .ok_or_else(|| ControllerError::UnknownItem(id.clone()))?;
            let Some(patch) = patch_for(&slot.payload) else {
                return Ok(Apply::Unchanged(slot.clone()));
            };
            let snapshot = slot.clone();
            slot.payload.apply(&patch);
            let preview = slot.clone();

            let mutation = begin(&mut state.ledger, kind, id);
            state.overlays.push((mutation, Overlay::Patched(preview.clone())));
            Applied {
                mutation,
                snapshot,
                preview,
            }
        };
        if applied.preview != applied.snapshot {
            self.shared.bump();
        }
        log::debug!("Optimistic {:?} of {} {}", kind, R::LABEL, id);
        Ok(Apply::Applied(applied))
    }

    fn settle_patch(
        &self,
        kind: MutationKind,
        apply: Apply<R>,
        call: impl Future<Output = StoreResult<()>> + Send + 'static,
    ) -> Mutation<CollectionItem<R>> {
        match apply {
            Apply::Unchanged(current) => Mutation::ready(current, Outcome::Committed(())),
            Apply::Applied(applied) => {
                let settle = Settle::new(self.shared.clone(), applied.mutation, Undo::Restore(applied.snapshot));
                self.finish(kind, settle, applied.preview, call)
            }
        }
    }

    /// Build the settlement: commit leaves local state alone, failure rolls
    /// back and notifies.
    fn finish(
        &self,
        kind: MutationKind,
        settle: Settle<R>,
        preview: CollectionItem<R>,
        call: impl Future<Output = StoreResult<()>> + Send + 'static,
    ) -> Mutation<CollectionItem<R>> {
        let notifier = self.notifier.clone();
        let notify_success = self.config.notify_success;

        let fut: BoxFuture<'static, Outcome> = Box::pin(async move {
            match call.await {
                Ok(()) => {
                    settle.commit(|_| false);
                    if notify_success {
                        notifier.notify(NoticeKind::Success, &kind.success_title(R::LABEL), "");
                    }
                    Outcome::Committed(())
                }
                Err(err) => {
                    settle.roll_back();
                    report_failure(notifier.as_ref(), kind, R::LABEL, &err);
                    Outcome::RolledBack(err)
                }
            }
        });
        Mutation::new(preview, fut)
    }
}

impl<R: Toggle, S: RemoteStore<R> + 'static> OptimisticCollection<R, S> {
    /// Flip a flag now, adjusting its derived counter locally. Only the flag
    /// is persisted. Setting a flag to its current value is a no-op.
    pub fn toggle(&self, id: &ItemId, flag: R::Flag, value: bool) -> Result<Mutation<CollectionItem<R>>, ControllerError> {
        let remote = remote_id(id)?;
        let applied = self.apply_patch(id, MutationKind::Toggle, |current| {
            (current.flag(flag) != value).then(|| current.toggle_patch(flag, value))
        })?;

        let patch = R::flag_patch(flag, value);
        let store = self.store.clone();
        let call = async move { store.update(&remote, &patch).await };
        Ok(self.settle_patch(MutationKind::Toggle, applied, call))
    }
}

fn remote_id(id: &ItemId) -> Result<RemoteId, ControllerError> {
    id.remote()
        .cloned()
        .ok_or_else(|| ControllerError::Provisional(id.clone()))
}

/// Record a mutation, warning when it overlaps another on the same item
fn begin(ledger: &mut Ledger, kind: MutationKind, id: &ItemId) -> MutationId {
    let (mutation, overlapping) = ledger.begin(kind, id.clone());
    if overlapping {
        log::warn!("{:?} on {} while another mutation on it is in flight", kind, id);
    }
    mutation
}

fn report_failure(notifier: &dyn Notifier, kind: MutationKind, label: &str, err: &StoreError) {
    log::warn!("{:?} of {} failed: {}", kind, label, err);
    notifier.notify(NoticeKind::Error, &kind.failure_title(label), &err.to_string());
}
