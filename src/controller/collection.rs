//! Ordered, id-unique item list owned by one controller

use crate::config::InsertAt;
use crate::domain::{CollectionItem, ItemId};

/// Local effect of a mutation that has not settled yet
#[derive(Debug, Clone)]
pub(crate) enum Overlay<R> {
    Removed(ItemId),
    /// The item as it looked right after the optimistic apply
    Patched(CollectionItem<R>),
}

#[derive(Debug, Clone)]
pub(crate) struct Collection<R> {
    items: Vec<CollectionItem<R>>,
}

impl<R> Default for Collection<R> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<R: Clone + PartialEq> Collection<R> {
    pub fn items(&self) -> &[CollectionItem<R>] {
        &self.items
    }

    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &ItemId) -> Option<&CollectionItem<R>> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn get_mut(&mut self, id: &ItemId) -> Option<&mut CollectionItem<R>> {
        self.items.iter_mut().find(|item| &item.id == id)
    }

    pub fn push(&mut self, at: InsertAt, item: CollectionItem<R>) {
        match at {
            InsertAt::Front => self.items.insert(0, item),
            InsertAt::Back => self.items.push(item),
        }
    }

    /// Insert at `index`, clamped to the current length
    pub fn insert_at(&mut self, index: usize, item: CollectionItem<R>) {
        let index = index.min(self.items.len());
        self.items.insert(index, item);
    }

    /// Remove by id, returning where the item was
    pub fn remove(&mut self, id: &ItemId) -> Option<(usize, CollectionItem<R>)> {
        let index = self.position(id)?;
        Some((index, self.items.remove(index)))
    }

    /// Replace the whole list with a fresh fetch. Provisional items of
    /// inserts still in flight are kept at the end, and in-flight removes
    /// and patches are laid over the fresh rows in the order they began.
    pub fn reset<'a>(
        &mut self,
        fresh: impl IntoIterator<Item = CollectionItem<R>>,
        pending: impl IntoIterator<Item = &'a Overlay<R>>,
    ) where
        R: 'a,
    {
        let provisional: Vec<_> = self.items.drain(..).filter(|item| item.is_provisional()).collect();
        self.items.extend(fresh);
        self.items.extend(provisional);

        for overlay in pending {
            match overlay {
                Overlay::Removed(id) => {
                    self.remove(id);
                }
                Overlay::Patched(applied) => {
                    if let Some(slot) = self.get_mut(&applied.id) {
                        *slot = applied.clone();
                    }
                }
            }
        }
    }

    /// Swap a provisional item for the stored one. Returns whether the list
    /// changed.
    pub fn settle_insert(&mut self, placeholder: &ItemId, stored: CollectionItem<R>, at: InsertAt) -> bool {
        let already_present = self.contains(&stored.id);
        match self.position(placeholder) {
            Some(index) if already_present => {
                self.items.remove(index);
                true
            }
            Some(index) => {
                self.items[index] = stored;
                true
            }
            None if already_present => false,
            None => {
                self.push(at, stored);
                true
            }
        }
    }

    /// Put a snapshot back in place of the current version of the item.
    /// Nothing happens if the item is gone.
    pub fn restore(&mut self, snapshot: CollectionItem<R>) -> bool {
        match self.get_mut(&snapshot.id) {
            Some(slot) if *slot != snapshot => {
                *slot = snapshot;
                true
            }
            _ => false,
        }
    }
}
