//! In-memory Record Store
//!
//! Process-local store for offline demos and tests. Each instance owns its
//! rows; there is no shared global state.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::domain::{Record, RemoteId, Scope, StoreError, StoreResult, StoredItem};
use super::traits::RemoteStore;

pub struct MemoryStore<R> {
    rows: Mutex<Rows<R>>,
}

struct Rows<R> {
    items: Vec<StoredItem<R>>,
    next_id: u64,
}

impl<R: Record> MemoryStore<R> {
    pub fn new() -> Self {
        Self::seeded(Vec::new())
    }

    /// Start with existing rows, in list order
    pub fn seeded(items: Vec<StoredItem<R>>) -> Self {
        Self {
            rows: Mutex::new(Rows { items, next_id: 1 }),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &RemoteId) -> Option<R> {
        self.rows
            .lock()
            .items
            .iter()
            .find(|item| &item.id == id)
            .map(|item| item.payload.clone())
    }
}

impl<R: Record> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare a payload field against a scope value. Non-string fields compare
/// by their JSON text, so `true` matches "true". `SqliteStore` filters the
/// same way.
fn in_scope<R: Record>(payload: &R, scope: &Scope) -> StoreResult<bool> {
    let Some((field, value)) = scope.filter() else {
        return Ok(true);
    };
    if !Scope::is_valid_field(field) {
        return Err(StoreError::Validation(format!("invalid scope field '{}'", field)));
    }
    let doc = serde_json::to_value(payload)?;
    Ok(match doc.get(field) {
        Some(Value::String(s)) => s == value,
        Some(other) => other.to_string() == value,
        None => false,
    })
}

#[async_trait]
impl<R: Record> RemoteStore<R> for MemoryStore<R> {
    async fn list(&self, scope: &Scope) -> StoreResult<Vec<StoredItem<R>>> {
        let rows = self.rows.lock();
        let mut out = Vec::new();
        for item in &rows.items {
            if in_scope(&item.payload, scope)? {
                out.push(item.clone());
            }
        }
        Ok(out)
    }

    async fn insert(&self, payload: &R) -> StoreResult<StoredItem<R>> {
        payload.validate().map_err(StoreError::Validation)?;

        let mut rows = self.rows.lock();
        let mut id = RemoteId::new(format!("m{}", rows.next_id));
        while rows.items.iter().any(|item| item.id == id) {
            rows.next_id += 1;
            id = RemoteId::new(format!("m{}", rows.next_id));
        }
        rows.next_id += 1;

        let item = StoredItem::new(id, payload.clone());
        rows.items.push(item.clone());
        Ok(item)
    }

    async fn update(&self, id: &RemoteId, patch: &R::Patch) -> StoreResult<()> {
        let mut rows = self.rows.lock();
        let item = rows
            .items
            .iter_mut()
            .find(|item| &item.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("no record with id '{}'", id)))?;

        let mut updated = item.payload.clone();
        updated.apply(patch);
        updated.validate().map_err(StoreError::Validation)?;
        item.payload = updated;
        Ok(())
    }

    async fn delete(&self, id: &RemoteId) -> StoreResult<()> {
        let mut rows = self.rows.lock();
        let before = rows.items.len();
        rows.items.retain(|item| &item.id != id);
        if rows.items.len() == before {
            return Err(StoreError::NotFound(format!("no record with id '{}'", id)));
        }
        Ok(())
    }
}
