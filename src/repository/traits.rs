//! Repository Layer - Core Traits
//!
//! The persistence boundary every controller talks to. Implementations can
//! be SQLite, a hosted REST backend, in-memory, etc.

use async_trait::async_trait;
use crate::domain::{Record, RemoteId, Scope, StoreResult, StoredItem};

/// Remote CRUD over one collection of records
///
/// Every call fails atomically: an `Err` means nothing changed remotely.
#[async_trait]
pub trait RemoteStore<R: Record>: Send + Sync {
    /// Fetch all records in scope, in store order
    async fn list(&self, scope: &Scope) -> StoreResult<Vec<StoredItem<R>>>;

    /// Persist a new record; the store assigns the id and any defaults
    async fn insert(&self, payload: &R) -> StoreResult<StoredItem<R>>;

    /// Apply a partial update to an existing record
    async fn update(&self, id: &RemoteId, patch: &R::Patch) -> StoreResult<()>;

    /// Delete a record by id
    async fn delete(&self, id: &RemoteId) -> StoreResult<()>;
}
