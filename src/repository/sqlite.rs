//! SQLite Record Store
//!
//! Each collection is one table of JSON payloads keyed by an autoincrement
//! id. Deletes are soft: rows keep a `deleted_at` stamp.

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{Record, RemoteId, Scope, StoreError, StoreResult, StoredItem};
use super::merge::merge_patch;
use super::traits::RemoteStore;

/// SQLite implementation of [`RemoteStore`]
pub struct SqliteStore<R> {
    conn: Arc<Mutex<Option<Connection>>>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> SqliteStore<R> {
    pub(super) fn new(conn: Arc<Mutex<Option<Connection>>>) -> Self {
        Self {
            conn,
            _record: PhantomData,
        }
    }
}

fn not_initialized() -> StoreError {
    StoreError::Fetch("Database not initialized".to_string())
}

/// Row ids are integers; anything else cannot exist in the table
fn row_id(id: &RemoteId) -> StoreResult<i64> {
    id.as_str()
        .parse()
        .map_err(|_| StoreError::NotFound(format!("no row with id '{}'", id)))
}

fn row_to_item<R: Record>(id: i64, payload: &str) -> StoreResult<StoredItem<R>> {
    let payload = serde_json::from_str(payload)
        .map_err(|e| StoreError::Unknown(format!("corrupt row {}: {}", id, e)))?;
    Ok(StoredItem::new(id.to_string(), payload))
}

#[async_trait]
impl<R: Record> RemoteStore<R> for SqliteStore<R> {
    async fn list(&self, scope: &Scope) -> StoreResult<Vec<StoredItem<R>>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let (path, value) = match scope.filter() {
            Some((field, value)) => {
                if !Scope::is_valid_field(field) {
                    return Err(StoreError::Validation(format!("invalid scope field '{}'", field)));
                }
                (Some(format!("$.{}", field)), Some(value.to_string()))
            }
            None => (None, None),
        };

        // Strings compare by value, anything else by its JSON text, so
        // `watched = "true"` matches a boolean field.
        let mut stmt = conn.prepare(&format!(
            "SELECT id, payload FROM {} WHERE deleted_at IS NULL
             AND (?1 IS NULL OR CASE json_type(payload, ?1)
                 WHEN 'text' THEN json_extract(payload, ?1) = ?2
                 ELSE (payload -> ?1) = ?2
             END)
             ORDER BY id ASC",
            R::COLLECTION
        ))?;

        let rows = stmt.query_map(params![path, value], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (id, payload) = row?;
            items.push(row_to_item(id, &payload)?);
        }
        Ok(items)
    }

    async fn insert(&self, payload: &R) -> StoreResult<StoredItem<R>> {
        payload.validate().map_err(StoreError::Validation)?;
        let json = serde_json::to_string(payload)?;

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = chrono::Utc::now().timestamp_millis();
        conn.execute(
            &format!("INSERT INTO {} (payload, created_at, updated_at) VALUES (?1, ?2, ?2)", R::COLLECTION),
            params![json, now],
        )?;

        let id = conn.last_insert_rowid();
        Ok(StoredItem::new(id.to_string(), payload.clone()))
    }

    async fn update(&self, id: &RemoteId, patch: &R::Patch) -> StoreResult<()> {
        let row = row_id(id)?;
        let patch = serde_json::to_value(patch)?;

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let current: Option<String> = conn
            .query_row(
                &format!("SELECT payload FROM {} WHERE id = ?1 AND deleted_at IS NULL", R::COLLECTION),
                params![row],
                |r| r.get(0),
            )
            .optional()?;
        let current = current.ok_or_else(|| StoreError::NotFound(format!("no row with id '{}'", id)))?;

        let mut doc: Value = serde_json::from_str(&current)
            .map_err(|e| StoreError::Unknown(format!("corrupt row {}: {}", row, e)))?;
        merge_patch(&mut doc, &patch);

        // Round-trip through the record type so a patch can't persist a shape
        // the record no longer parses from.
        let updated: R = serde_json::from_value(doc)?;
        updated.validate().map_err(StoreError::Validation)?;

        conn.execute(
            &format!("UPDATE {} SET payload = ?1, updated_at = ?2 WHERE id = ?3", R::COLLECTION),
            params![serde_json::to_string(&updated)?, chrono::Utc::now().timestamp_millis(), row],
        )?;
        Ok(())
    }

    async fn delete(&self, id: &RemoteId) -> StoreResult<()> {
        let row = row_id(id)?;

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or_else(not_initialized)?;

        let now = chrono::Utc::now().timestamp_millis();
        let changed = conn.execute(
            &format!(
                "UPDATE {} SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                R::COLLECTION
            ),
            params![now, row],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(format!("no row with id '{}'", id)));
        }
        Ok(())
    }
}
