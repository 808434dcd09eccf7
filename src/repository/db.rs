//! Database Connection and Setup
//!
//! Manages the SQLite connection shared by every collection store.

use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{Record, Scope, StoreError, StoreResult};
use super::sqlite::SqliteStore;

/// Database state wrapper
#[derive(Clone)]
pub struct DbState {
    conn: Arc<Mutex<Option<Connection>>>,
}

impl DbState {
    fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(Some(conn))),
        }
    }

    /// Open a store for one collection, creating its table if needed
    pub async fn store<R: Record>(&self) -> StoreResult<SqliteStore<R>> {
        {
            let guard = self.conn.lock().await;
            let conn = guard
                .as_ref()
                .ok_or_else(|| StoreError::Fetch("Database not initialized".to_string()))?;
            run_migrations(conn, R::COLLECTION)?;
        }
        Ok(SqliteStore::new(self.conn.clone()))
    }

    /// Drop the connection; stores opened from this state start failing
    pub async fn close(&self) {
        self.conn.lock().await.take();
    }
}

/// Initialize database at path
pub fn init_db(db_path: &Path) -> StoreResult<DbState> {
    let conn = Connection::open(db_path)?;
    log::info!("Opened database at {}", db_path.display());
    Ok(DbState::new(conn))
}

/// In-memory database, gone when the last store is dropped
pub fn init_memory_db() -> StoreResult<DbState> {
    Ok(DbState::new(Connection::open_in_memory()?))
}

/// Create the collection table if it does not exist
fn run_migrations(conn: &Connection, table: &str) -> StoreResult<()> {
    if !Scope::is_valid_field(table) {
        return Err(StoreError::Validation(format!("invalid collection name '{}'", table)));
    }

    conn.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {table} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                payload TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                deleted_at INTEGER
            )"
        ),
        [],
    )?;

    conn.execute(
        &format!("CREATE INDEX IF NOT EXISTS idx_{table}_live ON {table}(deleted_at)"),
        [],
    )?;

    Ok(())
}
