//! Repository Layer
//!
//! The remote store abstraction and its local implementations.

mod db;
mod memory;
mod merge;
mod sqlite;
mod traits;


pub use db::{init_db, init_memory_db, DbState};
pub use memory::MemoryStore;
pub use merge::merge_patch;
pub use sqlite::SqliteStore;
pub use traits::RemoteStore;
