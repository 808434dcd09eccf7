//! PostgREST Store
//!
//! [`RemoteStore`](cinelist::RemoteStore) over a hosted PostgREST backend.
//! Each record collection maps to the table named by its `COLLECTION`.

mod config;
mod store;

#[cfg(test)]
mod tests;

pub use config::RestConfig;
pub use store::{status_error, RestClient, RestError, RestStore};
