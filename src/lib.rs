//! Cinelist
//!
//! Optimistic collection state for a social movie app's list views.
//!
//! Layered architecture:
//! - domain: Records, ids, scopes and store errors
//! - repository: Remote store abstraction and implementations
//! - controller: Optimistic collection controller
//! - notifier: User-facing success and error notices
//! - views: Derived sorting and filtering
//! - config: Environment-driven settings

pub mod config;
pub mod controller;
pub mod domain;
pub mod notifier;
pub mod repository;
pub mod views;

pub use config::{ConfigError, ControllerConfig, InsertAt};
pub use controller::{ControllerError, Mutation, OptimisticCollection, Outcome};
pub use domain::{CollectionItem, ItemId, Record, RemoteId, Scope, StoreError, StoreResult, StoredItem, Toggle};
pub use notifier::{ChannelNotifier, LogNotifier, Notice, NoticeKind, Notifier};
pub use repository::RemoteStore;
pub use views::{Filter, Listing, SortOrder, ViewSpec};
