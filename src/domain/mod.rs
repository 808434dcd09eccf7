//! Domain Layer
//!
//! Record traits, identifiers, the store error taxonomy and the concrete
//! collections the app keeps.

mod error;
mod forum;
mod item;
mod record;
mod review;
mod social;
mod watchlist;

pub use error::{StoreError, StoreResult};
pub use forum::{Comment, ForumPost, Liked, PostPatch};
pub use item::{CollectionItem, ItemId, RemoteId, Scope, StoredItem};
pub use record::{step_counter, Record, Toggle};
pub use review::{Review, ReviewFlag, ReviewPatch};
pub use social::{Club, ClubPatch, Following, Joined, ProfileCard, ProfilePatch};
pub use watchlist::{Priority, WatchlistEntry, WatchlistFlag, WatchlistPatch};
