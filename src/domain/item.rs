//! Collection Items and Identifiers
//!
//! Items are keyed by [`ItemId`]: either the id the store assigned, or a
//! client placeholder while an insert is in flight.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier assigned by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for RemoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identity of an item in a local collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemId {
    /// Assigned by the store
    Remote(RemoteId),
    /// Client placeholder for an insert awaiting the store
    Provisional(u64),
}

impl ItemId {
    pub fn is_provisional(&self) -> bool {
        matches!(self, ItemId::Provisional(_))
    }

    pub fn remote(&self) -> Option<&RemoteId> {
        match self {
            ItemId::Remote(id) => Some(id),
            ItemId::Provisional(_) => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Remote(id) => write!(f, "{}", id),
            ItemId::Provisional(n) => write!(f, "tmp-{}", n),
        }
    }
}

impl From<RemoteId> for ItemId {
    fn from(id: RemoteId) -> Self {
        ItemId::Remote(id)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        ItemId::Remote(RemoteId::new(id))
    }
}

/// An item as held by a controller
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionItem<R> {
    pub id: ItemId,
    pub payload: R,
}

impl<R> CollectionItem<R> {
    pub fn is_provisional(&self) -> bool {
        self.id.is_provisional()
    }
}

/// An item as returned by a store. Stores never hand out placeholder ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem<R> {
    pub id: RemoteId,
    pub payload: R,
}

impl<R> StoredItem<R> {
    pub fn new(id: impl Into<RemoteId>, payload: R) -> Self {
        Self { id: id.into(), payload }
    }
}

impl<R> From<StoredItem<R>> for CollectionItem<R> {
    fn from(item: StoredItem<R>) -> Self {
        Self {
            id: ItemId::Remote(item.id),
            payload: item.payload,
        }
    }
}

/// Filter for `list`: records whose payload `field` equals `value`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scope {
    filter: Option<(String, String)>,
}

impl Scope {
    /// Every record in the collection
    pub fn all() -> Self {
        Self { filter: None }
    }

    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            filter: Some((field.into(), value.into())),
        }
    }

    /// Shorthand for the common "rows owned by this user" scope
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::new("user_id", user_id)
    }

    pub fn filter(&self) -> Option<(&str, &str)> {
        self.filter.as_ref().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    /// Field names end up in queries, so only plain identifiers are accepted
    pub fn is_valid_field(field: &str) -> bool {
        !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_display() {
        assert_eq!(ItemId::from("w1").to_string(), "w1");
        assert_eq!(ItemId::Provisional(7).to_string(), "tmp-7");
    }

    #[test]
    fn test_stored_item_converts_to_remote_id() {
        let item: CollectionItem<u8> = StoredItem::new("42", 1).into();
        assert_eq!(item.id, ItemId::Remote(RemoteId::new("42")));
        assert!(!item.is_provisional());
    }

    #[test]
    fn test_scope_field_validation() {
        assert!(Scope::is_valid_field("user_id"));
        assert!(!Scope::is_valid_field("user_id; DROP"));
        assert!(!Scope::is_valid_field(""));
        assert_eq!(Scope::user("u1").filter(), Some(("user_id", "u1")));
        assert_eq!(Scope::all().filter(), None);
    }
}
