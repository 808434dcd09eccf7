//! Watchlist Entry
//!
//! A movie a user plans to watch, with priority and watched state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::record::{Record, Toggle};
use crate::views::Listing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub user_id: String,
    pub movie_id: String,
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub watched: bool,
    /// The user's own rating once watched, 0.5 to 5
    pub rating: Option<f32>,
    pub genre: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl WatchlistEntry {
    pub fn new(user_id: impl Into<String>, movie_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            movie_id: movie_id.into(),
            title: title.into(),
            priority: Priority::default(),
            watched: false,
            rating: None,
            genre: None,
            added_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watched: Option<bool>,
    /// `Some(None)` clears the rating and is sent as `null`
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub rating: Option<Option<f32>>,
}

/// Keep an explicit `null` apart from an absent field
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl WatchlistPatch {
    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Default::default()
        }
    }

    pub fn watched(watched: bool) -> Self {
        Self {
            watched: Some(watched),
            ..Default::default()
        }
    }

    /// Set the rating, or clear it with `None`
    pub fn rating(rating: Option<f32>) -> Self {
        Self {
            rating: Some(rating),
            ..Default::default()
        }
    }
}

impl Record for WatchlistEntry {
    type Patch = WatchlistPatch;
    const COLLECTION: &'static str = "watchlist";
    const LABEL: &'static str = "watchlist entry";

    fn apply(&mut self, patch: &WatchlistPatch) {
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(watched) = patch.watched {
            self.watched = watched;
        }
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title is required".to_string());
        }
        match self.rating {
            Some(r) if !(0.5..=5.0).contains(&r) => Err(format!("rating {} out of range", r)),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchlistFlag {
    Watched,
}

impl Toggle for WatchlistEntry {
    type Flag = WatchlistFlag;

    fn flag(&self, flag: WatchlistFlag) -> bool {
        match flag {
            WatchlistFlag::Watched => self.watched,
        }
    }

    fn flag_patch(flag: WatchlistFlag, value: bool) -> WatchlistPatch {
        match flag {
            WatchlistFlag::Watched => WatchlistPatch::watched(value),
        }
    }
}

impl Listing for WatchlistEntry {
    fn title(&self) -> &str {
        &self.title
    }

    fn rating(&self) -> Option<f32> {
        self.rating
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.added_at)
    }

    fn category(&self) -> Option<&str> {
        self.genre.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_only_touches_present_fields() {
        let mut entry = WatchlistEntry::new("u1", "m1", "RRR");
        entry.apply(&WatchlistPatch::priority(Priority::High));
        assert_eq!(entry.priority, Priority::High);
        assert!(!entry.watched);
        assert_eq!(entry.rating, None);
    }

    #[test]
    fn test_patch_serializes_sparse() {
        let json = serde_json::to_value(WatchlistPatch::watched(true)).unwrap();
        assert_eq!(json, serde_json::json!({ "watched": true }));
    }

    #[test]
    fn test_rating_can_be_cleared() {
        let mut entry = WatchlistEntry::new("u1", "m1", "RRR");
        entry.apply(&WatchlistPatch::rating(Some(4.5)));
        assert_eq!(entry.rating, Some(4.5));

        let clear = WatchlistPatch::rating(None);
        assert_eq!(serde_json::to_value(&clear).unwrap(), serde_json::json!({ "rating": null }));
        entry.apply(&clear);
        assert_eq!(entry.rating, None);

        let parsed: WatchlistPatch = serde_json::from_str(r#"{"rating":null}"#).unwrap();
        assert_eq!(parsed, clear);
        let parsed: WatchlistPatch = serde_json::from_str(r#"{"watched":true}"#).unwrap();
        assert_eq!(parsed.rating, None);
    }

    #[test]
    fn test_validation() {
        let mut entry = WatchlistEntry::new("u1", "m1", "  ");
        assert!(entry.validate().is_err());
        entry.title = "Pushpa".to_string();
        entry.rating = Some(9.0);
        assert!(entry.validate().is_err());
        entry.rating = Some(4.0);
        assert!(entry.validate().is_ok());
    }
}
