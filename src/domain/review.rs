//! Review Entity
//!
//! A user's review of a movie. Drafts live in the same collection with
//! `is_draft` set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{step_counter, Record, Toggle};
use crate::views::Listing;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub user_id: String,
    pub movie_id: String,
    pub movie_title: String,
    /// Star rating, 1 to 5
    pub rating: u8,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_draft: bool,
    #[serde(default)]
    pub like_count: u32,
    /// Whether the viewing user liked this review
    #[serde(default)]
    pub liked: bool,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn new(user_id: impl Into<String>, movie_id: impl Into<String>, movie_title: impl Into<String>, rating: u8) -> Self {
        Self {
            user_id: user_id.into(),
            movie_id: movie_id.into(),
            movie_title: movie_title.into(),
            rating,
            body: String::new(),
            is_draft: false,
            like_count: 0,
            liked: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_draft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u32>,
}

impl Record for Review {
    type Patch = ReviewPatch;
    const COLLECTION: &'static str = "reviews";
    const LABEL: &'static str = "review";

    fn apply(&mut self, patch: &ReviewPatch) {
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(body) = &patch.body {
            self.body = body.clone();
        }
        if let Some(is_draft) = patch.is_draft {
            self.is_draft = is_draft;
        }
        if let Some(liked) = patch.liked {
            self.liked = liked;
        }
        if let Some(like_count) = patch.like_count {
            self.like_count = like_count;
        }
    }

    fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.rating) {
            return Err(format!("rating must be between 1 and 5, got {}", self.rating));
        }
        if !self.is_draft && self.body.trim().is_empty() {
            return Err("published reviews need a body".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFlag {
    Liked,
}

impl Toggle for Review {
    type Flag = ReviewFlag;

    fn flag(&self, flag: ReviewFlag) -> bool {
        match flag {
            ReviewFlag::Liked => self.liked,
        }
    }

    fn flag_patch(flag: ReviewFlag, value: bool) -> ReviewPatch {
        match flag {
            ReviewFlag::Liked => ReviewPatch {
                liked: Some(value),
                ..Default::default()
            },
        }
    }

    fn toggle_patch(&self, flag: ReviewFlag, value: bool) -> ReviewPatch {
        ReviewPatch {
            like_count: Some(step_counter(self.like_count, self.flag(flag), value)),
            ..Self::flag_patch(flag, value)
        }
    }
}

impl Listing for Review {
    fn title(&self) -> &str {
        &self.movie_title
    }

    fn rating(&self) -> Option<f32> {
        Some(f32::from(self.rating))
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}
