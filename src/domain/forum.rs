//! Forum Posts and Comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::{step_counter, Record, Toggle};
use crate::views::Listing;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumPost {
    pub author_id: String,
    pub category: String,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub liked: bool,
    pub created_at: DateTime<Utc>,
}

impl ForumPost {
    pub fn new(author_id: impl Into<String>, category: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
            category: category.into(),
            title: title.into(),
            body: body.into(),
            like_count: 0,
            liked: false,
            created_at: Utc::now(),
        }
    }
}

/// Patch shared by posts and comments
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub like_count: Option<u32>,
}

impl PostPatch {
    fn like(value: bool) -> Self {
        Self {
            liked: Some(value),
            ..Default::default()
        }
    }
}

impl Record for ForumPost {
    type Patch = PostPatch;
    const COLLECTION: &'static str = "forum_posts";
    const LABEL: &'static str = "post";

    fn apply(&mut self, patch: &PostPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(body) = &patch.body {
            self.body = body.clone();
        }
        if let Some(liked) = patch.liked {
            self.liked = liked;
        }
        if let Some(like_count) = patch.like_count {
            self.like_count = like_count;
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("post title is required".to_string());
        }
        if self.body.trim().is_empty() {
            return Err("post body is required".to_string());
        }
        Ok(())
    }
}

/// The only flag on posts and comments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liked;

impl Toggle for ForumPost {
    type Flag = Liked;

    fn flag(&self, _: Liked) -> bool {
        self.liked
    }

    fn flag_patch(_: Liked, value: bool) -> PostPatch {
        PostPatch::like(value)
    }

    fn toggle_patch(&self, flag: Liked, value: bool) -> PostPatch {
        PostPatch {
            like_count: Some(step_counter(self.like_count, self.flag(flag), value)),
            ..PostPatch::like(value)
        }
    }
}

impl Listing for ForumPost {
    fn title(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }

    fn category(&self) -> Option<&str> {
        Some(&self.category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub post_id: String,
    pub author_id: String,
    pub body: String,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub liked: bool,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(post_id: impl Into<String>, author_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            author_id: author_id.into(),
            body: body.into(),
            like_count: 0,
            liked: false,
            created_at: Utc::now(),
        }
    }
}

impl Record for Comment {
    type Patch = PostPatch;
    const COLLECTION: &'static str = "comments";
    const LABEL: &'static str = "comment";

    fn apply(&mut self, patch: &PostPatch) {
        if let Some(body) = &patch.body {
            self.body = body.clone();
        }
        if let Some(liked) = patch.liked {
            self.liked = liked;
        }
        if let Some(like_count) = patch.like_count {
            self.like_count = like_count;
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.body.trim().is_empty() {
            return Err("comment is empty".to_string());
        }
        Ok(())
    }
}

impl Toggle for Comment {
    type Flag = Liked;

    fn flag(&self, _: Liked) -> bool {
        self.liked
    }

    fn flag_patch(_: Liked, value: bool) -> PostPatch {
        PostPatch::like(value)
    }

    fn toggle_patch(&self, flag: Liked, value: bool) -> PostPatch {
        PostPatch {
            like_count: Some(step_counter(self.like_count, self.flag(flag), value)),
            ..PostPatch::like(value)
        }
    }
}

impl Listing for Comment {
    fn title(&self) -> &str {
        &self.body
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        Some(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlike_never_goes_negative() {
        let mut comment = Comment::new("p1", "u1", "great pick");
        comment.liked = true;
        let patch = comment.toggle_patch(Liked, false);
        assert_eq!(patch.like_count, Some(0));
    }

    #[test]
    fn test_post_validation() {
        let post = ForumPost::new("u1", "Reviews", "", "body");
        assert!(post.validate().is_err());
        let post = ForumPost::new("u1", "Reviews", "Best of 2023", "Discuss");
        assert!(post.validate().is_ok());
    }
}
