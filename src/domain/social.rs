//! Follow and club membership cards
//!
//! Both are viewer-relative rows: a flag for the viewing user plus the
//! aggregate count shown next to it.

use serde::{Deserialize, Serialize};

use super::record::{step_counter, Record, Toggle};
use crate::views::Listing;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCard {
    pub viewer_id: String,
    pub profile_id: String,
    pub display_name: String,
    #[serde(default)]
    pub follower_count: u32,
    #[serde(default)]
    pub following: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub following: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follower_count: Option<u32>,
}

impl Record for ProfileCard {
    type Patch = ProfilePatch;
    const COLLECTION: &'static str = "follows";
    const LABEL: &'static str = "follow";

    fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(following) = patch.following {
            self.following = following;
        }
        if let Some(count) = patch.follower_count {
            self.follower_count = count;
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.viewer_id == self.profile_id {
            return Err("cannot follow yourself".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Following;

impl Toggle for ProfileCard {
    type Flag = Following;

    fn flag(&self, _: Following) -> bool {
        self.following
    }

    fn flag_patch(_: Following, value: bool) -> ProfilePatch {
        ProfilePatch {
            following: Some(value),
            follower_count: None,
        }
    }

    fn toggle_patch(&self, _: Following, value: bool) -> ProfilePatch {
        ProfilePatch {
            following: Some(value),
            follower_count: Some(step_counter(self.follower_count, self.following, value)),
        }
    }
}

impl Listing for ProfileCard {
    fn title(&self) -> &str {
        &self.display_name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub user_id: String,
    pub name: String,
    pub category: Option<String>,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub joined: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClubPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joined: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<u32>,
}

impl Record for Club {
    type Patch = ClubPatch;
    const COLLECTION: &'static str = "club_memberships";
    const LABEL: &'static str = "club membership";

    fn apply(&mut self, patch: &ClubPatch) {
        if let Some(joined) = patch.joined {
            self.joined = joined;
        }
        if let Some(count) = patch.member_count {
            self.member_count = count;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Joined;

impl Toggle for Club {
    type Flag = Joined;

    fn flag(&self, _: Joined) -> bool {
        self.joined
    }

    fn flag_patch(_: Joined, value: bool) -> ClubPatch {
        ClubPatch {
            joined: Some(value),
            member_count: None,
        }
    }

    fn toggle_patch(&self, _: Joined, value: bool) -> ClubPatch {
        ClubPatch {
            joined: Some(value),
            member_count: Some(step_counter(self.member_count, self.joined, value)),
        }
    }
}

impl Listing for Club {
    fn title(&self) -> &str {
        &self.name
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}
