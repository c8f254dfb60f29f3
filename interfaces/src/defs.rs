use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl StoryId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserSummary {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            display_name: display_name.into(),
            avatar_url: None,
        }
    }
}

/// One ephemeral media post as handed to the viewer.
///
/// `viewers` and `likers` are sets keyed by user id; use the helpers below
/// rather than pushing into the vectors directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryItem {
    pub id: StoryId,
    pub owner_id: UserId,
    pub owner_display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_avatar_url: Option<String>,
    pub media_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_label: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub viewers: Vec<UserSummary>,
    #[serde(default)]
    pub likers: Vec<UserSummary>,
}

impl StoryItem {
    pub fn is_liked_by(&self, user: &UserId) -> bool {
        self.likers.iter().any(|liker| &liker.id == user)
    }

    pub fn has_viewer(&self, user: &UserId) -> bool {
        self.viewers.iter().any(|viewer| &viewer.id == user)
    }

    /// Returns false when the user was already present.
    pub fn insert_liker(&mut self, user: UserSummary) -> bool {
        if self.is_liked_by(&user.id) {
            return false;
        }
        self.likers.push(user);
        true
    }

    pub fn remove_liker(&mut self, user: &UserId) -> bool {
        let before = self.likers.len();
        self.likers.retain(|liker| &liker.id != user);
        self.likers.len() != before
    }

    pub fn insert_viewer(&mut self, user: UserSummary) -> bool {
        if self.has_viewer(&user.id) {
            return false;
        }
        self.viewers.push(user);
        true
    }
}

// Object style note:
// Implementations of StoryActions are owned by the host application and are
// shared with the viewer runtime behind an Arc. The viewer never waits on
// these calls before accepting further navigation.

/// Side effects the story viewer delegates to the host application.
#[async_trait]
pub trait StoryActions: Send + Sync {
    /// Record that `viewer` was shown the item. Dedup is the implementor's job.
    async fn mark_viewed(&self, item: &StoryId, viewer: &UserId) -> Result<()>;

    /// Flip the viewer's like on the item.
    async fn toggle_like(&self, item: &StoryId, viewer: &UserId) -> Result<()>;

    async fn delete_story(&self, item: &StoryId, viewer: &UserId) -> Result<()>;

    /// The viewer session ended. Called exactly once per session.
    fn on_close(&self);
}
