use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::defs::StoryActions;
use crate::defs::StoryId;
use crate::defs::StoryItem;
use crate::defs::UserId;
use crate::defs::UserSummary;

/// In-memory story backend. Keeps the authoritative copy of every story
/// and applies view, like and delete requests to it.
pub struct InMemoryStoryStore {
    stories: RwLock<Vec<StoryItem>>,
    users: RwLock<HashMap<UserId, UserSummary>>,
    view_log: RwLock<Vec<(StoryId, UserId)>>,
    fail_likes: AtomicBool,
    fail_deletes: AtomicBool,
    close_count: AtomicUsize,
}

impl InMemoryStoryStore {
    pub fn new(stories: Vec<StoryItem>) -> Self {
        Self {
            stories: RwLock::new(stories),
            users: RwLock::new(HashMap::new()),
            view_log: RwLock::new(Vec::new()),
            fail_likes: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            close_count: AtomicUsize::new(0),
        }
    }

    /// Register a display summary so likes and views carry a name.
    pub async fn register_user(&self, user: UserSummary) {
        self.users.write().await.insert(user.id.clone(), user);
    }

    pub fn set_fail_likes(&self, fail: bool) {
        self.fail_likes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub async fn stories(&self) -> Vec<StoryItem> {
        self.stories.read().await.clone()
    }

    pub async fn get(&self, id: &StoryId) -> Option<StoryItem> {
        self.stories.read().await.iter().find(|story| &story.id == id).cloned()
    }

    /// Every mark_viewed call in arrival order, including repeats.
    pub async fn view_log(&self) -> Vec<(StoryId, UserId)> {
        self.view_log.read().await.clone()
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    async fn summary_for(&self, user: &UserId) -> UserSummary {
        match self.users.read().await.get(user) {
            Some(summary) => summary.clone(),
            None => UserSummary {
                id: user.clone(),
                display_name: user.0.clone(),
                avatar_url: None,
            },
        }
    }
}

#[async_trait]
impl StoryActions for InMemoryStoryStore {
    async fn mark_viewed(&self, item: &StoryId, viewer: &UserId) -> Result<()> {
        self.view_log.write().await.push((item.clone(), viewer.clone()));

        let summary = self.summary_for(viewer).await;
        let mut stories = self.stories.write().await;
        let story = stories
            .iter_mut()
            .find(|story| &story.id == item)
            .ok_or_else(|| anyhow!("story {} not found", item))?;

        // Server-side dedup: the viewer may signal the same item many times.
        if story.insert_viewer(summary) {
            debug!("Recorded first view of {} by {}", item, viewer);
        }
        Ok(())
    }

    async fn toggle_like(&self, item: &StoryId, viewer: &UserId) -> Result<()> {
        if self.fail_likes.load(Ordering::SeqCst) {
            return Err(anyhow!("like service unavailable"));
        }

        let summary = self.summary_for(viewer).await;
        let mut stories = self.stories.write().await;
        let story = stories
            .iter_mut()
            .find(|story| &story.id == item)
            .ok_or_else(|| anyhow!("story {} not found", item))?;

        if !story.remove_liker(viewer) {
            story.insert_liker(summary);
        }
        Ok(())
    }

    async fn delete_story(&self, item: &StoryId, viewer: &UserId) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(anyhow!("delete service unavailable"));
        }

        let mut stories = self.stories.write().await;
        let position = stories
            .iter()
            .position(|story| &story.id == item)
            .ok_or_else(|| anyhow!("story {} not found", item))?;

        if &stories[position].owner_id != viewer {
            return Err(anyhow!("{} does not own story {}", viewer, item));
        }

        stories.remove(position);
        info!("Deleted story {}", item);
        Ok(())
    }

    fn on_close(&self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
    }
}
