use anyhow::Result;
use async_trait::async_trait;

use crate::defs::StoryActions;
use crate::defs::StoryId;
use crate::defs::UserId;

pub struct NoopStoryActions;

#[async_trait]
impl StoryActions for NoopStoryActions {
    async fn mark_viewed(&self, _item: &StoryId, _viewer: &UserId) -> Result<()> {
        Ok(())
    }

    async fn toggle_like(&self, _item: &StoryId, _viewer: &UserId) -> Result<()> {
        Ok(())
    }

    async fn delete_story(&self, _item: &StoryId, _viewer: &UserId) -> Result<()> {
        Ok(())
    }

    fn on_close(&self) {
        // Nothing to release.
    }
}
