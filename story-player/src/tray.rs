use crate::types::StoryItem;
use interfaces::defs::UserId;
use serde::Serialize;
use std::collections::HashMap;

/// One owner's bubble in the story tray.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrayEntry {
    pub owner_id: UserId,
    pub owner_display_name: String,
    pub owner_avatar_url: Option<String>,
    /// Positions of this owner's stories in the source list, in order.
    pub indices: Vec<usize>,
    pub has_unseen: bool,
    /// Source index to open the viewer at: first unseen story, else the first.
    pub open_at: usize,
    pub is_own: bool,
}

impl TrayEntry {
    /// The owner's stories and the start index within them, ready for
    /// `spawn_viewer` / `StoryPlaybackEngine::open`.
    pub fn stories(&self, items: &[StoryItem]) -> (Vec<StoryItem>, usize) {
        let stories = self
            .indices
            .iter()
            .filter_map(|&index| items.get(index).cloned())
            .collect();
        let start = self
            .indices
            .iter()
            .position(|&index| index == self.open_at)
            .unwrap_or(0);
        (stories, start)
    }
}

/// Stories grouped by owner in first-appearance order, the viewer's own first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoryTray {
    entries: Vec<TrayEntry>,
}

impl StoryTray {
    pub fn build(items: &[StoryItem], viewer: &UserId) -> Self {
        let mut entries: Vec<TrayEntry> = Vec::new();
        let mut by_owner: HashMap<&UserId, usize> = HashMap::new();

        for (index, item) in items.iter().enumerate() {
            let unseen = !item.has_viewer(viewer) && &item.owner_id != viewer;
            match by_owner.get(&item.owner_id) {
                Some(&slot) => {
                    let entry = &mut entries[slot];
                    entry.indices.push(index);
                    if unseen && !entry.has_unseen {
                        entry.has_unseen = true;
                        entry.open_at = index;
                    }
                }
                None => {
                    by_owner.insert(&item.owner_id, entries.len());
                    entries.push(TrayEntry {
                        owner_id: item.owner_id.clone(),
                        owner_display_name: item.owner_display_name.clone(),
                        owner_avatar_url: item.owner_avatar_url.clone(),
                        indices: vec![index],
                        has_unseen: unseen,
                        open_at: index,
                        is_own: &item.owner_id == viewer,
                    });
                }
            }
        }

        // Stable: keeps first-appearance order inside each group.
        entries.sort_by_key(|entry| !entry.is_own);
        Self { entries }
    }

    pub fn entries(&self) -> &[TrayEntry] {
        &self.entries
    }

    pub fn entry_for(&self, owner: &UserId) -> Option<&TrayEntry> {
        self.entries.iter().find(|entry| &entry.owner_id == owner)
    }

    pub fn unseen_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.has_unseen).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
