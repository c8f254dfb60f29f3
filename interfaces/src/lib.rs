pub mod baseline;
pub mod defs;
pub mod empty;

pub use baseline::InMemoryStoryStore;
pub use defs::{StoryActions, StoryId, StoryItem, UserId, UserSummary};
pub use empty::NoopStoryActions;
