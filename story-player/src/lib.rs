pub mod audio;
pub mod engine;
pub mod timer;
pub mod traits;
pub mod tray;
pub mod types;
pub mod utils;
pub mod viewer;

pub use types::*;
pub use audio::{AudioSession, SilentAudioBackend};
pub use engine::StoryPlaybackEngine;
pub use timer::{IntervalTicker, TickOutcome, TimerDriver};
pub use traits::{AudioBackend, TickSource};
pub use tray::{StoryTray, TrayEntry};
pub use viewer::{spawn_viewer, SessionReport, ViewerCommand, ViewerHandle};
