use interfaces::defs::{StoryId, UserId};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{info, warn};

pub use interfaces::defs::{StoryItem, UserSummary};

pub const DEFAULT_STORY_DURATION_MS: u64 = 15_000;
pub const DEFAULT_TICK_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    pub story_duration_ms: u64,
    pub tick_ms: u64,
    pub start_muted: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            story_duration_ms: DEFAULT_STORY_DURATION_MS,
            tick_ms: DEFAULT_TICK_MS,
            start_muted: false,
        }
    }
}

impl PlaybackConfig {
    /// Load overrides from `STORY_DURATION_MS`, `STORY_TICK_MS` and
    /// `STORY_START_MUTED`, falling back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            story_duration_ms: try_load("STORY_DURATION_MS", defaults.story_duration_ms),
            tick_ms: try_load("STORY_TICK_MS", defaults.tick_ms),
            start_muted: try_load_flag("STORY_START_MUTED", defaults.start_muted),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_timing(self.story_duration_ms, self.tick_ms)
    }
}

pub(crate) fn validate_timing(duration_ms: u64, tick_ms: u64) -> Result<()> {
    if duration_ms == 0 {
        return Err(PlaybackError::InvalidConfiguration(
            "story duration must be positive".to_string(),
        ));
    }
    if tick_ms == 0 {
        return Err(PlaybackError::InvalidConfiguration(
            "tick interval must be positive".to_string(),
        ));
    }
    Ok(())
}

fn try_load<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

/// Accepts `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off`, any case.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn try_load_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => parse_flag(&raw).unwrap_or_else(|| {
            warn!("Invalid {key} value {raw:?}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}

/// Identifies one run of the progress timer. Ticks carrying an older id are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Playing,
    Paused,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserListKind {
    Views,
    Likes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingDialog {
    #[default]
    None,
    ConfirmDelete,
    UserList(UserListKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// The user dismissed the viewer.
    Explicit,
    /// Auto-advance ran past the last item.
    Finished,
    /// The current item was deleted (or the delete attempt failed).
    Deleted,
    /// Opened with nothing to show.
    EmptySequence,
    /// Every handle to the session went away.
    Unmounted,
}

/// Side effects requested by the engine. The host executes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    View { item_id: StoryId },
    ToggleLike { item_id: StoryId },
    Delete { item_id: StoryId },
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub current_index: usize,
    pub item_count: usize,
    pub progress: f64,
    pub is_muted: bool,
    pub pending_dialog: PendingDialog,
    pub item_id: Option<StoryId>,
    pub owner_id: Option<UserId>,
    pub owner_display_name: Option<String>,
    pub media_url: Option<String>,
    pub music_label: Option<String>,
    pub liked: bool,
    pub like_count: usize,
    pub view_count: usize,
    pub can_delete: bool,
    pub segments: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    #[error("Playback blocked: {0}")]
    Blocked(String),

    #[error("Failed to load track {url}: {reason}")]
    Load { url: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Cannot open a viewer with no stories")]
    EmptySequence,

    #[error("{call} failed for story {item_id}: {message}")]
    ExternalCallFailure {
        call: &'static str,
        item_id: StoryId,
        message: String,
    },

    #[error("Audio playback failed: {0}")]
    PlaybackResourceFailure(#[from] AudioError),

    #[error("Viewer session is closed")]
    SessionClosed,
}

impl PlaybackError {
    pub fn external(call: &'static str, item_id: &StoryId, error: impl Display) -> Self {
        Self::ExternalCallFailure {
            call,
            item_id: item_id.clone(),
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
