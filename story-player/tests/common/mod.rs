#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use story_player::{
    AudioBackend, AudioError, PlaybackConfig, RunId, StoryItem, StoryPlaybackEngine, TickSource,
    UserSummary,
};
use interfaces::{StoryId, UserId};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const ME: &str = "me";

pub fn viewer() -> UserSummary {
    UserSummary::new(ME, "Me")
}

pub fn story(id: &str, owner: &str) -> StoryItem {
    StoryItem {
        id: StoryId::new(id),
        owner_id: UserId::new(owner),
        owner_display_name: owner.to_string(),
        owner_avatar_url: None,
        media_url: format!("https://cdn.example.com/{id}.jpg"),
        music_preview_url: None,
        music_label: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        viewers: Vec::new(),
        likers: Vec::new(),
    }
}

pub fn story_with_music(id: &str, owner: &str, music: &str) -> StoryItem {
    StoryItem {
        music_preview_url: Some(music.to_string()),
        music_label: Some(format!("{music} label")),
        ..story(id, owner)
    }
}

pub fn ids(ids: &[&str]) -> Vec<StoryId> {
    ids.iter().map(|id| StoryId::new(*id)).collect()
}

/// Tick source driven by hand from the test.
#[derive(Debug, Default)]
pub struct ManualTicker {
    pub armed: Option<(RunId, Duration)>,
    pub arm_count: usize,
    pub disarm_count: usize,
}

impl TickSource for ManualTicker {
    fn arm(&mut self, run: RunId, period: Duration) {
        assert!(self.armed.is_none(), "armed twice without disarming");
        self.armed = Some((run, period));
        self.arm_count += 1;
    }

    fn disarm(&mut self) {
        self.armed = None;
        self.disarm_count += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioCall {
    Load(String),
    Play,
    Pause,
    Muted(bool),
    Looping(bool),
    Release,
}

#[derive(Debug, Clone, Default)]
pub struct AudioLog(Arc<Mutex<Vec<AudioCall>>>);

impl AudioLog {
    pub fn calls(&self) -> Vec<AudioCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    fn push(&self, call: AudioCall) {
        self.0.lock().unwrap().push(call);
    }
}

/// Audio backend that records every call into a shared log.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    log: AudioLog,
    pub fail_play: bool,
    pub fail_load: bool,
}

impl RecordingAudio {
    pub fn new() -> (Self, AudioLog) {
        let audio = Self::default();
        let log = audio.log.clone();
        (audio, log)
    }
}

impl AudioBackend for RecordingAudio {
    fn load(&mut self, url: &str) -> Result<(), AudioError> {
        if self.fail_load {
            return Err(AudioError::Load {
                url: url.to_string(),
                reason: "unsupported format".to_string(),
            });
        }
        self.log.push(AudioCall::Load(url.to_string()));
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.fail_play {
            return Err(AudioError::Blocked("autoplay policy".to_string()));
        }
        self.log.push(AudioCall::Play);
        Ok(())
    }

    fn pause(&mut self) {
        self.log.push(AudioCall::Pause);
    }

    fn set_muted(&mut self, muted: bool) {
        self.log.push(AudioCall::Muted(muted));
    }

    fn set_looping(&mut self, looping: bool) {
        self.log.push(AudioCall::Looping(looping));
    }

    fn release(&mut self) {
        self.log.push(AudioCall::Release);
    }
}

pub type TestEngine = StoryPlaybackEngine<ManualTicker, RecordingAudio>;

pub fn open(items: Vec<StoryItem>, start: usize) -> (TestEngine, AudioLog) {
    open_with(items, start, PlaybackConfig::default())
}

pub fn open_with(items: Vec<StoryItem>, start: usize, config: PlaybackConfig) -> (TestEngine, AudioLog) {
    init_tracing();
    let (audio, log) = RecordingAudio::new();
    let engine = StoryPlaybackEngine::open(
        items,
        start,
        viewer(),
        config,
        ManualTicker::default(),
        audio,
    )
    .expect("default config is valid");
    (engine, log)
}

/// Deliver ticks on the active run for `ms` of simulated time. Stops early
/// when no run is active (paused, or closed).
pub fn advance_ms(engine: &mut TestEngine, ms: u64) {
    let ticks = ms / engine.config().tick_ms;
    for _ in 0..ticks {
        match engine.active_run() {
            Some(run) => engine.tick(run),
            None => break,
        }
    }
}
