use anyhow::Context;
use chrono::{Duration as ChronoDuration, Utc};
use clap::Parser;
use interfaces::{InMemoryStoryStore, StoryId, UserId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use story_player::utils::{progress, time};
use story_player::{
    spawn_viewer, PlaybackConfig, SilentAudioBackend, StoryItem, StoryTray, UserSummary,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "story-player", about = "Play a story sequence and print its state")]
struct Args {
    /// JSON file holding an array of stories. Uses a built-in sample when omitted.
    #[arg(long)]
    stories: Option<PathBuf>,

    /// Index of the story to open at.
    #[arg(long, default_value_t = 0)]
    start: usize,

    /// Id of the local user.
    #[arg(long, env = "STORY_VIEWER", default_value = "me")]
    viewer: String,

    /// Overrides STORY_DURATION_MS.
    #[arg(long)]
    duration_ms: Option<u64>,

    /// Overrides STORY_TICK_MS.
    #[arg(long)]
    tick_ms: Option<u64>,

    #[arg(long)]
    muted: bool,

    /// Reject audio playback, as a strict autoplay policy would.
    #[arg(long)]
    block_autoplay: bool,

    /// Like the opening story.
    #[arg(long)]
    like: bool,

    #[arg(long, default_value_t = 1000)]
    snapshot_every_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = PlaybackConfig::from_env();
    if let Some(duration_ms) = args.duration_ms {
        config.story_duration_ms = duration_ms;
    }
    if let Some(tick_ms) = args.tick_ms {
        config.tick_ms = tick_ms;
    }
    config.start_muted |= args.muted;
    config.validate()?;

    info!(
        "Each story runs {} ticks of {}ms ({:.3}% per tick)",
        progress::ticks_to_complete(config.story_duration_ms, config.tick_ms),
        config.tick_ms,
        progress::step_per_tick(config.story_duration_ms, config.tick_ms)
    );

    let items = match &args.stories {
        Some(path) => load_stories(path)?,
        None => sample_stories(),
    };

    let viewer = UserSummary::new(args.viewer.clone(), args.viewer.clone());
    let store = Arc::new(InMemoryStoryStore::new(items.clone()));
    store.register_user(viewer.clone()).await;

    let tray = StoryTray::build(&items, &viewer.id);
    for entry in tray.entries() {
        info!(
            "Tray: {} ({} stories, unseen: {})",
            entry.owner_display_name,
            entry.indices.len(),
            entry.has_unseen
        );
    }

    let audio = if args.block_autoplay {
        SilentAudioBackend::new().with_blocked_autoplay()
    } else {
        SilentAudioBackend::new()
    };

    let (handle, mut session) =
        spawn_viewer(items, args.start, viewer, config, store.clone(), audio)?;

    if args.like {
        handle.toggle_like()?;
    }

    let mut every = tokio::time::interval(Duration::from_millis(args.snapshot_every_ms.max(1)));
    let report = loop {
        tokio::select! {
            report = &mut session => break report?,
            _ = every.tick() => {
                if let Ok(snapshot) = handle.snapshot().await {
                    println!("{}", serde_json::to_string(&snapshot)?);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, closing viewer");
                if let Err(e) = handle.close() {
                    error!("Failed to close viewer: {}", e);
                }
            }
        }
    };

    info!("Session finished: {}", serde_json::to_string(&report)?);
    let now = Utc::now();
    for story in store.stories().await {
        info!(
            "{} ({}): {} views, {} likes",
            story.id,
            time::relative_label(story.created_at, now),
            story.viewers.len(),
            story.likers.len()
        );
    }

    Ok(())
}

fn load_stories(path: &Path) -> anyhow::Result<Vec<StoryItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let stories: Vec<StoryItem> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing stories from {}", path.display()))?;
    info!("Loaded {} stories from {}", stories.len(), path.display());
    Ok(stories)
}

fn sample_stories() -> Vec<StoryItem> {
    let now = Utc::now();
    let story = |owner: &str,
                 name: &str,
                 minutes_ago: i64,
                 music: Option<(&str, &str)>| StoryItem {
        id: StoryId::new(Uuid::new_v4().to_string()),
        owner_id: UserId::new(owner),
        owner_display_name: name.to_string(),
        owner_avatar_url: None,
        media_url: format!("https://cdn.example.com/stories/{}.jpg", Uuid::new_v4()),
        music_preview_url: music.map(|(url, _)| url.to_string()),
        music_label: music.map(|(_, label)| label.to_string()),
        created_at: now - ChronoDuration::minutes(minutes_ago),
        viewers: Vec::new(),
        likers: Vec::new(),
    };

    vec![
        story(
            "alice",
            "Alice",
            95,
            Some(("https://cdn.example.com/music/sunrise.mp3", "Sunrise - Kites")),
        ),
        story("alice", "Alice", 40, None),
        story("me", "Me", 5, None),
    ]
}
