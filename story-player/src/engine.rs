use crate::audio::AudioSession;
use crate::timer::{TickOutcome, TimerDriver};
use crate::traits::{AudioBackend, TickSource};
use crate::types::{
    CloseReason, Effect, PendingDialog, PlaybackConfig, PlaybackError, PlaybackState, Result,
    RunId, SessionSnapshot, StoryItem, UserListKind, UserSummary,
};
use interfaces::defs::StoryId;
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, warn};

/// Drives one story viewer session: timed auto-advance, navigation, pause
/// and dialog handling, audio, and like/view/delete bookkeeping.
///
/// The engine never talks to the outside world directly. Every transition
/// queues [`Effect`]s that the host drains with [`take_effects`] and
/// executes; results of asynchronous calls come back through
/// [`like_settled`] and [`delete_settled`].
///
/// [`take_effects`]: StoryPlaybackEngine::take_effects
/// [`like_settled`]: StoryPlaybackEngine::like_settled
/// [`delete_settled`]: StoryPlaybackEngine::delete_settled
pub struct StoryPlaybackEngine<T: TickSource, B: AudioBackend> {
    items: Vec<StoryItem>,
    viewer: UserSummary,
    config: PlaybackConfig,
    timer: TimerDriver<T>,
    audio: AudioSession<B>,
    state: PlaybackState,
    current_index: usize,
    held: bool,
    pending_dialog: PendingDialog,
    // item id -> (position toggled, whether the viewer liked it before)
    pending_likes: HashMap<StoryId, (usize, bool)>,
    delete_in_flight: Option<StoryId>,
    close_reason: Option<CloseReason>,
    effects: Vec<Effect>,
}

impl<T: TickSource, B: AudioBackend> StoryPlaybackEngine<T, B> {
    /// Open a session on `items` at `start_index` (clamped into range).
    ///
    /// Only an invalid timer configuration is an error. An empty sequence
    /// yields an engine that is already closed and has queued [`Effect::Close`].
    pub fn open(
        items: Vec<StoryItem>,
        start_index: usize,
        viewer: UserSummary,
        config: PlaybackConfig,
        ticker: T,
        audio: B,
    ) -> Result<Self> {
        config.validate()?;

        let mut engine = Self {
            items,
            viewer,
            config,
            timer: TimerDriver::new(ticker),
            audio: AudioSession::new(audio, config.start_muted),
            state: PlaybackState::Playing,
            current_index: 0,
            held: false,
            pending_dialog: PendingDialog::None,
            pending_likes: HashMap::new(),
            delete_in_flight: None,
            close_reason: None,
            effects: Vec::new(),
        };

        if engine.items.is_empty() {
            warn!("{}", PlaybackError::EmptySequence);
            engine.finish(CloseReason::EmptySequence);
            return Ok(engine);
        }

        let mut seen = HashSet::new();
        for item in &engine.items {
            if !seen.insert(&item.id) {
                warn!("Duplicate story id {} in viewer sequence", item.id);
            }
        }

        let last = engine.items.len() - 1;
        let start = start_index.min(last);
        if start != start_index {
            debug!("Clamped start index {} to {}", start_index, start);
        }

        info!(
            "Opening story viewer for {} at {}/{}",
            engine.viewer.id,
            start + 1,
            engine.items.len()
        );
        engine.enter(start);
        Ok(engine)
    }

    /// Feed one timer tick. Stale runs and ticks after close are ignored.
    pub fn tick(&mut self, run: RunId) {
        if self.is_closed() {
            return;
        }
        if self.timer.tick(run) == TickOutcome::Completed {
            debug!("Story {} finished playing", self.current_index);
            self.advance();
        }
    }

    pub fn next(&mut self) {
        if !self.accepts_navigation() {
            return;
        }
        self.advance();
    }

    pub fn previous(&mut self) {
        if !self.accepts_navigation() {
            return;
        }
        if self.current_index == 0 {
            debug!("Already at the first story");
            return;
        }
        self.enter(self.current_index - 1);
    }

    /// Hover/hold started.
    pub fn pause(&mut self) {
        if self.is_closed() {
            return;
        }
        self.held = true;
        self.refresh_pause();
    }

    /// Hover/hold ended.
    pub fn resume(&mut self) {
        if self.is_closed() {
            return;
        }
        self.held = false;
        self.refresh_pause();
    }

    pub fn toggle_mute(&mut self) {
        if self.is_closed() {
            return;
        }
        let muted = !self.audio.is_muted();
        self.audio.set_muted(muted);
        debug!("Muted: {}", muted);
    }

    /// Flip the viewer's like on the current item right away and ask the
    /// host to persist it. The change is reverted if the call fails.
    pub fn toggle_like(&mut self) {
        if self.is_closed() {
            return;
        }
        let index = self.current_index;
        let item = &mut self.items[index];
        if self.pending_likes.contains_key(&item.id) {
            debug!("Like toggle for {} already in flight", item.id);
            return;
        }

        let was_liked = item.is_liked_by(&self.viewer.id);
        if was_liked {
            item.remove_liker(&self.viewer.id);
        } else {
            item.insert_liker(self.viewer.clone());
        }

        self.pending_likes.insert(item.id.clone(), (index, was_liked));
        self.effects.push(Effect::ToggleLike {
            item_id: item.id.clone(),
        });
    }

    pub fn like_settled(&mut self, item_id: &StoryId, outcome: anyhow::Result<()>) {
        let Some((index, was_liked)) = self.pending_likes.remove(item_id) else {
            debug!("No like toggle pending for {}", item_id);
            return;
        };

        let Err(e) = outcome else {
            return;
        };
        warn!("{}", PlaybackError::external("toggle_like", item_id, e));

        // Revert the exact slot: duplicate ids are played by position.
        if let Some(item) = self.items.get_mut(index).filter(|item| &item.id == item_id) {
            if was_liked {
                item.insert_liker(self.viewer.clone());
            } else {
                item.remove_liker(&self.viewer.id);
            }
        }
    }

    /// Ask for delete confirmation. Only the owner of the current item may.
    pub fn request_delete(&mut self) {
        if self.is_closed()
            || self.pending_dialog != PendingDialog::None
            || self.delete_in_flight.is_some()
        {
            return;
        }
        if !self.can_delete() {
            warn!(
                "{} may not delete story {}",
                self.viewer.id, self.items[self.current_index].id
            );
            return;
        }
        self.pending_dialog = PendingDialog::ConfirmDelete;
        self.refresh_pause();
    }

    /// The session stays paused until [`delete_settled`] closes it.
    ///
    /// [`delete_settled`]: StoryPlaybackEngine::delete_settled
    pub fn confirm_delete(&mut self) {
        if self.is_closed()
            || self.pending_dialog != PendingDialog::ConfirmDelete
            || self.delete_in_flight.is_some()
        {
            return;
        }
        let item_id = self.items[self.current_index].id.clone();
        self.pending_dialog = PendingDialog::None;
        self.delete_in_flight = Some(item_id.clone());
        self.refresh_pause();
        info!("Deleting story {}", item_id);
        self.effects.push(Effect::Delete { item_id });
    }

    /// Closes the session whatever the outcome. A call that never resolves
    /// leaves the session paused until the host calls [`close`] or
    /// [`unmount`].
    ///
    /// [`close`]: StoryPlaybackEngine::close
    /// [`unmount`]: StoryPlaybackEngine::unmount
    pub fn delete_settled(&mut self, item_id: &StoryId, outcome: anyhow::Result<()>) {
        if self.is_closed() || self.delete_in_flight.as_ref() != Some(item_id) {
            return;
        }
        self.delete_in_flight = None;
        if let Err(e) = outcome {
            warn!("{}", PlaybackError::external("delete_story", item_id, e));
        }
        self.finish(CloseReason::Deleted);
    }

    pub fn cancel_delete(&mut self) {
        if self.pending_dialog != PendingDialog::ConfirmDelete {
            return;
        }
        self.pending_dialog = PendingDialog::None;
        self.refresh_pause();
    }

    pub fn show_user_list(&mut self, kind: UserListKind) {
        if self.is_closed()
            || self.pending_dialog == PendingDialog::ConfirmDelete
            || self.delete_in_flight.is_some()
        {
            return;
        }
        self.pending_dialog = PendingDialog::UserList(kind);
        self.refresh_pause();
    }

    pub fn close_user_list(&mut self) {
        if !matches!(self.pending_dialog, PendingDialog::UserList(_)) {
            return;
        }
        self.pending_dialog = PendingDialog::None;
        self.refresh_pause();
    }

    /// Explicit close from the user.
    pub fn close(&mut self) {
        self.finish(CloseReason::Explicit);
    }

    /// The host is tearing the viewer down without a user action.
    pub fn unmount(&mut self) {
        self.finish(CloseReason::Unmounted);
    }

    /// Drain the queued effects in the order they were produced.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Playing, paused or closed.
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == PlaybackState::Closed
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    /// Why the session closed; `None` while it is open.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason
    }

    /// Position in the sequence, not an id.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The story on screen, with optimistic like changes applied.
    pub fn current_item(&self) -> Option<&StoryItem> {
        self.items.get(self.current_index)
    }

    /// The session's shadow copy of the sequence.
    pub fn items(&self) -> &[StoryItem] {
        &self.items
    }

    /// The local user the session plays for.
    pub fn viewer(&self) -> &UserSummary {
        &self.viewer
    }

    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Fill of the current story's bar, 0 to 100.
    pub fn progress(&self) -> f64 {
        self.timer.progress()
    }

    /// The timer run currently accepting ticks.
    pub fn active_run(&self) -> Option<RunId> {
        self.timer.active_run()
    }

    /// The tick source the timer arms.
    pub fn ticker(&self) -> &T {
        self.timer.source()
    }

    /// The session's audio element.
    pub fn audio(&self) -> &AudioSession<B> {
        &self.audio
    }

    pub fn is_muted(&self) -> bool {
        self.audio.is_muted()
    }

    /// The blocking dialog, if any.
    pub fn pending_dialog(&self) -> PendingDialog {
        self.pending_dialog
    }

    /// Only the owner of the current story may delete it.
    pub fn can_delete(&self) -> bool {
        self.current_item()
            .is_some_and(|item| item.owner_id == self.viewer.id)
    }

    /// Whether the local viewer likes the current story.
    pub fn is_liked(&self) -> bool {
        self.current_item()
            .is_some_and(|item| item.is_liked_by(&self.viewer.id))
    }

    /// Viewers or likers of the current story, for the user list dialog.
    pub fn user_list(&self, kind: UserListKind) -> &[UserSummary] {
        match (self.current_item(), kind) {
            (Some(item), UserListKind::Views) => item.viewers.as_slice(),
            (Some(item), UserListKind::Likes) => item.likers.as_slice(),
            (None, _) => &[],
        }
    }

    /// Fill level of each progress bar segment.
    pub fn segments(&self) -> Vec<f64> {
        let progress = self.progress();
        (0..self.items.len())
            .map(|index| match index.cmp(&self.current_index) {
                std::cmp::Ordering::Less => 100.0,
                std::cmp::Ordering::Equal => progress,
                std::cmp::Ordering::Greater => 0.0,
            })
            .collect()
    }

    /// Everything a UI needs to render the current frame.
    pub fn snapshot(&self) -> SessionSnapshot {
        let item = self.current_item();
        SessionSnapshot {
            state: self.state,
            current_index: self.current_index,
            item_count: self.items.len(),
            progress: self.progress(),
            is_muted: self.is_muted(),
            pending_dialog: self.pending_dialog,
            item_id: item.map(|item| item.id.clone()),
            owner_id: item.map(|item| item.owner_id.clone()),
            owner_display_name: item.map(|item| item.owner_display_name.clone()),
            media_url: item.map(|item| item.media_url.clone()),
            music_label: item.and_then(|item| item.music_label.clone()),
            liked: self.is_liked(),
            like_count: item.map_or(0, |item| item.likers.len()),
            view_count: item.map_or(0, |item| item.viewers.len()),
            can_delete: self.can_delete(),
            segments: self.segments(),
        }
    }

    fn accepts_navigation(&self) -> bool {
        if self.is_closed() {
            return false;
        }
        if self.pending_dialog != PendingDialog::None || self.delete_in_flight.is_some() {
            debug!("Navigation ignored while a dialog is open");
            return false;
        }
        true
    }

    fn advance(&mut self) {
        if self.current_index + 1 >= self.items.len() {
            self.finish(CloseReason::Finished);
        } else {
            self.enter(self.current_index + 1);
        }
    }

    /// Make `index` current: reset progress, restart the timer, swap the
    /// track and announce the view, as one step.
    fn enter(&mut self, index: usize) {
        self.current_index = index;

        if let Err(e) = self
            .timer
            .start(self.config.story_duration_ms, self.config.tick_ms)
        {
            error!("Failed to start story timer: {}", e);
        }
        if self.state == PlaybackState::Paused {
            self.timer.stop();
        }

        let item = &self.items[index];
        self.audio.set_track(item.music_preview_url.as_deref());
        debug!("Showing story {} ({}/{})", item.id, index + 1, self.items.len());
        self.effects.push(Effect::View {
            item_id: item.id.clone(),
        });
    }

    fn refresh_pause(&mut self) {
        let wants_pause = self.held
            || self.pending_dialog != PendingDialog::None
            || self.delete_in_flight.is_some();

        match (self.state, wants_pause) {
            (PlaybackState::Playing, true) => {
                self.timer.stop();
                self.state = PlaybackState::Paused;
                debug!("Paused at {:.1}%", self.timer.progress());
            }
            (PlaybackState::Paused, false) => {
                self.state = PlaybackState::Playing;
                if self.timer.resume().is_none() {
                    debug!("Nothing to resume on story {}", self.current_index);
                }
                debug!("Resumed at {:.1}%", self.timer.progress());
            }
            _ => {}
        }
    }

    fn finish(&mut self, reason: CloseReason) {
        if self.close_reason.is_some() {
            return;
        }
        self.timer.stop();
        self.audio.teardown();
        self.pending_dialog = PendingDialog::None;
        self.held = false;
        self.state = PlaybackState::Closed;
        self.close_reason = Some(reason);
        info!("Story viewer closed ({:?})", reason);
        self.effects.push(Effect::Close);
    }
}
