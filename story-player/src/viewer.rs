use crate::engine::StoryPlaybackEngine;
use crate::timer::IntervalTicker;
use crate::traits::AudioBackend;
use crate::types::{
    CloseReason, Effect, PlaybackConfig, PlaybackError, Result, RunId, SessionSnapshot, StoryItem,
    UserListKind, UserSummary,
};
use interfaces::defs::{StoryActions, StoryId, UserId};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// UI events delivered to a running viewer session.
#[derive(Debug)]
pub enum ViewerCommand {
    Next,
    Previous,
    Pause,
    Resume,
    ToggleMute,
    ToggleLike,
    RequestDelete,
    ConfirmDelete,
    CancelDelete,
    ShowUserList(UserListKind),
    CloseUserList,
    Close,
    Snapshot(oneshot::Sender<SessionSnapshot>),
}

enum Completion {
    Like {
        item_id: StoryId,
        outcome: anyhow::Result<()>,
    },
    Delete {
        item_id: StoryId,
        outcome: anyhow::Result<()>,
    },
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionReport {
    /// Every item shown, in order, repeats included.
    pub viewed: Vec<StoryId>,
    pub final_index: usize,
    pub close_reason: CloseReason,
}

/// Cheap, cloneable handle used by the UI to drive a viewer session.
/// Dropping every handle unmounts the session.
#[derive(Clone)]
pub struct ViewerHandle {
    commands: mpsc::UnboundedSender<ViewerCommand>,
}

impl ViewerHandle {
    pub fn send(&self, command: ViewerCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::SessionClosed)
    }

    pub fn next(&self) -> Result<()> {
        self.send(ViewerCommand::Next)
    }

    pub fn previous(&self) -> Result<()> {
        self.send(ViewerCommand::Previous)
    }

    pub fn pause(&self) -> Result<()> {
        self.send(ViewerCommand::Pause)
    }

    pub fn resume(&self) -> Result<()> {
        self.send(ViewerCommand::Resume)
    }

    pub fn toggle_mute(&self) -> Result<()> {
        self.send(ViewerCommand::ToggleMute)
    }

    pub fn toggle_like(&self) -> Result<()> {
        self.send(ViewerCommand::ToggleLike)
    }

    pub fn request_delete(&self) -> Result<()> {
        self.send(ViewerCommand::RequestDelete)
    }

    pub fn confirm_delete(&self) -> Result<()> {
        self.send(ViewerCommand::ConfirmDelete)
    }

    pub fn cancel_delete(&self) -> Result<()> {
        self.send(ViewerCommand::CancelDelete)
    }

    pub fn show_user_list(&self, kind: UserListKind) -> Result<()> {
        self.send(ViewerCommand::ShowUserList(kind))
    }

    pub fn close_user_list(&self) -> Result<()> {
        self.send(ViewerCommand::CloseUserList)
    }

    pub fn close(&self) -> Result<()> {
        self.send(ViewerCommand::Close)
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        let (reply, response) = oneshot::channel();
        self.send(ViewerCommand::Snapshot(reply))?;
        response.await.map_err(|_| PlaybackError::SessionClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

/// Open a viewer session on the current tokio runtime.
///
/// The returned task resolves once the session has closed, after
/// `on_close` has been called on `actions`.
pub fn spawn_viewer<A, B>(
    items: Vec<StoryItem>,
    start_index: usize,
    viewer: UserSummary,
    config: PlaybackConfig,
    actions: Arc<A>,
    audio: B,
) -> Result<(ViewerHandle, JoinHandle<SessionReport>)>
where
    A: StoryActions + ?Sized + 'static,
    B: AudioBackend + 'static,
{
    let (tick_sender, ticks) = mpsc::unbounded_channel();
    let (command_sender, commands) = mpsc::unbounded_channel();
    let (completion_sender, completions) = mpsc::unbounded_channel();

    let viewer_id = viewer.id.clone();
    let engine = StoryPlaybackEngine::open(
        items,
        start_index,
        viewer,
        config,
        IntervalTicker::new(tick_sender),
        audio,
    )?;

    let session = ViewerSession {
        engine,
        actions,
        viewer_id,
        ticks,
        commands,
        completions,
        completion_sender,
        viewed: Vec::new(),
    };

    let task = tokio::spawn(session.run());
    Ok((
        ViewerHandle {
            commands: command_sender,
        },
        task,
    ))
}

struct ViewerSession<A: StoryActions + ?Sized, B: AudioBackend> {
    engine: StoryPlaybackEngine<IntervalTicker, B>,
    actions: Arc<A>,
    viewer_id: UserId,
    ticks: mpsc::UnboundedReceiver<RunId>,
    commands: mpsc::UnboundedReceiver<ViewerCommand>,
    completions: mpsc::UnboundedReceiver<Completion>,
    completion_sender: mpsc::UnboundedSender<Completion>,
    viewed: Vec<StoryId>,
}

impl<A, B> ViewerSession<A, B>
where
    A: StoryActions + ?Sized + 'static,
    B: AudioBackend + 'static,
{
    async fn run(mut self) -> SessionReport {
        self.flush();

        while !self.engine.is_closed() {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.apply(command),
                    None => {
                        info!("All viewer handles dropped, unmounting");
                        self.engine.unmount();
                    }
                },
                Some(run) = self.ticks.recv() => self.engine.tick(run),
                Some(completion) = self.completions.recv() => self.settle(completion),
            }
            self.flush();
        }

        SessionReport {
            viewed: self.viewed,
            final_index: self.engine.current_index(),
            close_reason: self
                .engine
                .close_reason()
                .unwrap_or(CloseReason::Unmounted),
        }
    }

    fn apply(&mut self, command: ViewerCommand) {
        debug!("Viewer command: {:?}", command);
        match command {
            ViewerCommand::Next => self.engine.next(),
            ViewerCommand::Previous => self.engine.previous(),
            ViewerCommand::Pause => self.engine.pause(),
            ViewerCommand::Resume => self.engine.resume(),
            ViewerCommand::ToggleMute => self.engine.toggle_mute(),
            ViewerCommand::ToggleLike => self.engine.toggle_like(),
            ViewerCommand::RequestDelete => self.engine.request_delete(),
            ViewerCommand::ConfirmDelete => self.engine.confirm_delete(),
            ViewerCommand::CancelDelete => self.engine.cancel_delete(),
            ViewerCommand::ShowUserList(kind) => self.engine.show_user_list(kind),
            ViewerCommand::CloseUserList => self.engine.close_user_list(),
            ViewerCommand::Close => self.engine.close(),
            ViewerCommand::Snapshot(reply) => {
                let _ = reply.send(self.engine.snapshot());
            }
        }
    }

    fn settle(&mut self, completion: Completion) {
        match completion {
            Completion::Like { item_id, outcome } => self.engine.like_settled(&item_id, outcome),
            Completion::Delete { item_id, outcome } => {
                self.engine.delete_settled(&item_id, outcome)
            }
        }
    }

    /// Execute queued effects. Collaborator calls run on their own tasks so
    /// navigation never waits on them.
    fn flush(&mut self) {
        for effect in self.engine.take_effects() {
            match effect {
                Effect::View { item_id } => {
                    self.viewed.push(item_id.clone());
                    let actions = self.actions.clone();
                    let viewer = self.viewer_id.clone();
                    tokio::spawn(async move {
                        if let Err(e) = actions.mark_viewed(&item_id, &viewer).await {
                            warn!("{}", PlaybackError::external("mark_viewed", &item_id, e));
                        }
                    });
                }
                Effect::ToggleLike { item_id } => {
                    let actions = self.actions.clone();
                    let viewer = self.viewer_id.clone();
                    let completions = self.completion_sender.clone();
                    tokio::spawn(async move {
                        let outcome = actions.toggle_like(&item_id, &viewer).await;
                        let _ = completions.send(Completion::Like { item_id, outcome });
                    });
                }
                Effect::Delete { item_id } => {
                    let actions = self.actions.clone();
                    let viewer = self.viewer_id.clone();
                    let completions = self.completion_sender.clone();
                    tokio::spawn(async move {
                        let outcome = actions.delete_story(&item_id, &viewer).await;
                        let _ = completions.send(Completion::Delete { item_id, outcome });
                    });
                }
                Effect::Close => self.actions.on_close(),
            }
        }
    }
}
