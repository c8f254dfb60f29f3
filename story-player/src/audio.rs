use crate::traits::AudioBackend;
use crate::types::{AudioError, PlaybackError};
use tracing::{debug, warn};

/// Owns the one audio element of a viewer session and keeps it in step with
/// the active story's background track.
pub struct AudioSession<B: AudioBackend> {
    backend: B,
    track: Option<String>,
    muted: bool,
    playing: bool,
}

impl<B: AudioBackend> AudioSession<B> {
    pub fn new(backend: B, muted: bool) -> Self {
        Self {
            backend,
            track: None,
            muted,
            playing: false,
        }
    }

    /// Swap the loaded track. The previous one is always stopped and released
    /// before anything new is loaded.
    pub fn set_track(&mut self, url: Option<&str>) {
        if let Some(previous) = self.track.take() {
            self.backend.pause();
            self.backend.release();
            self.playing = false;
            debug!("Released track {}", previous);
        }

        let Some(url) = url else {
            return;
        };

        if let Err(e) = self.backend.load(url) {
            warn!("{}", PlaybackError::PlaybackResourceFailure(e));
            return;
        }
        self.backend.set_looping(true);
        self.backend.set_muted(self.muted);
        self.track = Some(url.to_string());
        debug!("Loaded track {}", url);

        if !self.muted {
            self.play();
        }
    }

    pub fn play(&mut self) {
        if self.track.is_none() {
            return;
        }
        match self.backend.play() {
            Ok(()) => self.playing = true,
            Err(e) => {
                self.playing = false;
                warn!("{}", PlaybackError::PlaybackResourceFailure(e));
            }
        }
    }

    pub fn pause(&mut self) {
        if self.track.is_none() {
            return;
        }
        self.backend.pause();
        self.playing = false;
    }

    /// Mute never stops playback. Unmuting a track that was loaded silently
    /// starts it.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if self.track.is_none() {
            return;
        }
        self.backend.set_muted(muted);
        if !muted && !self.playing {
            self.play();
        }
    }

    pub fn teardown(&mut self) {
        self.set_track(None);
    }

    pub fn track(&self) -> Option<&str> {
        self.track.as_deref()
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: AudioBackend> Drop for AudioSession<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Backend with no output device. Logs what a real element would do.
#[derive(Debug, Default)]
pub struct SilentAudioBackend {
    loaded: Option<String>,
    block_autoplay: bool,
}

impl SilentAudioBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every `play()` the way a strict autoplay policy would.
    pub fn with_blocked_autoplay(mut self) -> Self {
        self.block_autoplay = true;
        self
    }
}

impl AudioBackend for SilentAudioBackend {
    fn load(&mut self, url: &str) -> Result<(), AudioError> {
        if url.trim().is_empty() {
            return Err(AudioError::Load {
                url: url.to_string(),
                reason: "empty url".to_string(),
            });
        }
        self.loaded = Some(url.to_string());
        Ok(())
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.block_autoplay {
            return Err(AudioError::Blocked("autoplay disabled".to_string()));
        }
        debug!("Playing {:?}", self.loaded);
        Ok(())
    }

    fn pause(&mut self) {
        debug!("Pausing {:?}", self.loaded);
    }

    fn set_muted(&mut self, muted: bool) {
        debug!("Muted: {}", muted);
    }

    fn set_looping(&mut self, _looping: bool) {}

    fn release(&mut self) {
        self.loaded = None;
    }
}
