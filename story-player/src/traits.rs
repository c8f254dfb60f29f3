use crate::types::{AudioError, RunId};
use std::time::Duration;

/// Source of periodic ticks for the progress timer.
///
/// Arming a source replaces whatever it was doing before; at most one run is
/// armed at a time.
pub trait TickSource: Send {
    /// Start delivering `run` every `period` until disarmed.
    fn arm(&mut self, run: RunId, period: Duration);

    fn disarm(&mut self);
}

/// A single audio element. The session loads one track at a time into it.
pub trait AudioBackend: Send {
    fn load(&mut self, url: &str) -> Result<(), AudioError>;

    /// May be rejected by the platform (autoplay policy and the like).
    fn play(&mut self) -> Result<(), AudioError>;

    fn pause(&mut self);

    fn set_muted(&mut self, muted: bool);

    fn set_looping(&mut self, looping: bool);

    /// Drop the loaded track and rewind the element.
    fn release(&mut self);
}

impl<B: AudioBackend + ?Sized> AudioBackend for Box<B> {
    fn load(&mut self, url: &str) -> Result<(), AudioError> {
        (**self).load(url)
    }

    fn play(&mut self) -> Result<(), AudioError> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn set_muted(&mut self, muted: bool) {
        (**self).set_muted(muted)
    }

    fn set_looping(&mut self, looping: bool) {
        (**self).set_looping(looping)
    }

    fn release(&mut self) {
        (**self).release()
    }
}
