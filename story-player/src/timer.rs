use crate::traits::TickSource;
use crate::types::{validate_timing, Result, RunId};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Stale run or no run active.
    Ignored,
    Advanced(f64),
    /// Progress reached 100 and the driver halted itself.
    Completed,
}

/// Advances a progress value from 0 to 100 by a fixed step per tick.
///
/// Progress is kept as elapsed milliseconds so that repeated steps land
/// exactly on 100 instead of drifting below it.
pub struct TimerDriver<T: TickSource> {
    source: T,
    duration_ms: u64,
    tick_ms: u64,
    elapsed_ms: u64,
    active: Option<RunId>,
    last_run: u64,
}

impl<T: TickSource> TimerDriver<T> {
    pub fn new(source: T) -> Self {
        Self {
            source,
            duration_ms: 0,
            tick_ms: 0,
            elapsed_ms: 0,
            active: None,
            last_run: 0,
        }
    }

    /// Begin a fresh run from 0. Any previous run is stopped first.
    pub fn start(&mut self, duration_ms: u64, tick_ms: u64) -> Result<RunId> {
        validate_timing(duration_ms, tick_ms)?;
        self.stop();
        self.duration_ms = duration_ms;
        self.tick_ms = tick_ms;
        self.elapsed_ms = 0;
        Ok(self.arm())
    }

    /// Continue toward the same total duration from the retained progress.
    pub fn resume(&mut self) -> Option<RunId> {
        if let Some(run) = self.active {
            return Some(run);
        }
        if self.duration_ms == 0 || self.elapsed_ms >= self.duration_ms {
            return None;
        }
        Some(self.arm())
    }

    /// Halt ticking, keep progress.
    pub fn stop(&mut self) {
        if let Some(run) = self.active.take() {
            self.source.disarm();
            debug!("Timer run {} stopped at {}ms", run.0, self.elapsed_ms);
        }
    }

    pub fn reset(&mut self) {
        self.stop();
        self.elapsed_ms = 0;
    }

    pub fn tick(&mut self, run: RunId) -> TickOutcome {
        if self.active != Some(run) {
            return TickOutcome::Ignored;
        }

        self.elapsed_ms = self
            .elapsed_ms
            .saturating_add(self.tick_ms)
            .min(self.duration_ms);

        if self.elapsed_ms >= self.duration_ms {
            self.stop();
            TickOutcome::Completed
        } else {
            TickOutcome::Advanced(self.progress())
        }
    }

    pub fn progress(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        (self.elapsed_ms as f64 * 100.0 / self.duration_ms as f64).min(100.0)
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_run(&self) -> Option<RunId> {
        self.active
    }

    pub fn source(&self) -> &T {
        &self.source
    }

    fn arm(&mut self) -> RunId {
        self.last_run += 1;
        let run = RunId(self.last_run);
        self.source.arm(run, Duration::from_millis(self.tick_ms));
        self.active = Some(run);
        run
    }
}

/// Tick source backed by a tokio interval task that forwards run ids over a channel.
pub struct IntervalTicker {
    sender: mpsc::UnboundedSender<RunId>,
    task: Option<JoinHandle<()>>,
}

impl IntervalTicker {
    pub fn new(sender: mpsc::UnboundedSender<RunId>) -> Self {
        Self { sender, task: None }
    }
}

impl TickSource for IntervalTicker {
    fn arm(&mut self, run: RunId, period: Duration) {
        self.disarm();
        let sender = self.sender.clone();
        self.task = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            // Missed ticks are dropped, like a throttled browser interval.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if sender.send(run).is_err() {
                    break;
                }
            }
        }));
    }

    fn disarm(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.disarm();
    }
}
