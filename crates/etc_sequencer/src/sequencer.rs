// SPDX-License-Identifier: MIT OR Apache-2.0
//! Step sequencer: the playback state machine.
//!
//! The sequencer walks the timeline one step at a time. Entering a step
//! merges its patch into the particle store and arms a single timer for
//! that step's duration; when the timer fires the index advances (wrapping
//! to 0 after the last step) and the cycle repeats.
//!
//! ## Timer discipline
//!
//! The sequencer owns exactly one pending timer slot. Every path that moves
//! the index or toggles playback cancels the pending timer before arming a
//! new one, so the queue never holds more than one live timer.

use crate::particle::{ParticleSnapshot, ParticleStore};
use crate::timeline::{Timeline, TimelineStep};
use crate::timer::{TimerHandle, TimerQueue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default pause between a replay reset and the start of motion
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Sequencer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerConfig {
    /// Delay between `reset(true)` and playback resuming
    pub settle_delay: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Externally visible playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Not started, reset, or waiting for a replay to begin
    #[default]
    Idle,
    /// Advancing through the timeline
    Playing,
    /// Paused by the user or by an interrupt
    Suspended,
    /// Stopped on the last step
    Finished,
}

impl PlaybackState {
    /// Status text for display
    pub fn status_text(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Playing => "Playing",
            Self::Suspended => "Paused",
            Self::Finished => "Finished",
        }
    }
}

/// What a pending timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Leave the current step
    Advance,
    /// Start playing after a replay reset
    Replay,
}

/// Why playback is suspended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suspension {
    /// Explicit `pause()`
    User,
    /// A modal is open. `resume` says whether closing it restarts motion,
    /// `paused` whether the sequencer was user-paused before it opened.
    Interrupt { resume: bool, paused: bool },
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    handle: TimerHandle,
    action: TimerAction,
}

/// The playback state machine
#[derive(Debug)]
pub struct Sequencer {
    timeline: Timeline,
    config: SequencerConfig,
    store: ParticleStore,
    index: usize,
    playing: bool,
    suspension: Option<Suspension>,
    timers: TimerQueue<TimerAction>,
    pending: Option<PendingTimer>,
}

impl Sequencer {
    /// Create a sequencer at step 0 with the initial snapshot
    pub fn new(timeline: Timeline, config: SequencerConfig) -> Self {
        Self {
            timeline,
            config,
            store: ParticleStore::new(),
            index: 0,
            playing: false,
            suspension: None,
            timers: TimerQueue::new(),
            pending: None,
        }
    }

    // --- Control surface ---

    /// Start or resume playback.
    ///
    /// On a finished timeline this replays from the start, see
    /// [`reset`](Self::reset). While a modal is open the request is only
    /// recorded and takes effect when the modal closes.
    pub fn play(&mut self) {
        if self.is_interrupted() {
            if self.is_at_end() {
                self.reset(false);
            }
            self.suspension = Some(Suspension::Interrupt {
                resume: true,
                paused: false,
            });
            tracing::debug!("Play requested while interrupted, deferring");
            return;
        }

        if self.playing {
            return;
        }
        if self.is_at_end() {
            tracing::info!("Replaying timeline from the start");
            self.reset(true);
            return;
        }
        self.resume();
    }

    /// Pause playback, keeping the current step. Idempotent.
    pub fn pause(&mut self) {
        self.cancel_pending();
        if self.playing {
            tracing::info!(step = self.index, "Paused");
        }
        self.playing = false;
        self.suspension = if self.is_interrupted() {
            Some(Suspension::Interrupt {
                resume: false,
                paused: true,
            })
        } else {
            Some(Suspension::User)
        };
    }

    /// Play/pause button behaviour
    pub fn toggle(&mut self) {
        if self.playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Return to step 0 with the initial snapshot.
    ///
    /// With `play_after_reset`, playback starts again after the configured
    /// settle delay rather than immediately.
    pub fn reset(&mut self, play_after_reset: bool) {
        self.cancel_pending();
        self.playing = false;
        self.index = 0;
        self.store.reset();
        tracing::info!(play_after_reset, "Reset timeline");

        if self.is_interrupted() {
            self.suspension = Some(Suspension::Interrupt {
                resume: play_after_reset,
                paused: false,
            });
            return;
        }

        self.suspension = None;
        if play_after_reset {
            self.arm(self.config.settle_delay, TimerAction::Replay);
        }
    }

    /// Suspend playback because a modal opened
    pub fn on_modal_open(&mut self) {
        if self.is_interrupted() {
            return;
        }

        let resume = self.playing || self.pending_action() == Some(TimerAction::Replay);
        let paused = self.suspension == Some(Suspension::User);
        self.cancel_pending();
        self.playing = false;
        self.suspension = Some(Suspension::Interrupt { resume, paused });
        tracing::info!(step = self.index, resume, "Interrupted by modal");
    }

    /// Lift an interrupt suspension
    pub fn on_modal_close(&mut self) {
        let Some(Suspension::Interrupt { resume, paused }) = self.suspension else {
            return;
        };

        tracing::info!(step = self.index, resume, "Modal closed");
        self.suspension = paused.then_some(Suspension::User);
        if resume {
            self.resume();
        }
    }

    // --- Time ---

    /// Fire every timer due at or before `now`
    pub fn advance_to(&mut self, now: Duration) {
        while let Some((handle, action)) = self.timers.pop_due(now) {
            if self.pending.map(|p| p.handle) != Some(handle) {
                tracing::warn!(handle = handle.value(), "Dropped stale timer");
                continue;
            }
            self.pending = None;
            self.fire(action);
        }
        self.timers.set_now(now);
    }

    /// Let `elapsed` pass on the sequencer clock
    pub fn tick(&mut self, elapsed: Duration) {
        self.advance_to(self.timers.now() + elapsed);
    }

    /// Current sequencer time
    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    /// When the pending timer fires, if any
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    // --- Render surface ---

    /// Current step index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Current step
    pub fn current_step(&self) -> &TimelineStep {
        &self.timeline.steps()[self.index]
    }

    /// Current particle snapshot
    pub fn snapshot(&self) -> &ParticleSnapshot {
        self.store.snapshot()
    }

    /// The timeline being played
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Whether the timeline is advancing
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Whether a modal currently holds playback
    pub fn is_interrupted(&self) -> bool {
        matches!(self.suspension, Some(Suspension::Interrupt { .. }))
    }

    /// Externally visible state
    pub fn state(&self) -> PlaybackState {
        if self.playing {
            PlaybackState::Playing
        } else if self.is_at_end() {
            PlaybackState::Finished
        } else if self.suspension.is_some() {
            PlaybackState::Suspended
        } else {
            PlaybackState::Idle
        }
    }

    /// Whether the ATP synthase rotor spins at the current step
    pub fn rotor_active(&self) -> bool {
        self.timeline.milestones().rotor_active(self.index)
    }

    /// Proton gradient level (0-3) at the current step
    pub fn gradient_level(&self) -> u8 {
        self.timeline.milestones().gradient_level(self.index)
    }

    /// Fraction of the timeline completed, `index / (len - 1)`
    pub fn progress(&self) -> f32 {
        let last = self.timeline.last_index();
        if last == 0 {
            return 1.0;
        }
        self.index as f32 / last as f32
    }

    /// Number of live timers; never more than one
    pub fn pending_timers(&self) -> usize {
        self.timers.live_count()
    }

    /// What the pending timer will do, if one is armed
    pub fn pending_action(&self) -> Option<TimerAction> {
        self.pending.map(|p| p.action)
    }

    // --- Internals ---

    fn is_at_end(&self) -> bool {
        self.index == self.timeline.last_index()
    }

    /// Start playing unless already on the last step
    fn resume(&mut self) {
        if self.is_at_end() {
            tracing::debug!("Resume ignored on the last step");
            return;
        }
        self.start();
    }

    fn start(&mut self) {
        self.playing = true;
        self.suspension = None;
        tracing::info!(step = self.index, "Playing");
        self.enter_step();
    }

    /// Apply the current step and arm its exit timer
    fn enter_step(&mut self) {
        let step = &self.timeline.steps()[self.index];
        let duration = step.duration;
        tracing::debug!(step = self.index, name = %step.name, ?duration, "Entered step");

        self.store.apply(&step.patch);
        self.arm(duration, TimerAction::Advance);
    }

    fn fire(&mut self, action: TimerAction) {
        match action {
            TimerAction::Advance => {
                self.index = (self.index + 1) % self.timeline.len();
                self.enter_step();
            }
            TimerAction::Replay => self.start(),
        }
    }

    fn arm(&mut self, delay: Duration, action: TimerAction) {
        self.cancel_pending();
        let handle = self.timers.arm(delay, action);
        self.pending = Some(PendingTimer { handle, action });
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            self.timers.cancel(pending.handle);
        }
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(Timeline::builtin(), SequencerConfig::default())
    }
}
