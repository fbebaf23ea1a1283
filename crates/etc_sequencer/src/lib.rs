// SPDX-License-Identifier: MIT OR Apache-2.0
//! Step sequencer for the electron transport chain animation.
//!
//! This crate drives a scripted animation of mitochondrial respiration:
//! - Timeline table of named, timed steps
//! - Particle snapshots updated by per-step patches
//! - Playback state machine with pause, reset and replay
//! - Info popup that suspends playback while open
//!
//! ## Architecture
//!
//! The sequencer is built on:
//! - A virtual-clock timer queue with a single pending slot
//! - Whole-sequence replacement of particle groups
//! - Display values derived from the step index
//!
//! Nothing here reads the wall clock. A driver feeds time in through
//! [`Animation::advance_to`] and reads frames back with [`Animation::frame`].

pub mod animation;
pub mod catalogue;
pub mod gate;
pub mod particle;
pub mod render;
pub mod sequencer;
pub mod timeline;
pub mod timer;

pub use animation::Animation;
pub use catalogue::{Catalogue, CatalogueError, ComplexInfo, ComplexKey, Reaction};
pub use gate::{ClickTarget, InterruptGate};
pub use particle::{ParticleSnapshot, ParticleStore, Percent, Position, Positions, StepPatch};
pub use render::{InfoPanel, PlayButton, RenderFrame};
pub use sequencer::{
    PlaybackState, Sequencer, SequencerConfig, TimerAction, DEFAULT_SETTLE_DELAY,
};
pub use timeline::{Milestones, Timeline, TimelineError, TimelineStep};
pub use timer::{TimerHandle, TimerQueue};
