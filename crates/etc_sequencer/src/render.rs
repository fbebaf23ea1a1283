// SPDX-License-Identifier: MIT OR Apache-2.0
//! Render surface: everything a presentation layer needs for one frame.

use crate::catalogue::{ComplexInfo, ComplexKey};
use crate::particle::ParticleSnapshot;
use crate::sequencer::{PlaybackState, Sequencer};
use serde::{Deserialize, Serialize};

/// Opacity added to the intermembrane glow per gradient level
pub const GRADIENT_OPACITY_STEP: f32 = 0.3;

/// Label of the play/pause button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayButton {
    /// Start or resume
    Play,
    /// Stop motion
    Pause,
    /// Start over from a finished timeline
    Replay,
}

impl PlayButton {
    /// Button caption
    pub fn label(&self) -> &'static str {
        match self {
            Self::Play => "Play",
            Self::Pause => "Pause",
            Self::Replay => "Replay",
        }
    }
}

/// Open popup content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoPanel {
    /// Which complex is shown
    pub key: ComplexKey,
    /// Its reference text
    pub info: ComplexInfo,
}

/// One frame of the animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderFrame {
    /// Particle positions
    pub snapshot: ParticleSnapshot,
    /// Current step index
    pub step_index: usize,
    /// Number of steps
    pub step_count: usize,
    /// Current step caption
    pub step_name: String,
    /// Current step text
    pub step_description: String,
    /// Current step duration in milliseconds
    pub step_duration_ms: u64,
    /// Whether the timeline is advancing
    pub is_playing: bool,
    /// Playback state
    pub state: PlaybackState,
    /// Whether the ATP synthase rotor spins
    pub rotor_active: bool,
    /// Proton gradient level, 0-3
    pub gradient_level: u8,
    /// Opacity of the intermembrane gradient glow
    pub gradient_opacity: f32,
    /// Timeline progress in `[0, 1]`
    pub progress: f32,
    /// Play/pause button label
    pub play_button: PlayButton,
    /// Popup content, if open
    pub info: Option<InfoPanel>,
}

impl RenderFrame {
    /// Capture the sequencer's current state
    pub fn capture(sequencer: &Sequencer, info: Option<InfoPanel>) -> Self {
        let step = sequencer.current_step();
        let gradient_level = sequencer.gradient_level();
        let play_button = match sequencer.state() {
            PlaybackState::Playing => PlayButton::Pause,
            PlaybackState::Finished => PlayButton::Replay,
            PlaybackState::Idle | PlaybackState::Suspended => PlayButton::Play,
        };

        Self {
            snapshot: sequencer.snapshot().clone(),
            step_index: sequencer.index(),
            step_count: sequencer.timeline().len(),
            step_name: step.name.clone(),
            step_description: step.description.clone(),
            step_duration_ms: step.duration.as_millis() as u64,
            is_playing: sequencer.is_playing(),
            state: sequencer.state(),
            rotor_active: sequencer.rotor_active(),
            gradient_level,
            gradient_opacity: f32::from(gradient_level) * GRADIENT_OPACITY_STEP,
            progress: sequencer.progress(),
            play_button,
            info,
        }
    }

    /// Progress as a whole percentage
    pub fn progress_percent(&self) -> u32 {
        (self.progress * 100.0).round() as u32
    }
}
