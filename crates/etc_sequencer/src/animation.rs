// SPDX-License-Identifier: MIT OR Apache-2.0
//! The interactive animation: sequencer plus info popup.
//!
//! This is the control surface a presentation layer talks to. It forwards
//! play/pause/reset to the [`Sequencer`], routes complex clicks through the
//! [`InterruptGate`] and produces [`RenderFrame`]s.

use crate::catalogue::{Catalogue, CatalogueError, ComplexInfo, ComplexKey};
use crate::gate::{ClickTarget, InterruptGate};
use crate::render::{InfoPanel, RenderFrame};
use crate::sequencer::{Sequencer, SequencerConfig};
use crate::timeline::Timeline;
use std::time::Duration;

/// Sequencer and popup driven together
#[derive(Debug, Default)]
pub struct Animation {
    sequencer: Sequencer,
    gate: InterruptGate,
}

impl Animation {
    /// Create an animation over a timeline and catalogue
    pub fn new(timeline: Timeline, catalogue: Catalogue, config: SequencerConfig) -> Self {
        Self {
            sequencer: Sequencer::new(timeline, config),
            gate: InterruptGate::new(catalogue),
        }
    }

    /// Play, or replay a finished timeline
    pub fn play(&mut self) {
        self.sequencer.play();
    }

    /// Pause on the current step
    pub fn pause(&mut self) {
        self.sequencer.pause();
    }

    /// Play/pause button
    pub fn toggle(&mut self) {
        self.sequencer.toggle();
    }

    /// Back to step 0, optionally playing again after the settle delay
    pub fn reset(&mut self, play_after_reset: bool) {
        self.sequencer.reset(play_after_reset);
    }

    /// A complex was clicked: suspend and show its description
    pub fn on_complex_selected(&mut self, key: ComplexKey) -> Result<&ComplexInfo, CatalogueError> {
        self.gate.open(key, &mut self.sequencer)
    }

    /// The popup was dismissed
    pub fn on_info_dismissed(&mut self) {
        self.gate.close(&mut self.sequencer);
    }

    /// A click landed on the open popup
    pub fn on_info_clicked(&mut self, target: ClickTarget) -> bool {
        self.gate.click(target, &mut self.sequencer)
    }

    /// Fire due timers up to `now`
    pub fn advance_to(&mut self, now: Duration) {
        self.sequencer.advance_to(now);
    }

    /// Let `elapsed` pass
    pub fn tick(&mut self, elapsed: Duration) {
        self.sequencer.tick(elapsed);
    }

    /// Next moment something changes on its own
    pub fn next_deadline(&self) -> Option<Duration> {
        self.sequencer.next_deadline()
    }

    /// The playback state machine
    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// The popup state
    pub fn gate(&self) -> &InterruptGate {
        &self.gate
    }

    /// Capture the current frame
    pub fn frame(&self) -> RenderFrame {
        let info = self.gate.open_key().zip(self.gate.content()).map(|(key, info)| InfoPanel {
            key,
            info: info.clone(),
        });
        RenderFrame::capture(&self.sequencer, info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::Position;
    use crate::sequencer::PlaybackState;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_first_step_scenario() {
        let mut animation = Animation::default();
        animation.play();
        animation.tick(ms(1000));

        let frame = animation.frame();
        assert_eq!(frame.step_index, 1);
        assert_eq!(
            &frame.snapshot.electrons[..],
            &[Position::new(48.0, 14.0, 1.0), Position::new(52.0, 14.0, 1.0)]
        );
        assert_eq!(frame.snapshot.electrons[0].top.to_string(), "48%");
        assert_eq!(frame.snapshot.electrons[0].left.to_string(), "14%");
    }

    #[test]
    fn test_select_complex_right_after_play() {
        let mut animation = Animation::default();
        animation.play();
        animation.on_complex_selected(ComplexKey::I).unwrap();

        assert_eq!(animation.sequencer().state(), PlaybackState::Suspended);
        animation.tick(ms(1000));
        animation.tick(ms(5000));
        assert_eq!(animation.sequencer().index(), 0);
        assert_eq!(animation.sequencer().pending_timers(), 0);

        let frame = animation.frame();
        let panel = frame.info.expect("popup content");
        assert_eq!(panel.key, ComplexKey::I);
        assert_eq!(panel.info.subtitle, "NADH Dehydrogenase");
    }

    #[test]
    fn test_dismiss_resumes_from_same_step() {
        let mut animation = Animation::default();
        animation.play();
        animation.tick(ms(2600));
        animation.on_complex_selected(ComplexKey::III).unwrap();
        animation.tick(ms(10_000));

        assert!(!animation.on_info_clicked(ClickTarget::Body));
        animation.on_info_dismissed();
        assert!(animation.frame().info.is_none());
        assert_eq!(animation.sequencer().index(), 2);
        assert!(animation.sequencer().is_playing());
    }

    #[test]
    fn test_reset_with_replay() {
        let mut animation = Animation::default();
        animation.play();
        animation.tick(ms(8000));
        animation.reset(true);

        let frame = animation.frame();
        assert_eq!(frame.step_index, 0);
        assert!(!frame.is_playing);
        assert_eq!(animation.next_deadline(), Some(ms(8100)));

        animation.advance_to(ms(8100));
        assert!(animation.frame().is_playing);
    }
}
