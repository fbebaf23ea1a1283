// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interrupt gate for the complex info popup.
//!
//! Opening the popup suspends the sequencer; closing it lets the sequencer
//! pick up where it was. The gate holds no timer of its own.

use crate::catalogue::{Catalogue, CatalogueError, ComplexInfo, ComplexKey};
use crate::sequencer::Sequencer;

/// Where a click on the open popup landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The dimmed area around the popup
    Backdrop,
    /// The popup's close button
    CloseButton,
    /// Anywhere inside the popup
    Body,
}

/// Modal popup state
#[derive(Debug, Clone, Default)]
pub struct InterruptGate {
    catalogue: Catalogue,
    open: Option<ComplexKey>,
}

impl InterruptGate {
    /// Create a closed gate over a catalogue
    pub fn new(catalogue: Catalogue) -> Self {
        Self {
            catalogue,
            open: None,
        }
    }

    /// Show a complex and suspend the sequencer.
    ///
    /// Opening while another complex is shown swaps the content.
    pub fn open(
        &mut self,
        key: ComplexKey,
        sequencer: &mut Sequencer,
    ) -> Result<&ComplexInfo, CatalogueError> {
        let info = self.catalogue.get(key)?;
        sequencer.on_modal_open();
        self.open = Some(key);
        tracing::debug!(complex = %key, "Opened info popup");
        Ok(info)
    }

    /// Hide the popup and let the sequencer resume. No-op when closed.
    pub fn close(&mut self, sequencer: &mut Sequencer) {
        if self.open.take().is_some() {
            tracing::debug!("Closed info popup");
            sequencer.on_modal_close();
        }
    }

    /// Handle a click on the popup. Returns true if it dismissed the popup.
    pub fn click(&mut self, target: ClickTarget, sequencer: &mut Sequencer) -> bool {
        if !self.is_open() {
            return false;
        }
        match target {
            ClickTarget::Backdrop | ClickTarget::CloseButton => {
                self.close(sequencer);
                true
            }
            ClickTarget::Body => false,
        }
    }

    /// Whether the popup is showing
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// The complex currently shown
    pub fn open_key(&self) -> Option<ComplexKey> {
        self.open
    }

    /// Content currently shown
    pub fn content(&self) -> Option<&ComplexInfo> {
        self.open.and_then(|key| self.catalogue.get(key).ok())
    }

    /// The catalogue behind the popup
    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::PlaybackState;
    use std::time::Duration;

    #[test]
    fn test_open_suspends_and_close_resumes() {
        let mut sequencer = Sequencer::default();
        let mut gate = InterruptGate::default();
        sequencer.play();

        let info = gate.open(ComplexKey::I, &mut sequencer).unwrap();
        assert_eq!(info.title, "Complex I");
        assert!(gate.is_open());
        assert_eq!(sequencer.state(), PlaybackState::Suspended);

        sequencer.tick(Duration::from_millis(1500));
        assert_eq!(sequencer.index(), 0);

        gate.close(&mut sequencer);
        assert!(!gate.is_open());
        assert_eq!(sequencer.state(), PlaybackState::Playing);
    }

    #[test]
    fn test_click_containment() {
        let mut sequencer = Sequencer::default();
        let mut gate = InterruptGate::default();
        sequencer.play();
        gate.open(ComplexKey::AtpSynthase, &mut sequencer).unwrap();

        assert!(!gate.click(ClickTarget::Body, &mut sequencer));
        assert!(gate.is_open());
        assert!(!sequencer.is_playing());

        assert!(gate.click(ClickTarget::Backdrop, &mut sequencer));
        assert!(!gate.is_open());
        assert!(sequencer.is_playing());
    }

    #[test]
    fn test_swap_content_keeps_single_suspension() {
        let mut sequencer = Sequencer::default();
        let mut gate = InterruptGate::default();
        sequencer.play();

        gate.open(ComplexKey::I, &mut sequencer).unwrap();
        gate.open(ComplexKey::III, &mut sequencer).unwrap();
        assert_eq!(gate.open_key(), Some(ComplexKey::III));
        assert_eq!(gate.content().unwrap().title, "Complex III");

        assert!(gate.click(ClickTarget::CloseButton, &mut sequencer));
        assert!(sequencer.is_playing());
    }

    #[test]
    fn test_close_when_closed_is_noop() {
        let mut sequencer = Sequencer::default();
        let mut gate = InterruptGate::default();
        sequencer.play();
        sequencer.pause();

        gate.close(&mut sequencer);
        assert!(!gate.click(ClickTarget::Backdrop, &mut sequencer));
        assert_eq!(sequencer.state(), PlaybackState::Suspended);
    }
}
