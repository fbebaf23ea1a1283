// SPDX-License-Identifier: MIT OR Apache-2.0
//! Particle positions, snapshots and step patches.
//!
//! A snapshot holds every visual entity of the stage: the two electrons,
//! the protons on either side of the inner membrane and the ATP molecule.
//! Sequences are shared as `Arc<[Position]>` and only ever replaced as a
//! whole, so a renderer can compare sequences with [`Arc::ptr_eq`] to find
//! out which groups changed since the last frame.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Distance along one stage axis, in percent of the stage size
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(pub f32);

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Placement and visibility of a single entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Distance from the top edge
    pub top: Percent,
    /// Distance from the left edge
    pub left: Percent,
    /// Opacity in `[0, 1]`
    pub opacity: f32,
}

impl Position {
    /// Create a position from raw percentages
    pub const fn new(top: f32, left: f32, opacity: f32) -> Self {
        Self {
            top: Percent(top),
            left: Percent(left),
            opacity,
        }
    }

    /// Same placement with a different opacity
    pub const fn with_opacity(self, opacity: f32) -> Self {
        Self { opacity, ..self }
    }

    /// Whether the entity is drawn at all
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }
}

/// Ordered group of positions, replaced atomically
pub type Positions = Arc<[Position]>;

const INITIAL_ELECTRONS: [Position; 2] = [
    Position::new(80.0, 10.0, 0.0),
    Position::new(80.0, 12.0, 0.0),
];

/// Matrix side before respiration begins: fully populated
pub const INITIAL_MATRIX_PROTONS: [Position; 10] = [
    Position::new(70.0, 13.0, 1.0),
    Position::new(80.0, 18.0, 1.0),
    Position::new(68.0, 25.0, 1.0),
    Position::new(75.0, 32.0, 1.0),
    Position::new(82.0, 38.0, 1.0),
    Position::new(65.0, 45.0, 1.0),
    Position::new(78.0, 51.0, 1.0),
    Position::new(85.0, 58.0, 1.0),
    Position::new(70.0, 65.0, 1.0),
    Position::new(80.0, 72.0, 1.0),
];

/// Intermembrane side before respiration begins: lightly populated
pub const INITIAL_INTERMEMBRANE_PROTONS: [Position; 4] = [
    Position::new(15.0, 20.0, 0.8),
    Position::new(10.0, 40.0, 0.8),
    Position::new(20.0, 60.0, 0.8),
    Position::new(12.0, 75.0, 0.8),
];

const INITIAL_ATP: Position = Position::new(95.0, 88.0, 0.0);

/// Complete visual state at one instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleSnapshot {
    /// Electrons travelling along the chain
    pub electrons: Positions,
    /// Protons in the mitochondrial matrix
    pub matrix_protons: Positions,
    /// Protons in the intermembrane space
    pub intermembrane_protons: Positions,
    /// The ATP molecule produced at the end of the cycle
    pub atp: Position,
}

impl ParticleSnapshot {
    /// Canonical state before respiration begins.
    ///
    /// Electrons and ATP are invisible, the matrix holds the full proton
    /// population and the intermembrane space only a few protons.
    pub fn initial() -> Self {
        Self {
            electrons: Arc::from(INITIAL_ELECTRONS),
            matrix_protons: Arc::from(INITIAL_MATRIX_PROTONS),
            intermembrane_protons: Arc::from(INITIAL_INTERMEMBRANE_PROTONS),
            atp: INITIAL_ATP,
        }
    }

    /// Apply a patch, replacing every field the patch defines
    pub fn merge(&self, patch: &StepPatch) -> Self {
        Self {
            electrons: patch
                .electrons
                .clone()
                .unwrap_or_else(|| self.electrons.clone()),
            matrix_protons: patch
                .matrix_protons
                .clone()
                .unwrap_or_else(|| self.matrix_protons.clone()),
            intermembrane_protons: patch
                .intermembrane_protons
                .clone()
                .unwrap_or_else(|| self.intermembrane_protons.clone()),
            atp: patch.atp.unwrap_or(self.atp),
        }
    }

    /// Number of visible protons on the intermembrane side
    pub fn visible_intermembrane_protons(&self) -> usize {
        self.intermembrane_protons.iter().filter(|p| p.is_visible()).count()
    }

    /// Number of visible protons on the matrix side
    pub fn visible_matrix_protons(&self) -> usize {
        self.matrix_protons.iter().filter(|p| p.is_visible()).count()
    }
}

impl Default for ParticleSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

/// Partial snapshot contributed by one timeline step.
///
/// Absent fields leave the current value unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StepPatch {
    /// Replacement electron sequence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electrons: Option<Positions>,
    /// Replacement matrix proton sequence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix_protons: Option<Positions>,
    /// Replacement intermembrane proton sequence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermembrane_protons: Option<Positions>,
    /// Replacement ATP position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atp: Option<Position>,
}

impl StepPatch {
    /// Patch that changes nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replace the electrons
    pub fn with_electrons(mut self, electrons: impl Into<Positions>) -> Self {
        self.electrons = Some(electrons.into());
        self
    }

    /// Replace the matrix protons
    pub fn with_matrix_protons(mut self, protons: impl Into<Positions>) -> Self {
        self.matrix_protons = Some(protons.into());
        self
    }

    /// Replace the intermembrane protons
    pub fn with_intermembrane_protons(mut self, protons: impl Into<Positions>) -> Self {
        self.intermembrane_protons = Some(protons.into());
        self
    }

    /// Replace the ATP position
    pub fn with_atp(mut self, atp: Position) -> Self {
        self.atp = Some(atp);
        self
    }

    /// Whether the patch defines no field at all
    pub fn is_empty(&self) -> bool {
        self.electrons.is_none()
            && self.matrix_protons.is_none()
            && self.intermembrane_protons.is_none()
            && self.atp.is_none()
    }
}

/// Current particle state, owned by the sequencer
#[derive(Debug, Clone, Default)]
pub struct ParticleStore {
    current: ParticleSnapshot,
}

impl ParticleStore {
    /// Create a store holding the initial snapshot
    pub fn new() -> Self {
        Self {
            current: ParticleSnapshot::initial(),
        }
    }

    /// The current snapshot
    pub fn snapshot(&self) -> &ParticleSnapshot {
        &self.current
    }

    /// Merge a step patch into the current snapshot
    pub fn apply(&mut self, patch: &StepPatch) {
        self.current = self.current.merge(patch);
    }

    /// Restore the initial snapshot
    pub fn reset(&mut self) {
        self.current = ParticleSnapshot::initial();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_snapshot() {
        let snapshot = ParticleSnapshot::initial();
        assert!(snapshot.electrons.iter().all(|e| !e.is_visible()));
        assert!(!snapshot.atp.is_visible());
        assert_eq!(snapshot.visible_matrix_protons(), 10);
        assert_eq!(snapshot.visible_intermembrane_protons(), 4);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let snapshot = ParticleSnapshot::initial();
        let merged = snapshot.merge(&StepPatch::empty());
        assert_eq!(merged, snapshot);
        assert!(Arc::ptr_eq(&merged.electrons, &snapshot.electrons));
        assert!(Arc::ptr_eq(&merged.matrix_protons, &snapshot.matrix_protons));
    }

    #[test]
    fn test_patch_replaces_whole_sequence() {
        let snapshot = ParticleSnapshot::initial();
        let patch = StepPatch::empty().with_matrix_protons(vec![Position::new(1.0, 2.0, 1.0)]);
        let merged = snapshot.merge(&patch);

        assert_eq!(merged.matrix_protons.len(), 1);
        assert_eq!(merged.matrix_protons[0], Position::new(1.0, 2.0, 1.0));
        assert!(!Arc::ptr_eq(&merged.matrix_protons, &snapshot.matrix_protons));
        assert!(Arc::ptr_eq(
            &merged.intermembrane_protons,
            &snapshot.intermembrane_protons
        ));
        assert_eq!(merged.atp, snapshot.atp);
    }

    #[test]
    fn test_store_apply_and_reset() {
        let mut store = ParticleStore::new();
        store.apply(&StepPatch::empty().with_atp(Position::new(85.0, 88.0, 1.0)));
        assert!(store.snapshot().atp.is_visible());

        store.reset();
        assert_eq!(store.snapshot(), &ParticleSnapshot::initial());
    }

    #[test]
    fn test_percent_display() {
        assert_eq!(Percent(25.0).to_string(), "25%");
        assert_eq!(Percent(12.5).to_string(), "12.5%");
    }
}
