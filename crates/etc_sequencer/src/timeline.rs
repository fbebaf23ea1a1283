// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline table: the ordered, timed steps of the animation.

use crate::particle::{
    Position, Positions, StepPatch, INITIAL_INTERMEMBRANE_PROTONS, INITIAL_MATRIX_PROTONS,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Timeline errors
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// A timeline needs at least one step
    #[error("Timeline has no steps")]
    Empty,

    /// Every step must stay visible for some time
    #[error("Step {index} has a zero duration")]
    ZeroDuration {
        /// Offending step
        index: usize,
    },

    /// Step lookup outside the table
    #[error("Step {index} out of range (timeline has {len} steps)")]
    OutOfRange {
        /// Requested step
        index: usize,
        /// Number of steps
        len: usize,
    },

    /// Milestones are unordered or point past the end
    #[error("Invalid milestones: {0}")]
    InvalidMilestones(String),

    /// RON parse error
    #[error("Failed to parse timeline: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// RON serialization error
    #[error("Failed to serialize timeline: {0}")]
    Serialize(#[from] ron::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for timeline operations
pub type Result<T> = std::result::Result<T, TimelineError>;

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// A named, timed phase of the animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineStep {
    /// Short caption
    pub name: String,
    /// Explanatory text
    pub description: String,
    /// How long this step stays on screen before advancing
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    /// Particle changes this step contributes
    #[serde(default)]
    pub patch: StepPatch,
}

impl TimelineStep {
    /// Create a new step
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        duration_ms: u64,
        patch: StepPatch,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            duration: Duration::from_millis(duration_ms),
            patch,
        }
    }
}

/// Step indices at which the derived display values change.
///
/// The proton gradient climbs one level at each of `gradient_rises` and is
/// spent (back to level 0) from `gradient_spent` on. The ATP synthase rotor
/// spins while the step index is inside `rotor`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestones {
    /// Steps raising the gradient to levels 1, 2 and 3
    pub gradient_rises: [usize; 3],
    /// First step after the gradient has been used up
    pub gradient_spent: usize,
    /// Steps with an active rotor
    pub rotor: Range<usize>,
}

impl Milestones {
    /// Highest gradient level
    pub const MAX_GRADIENT_LEVEL: u8 = 3;

    /// Discrete proton gradient level (0-3) at a step
    pub fn gradient_level(&self, index: usize) -> u8 {
        if index >= self.gradient_spent {
            return 0;
        }
        self.gradient_rises
            .iter()
            .filter(|&&rise| index >= rise)
            .count() as u8
    }

    /// Whether the rotor spins at a step
    pub fn rotor_active(&self, index: usize) -> bool {
        self.rotor.contains(&index)
    }

    fn validate(&self, len: usize) -> Result<()> {
        let [first, second, third] = self.gradient_rises;
        if !(first <= second && second <= third && third <= self.gradient_spent) {
            return Err(TimelineError::InvalidMilestones(format!(
                "gradient steps {:?} must be ordered and not after {}",
                self.gradient_rises, self.gradient_spent
            )));
        }
        if self.rotor.start > self.rotor.end || self.rotor.end > len {
            return Err(TimelineError::InvalidMilestones(format!(
                "rotor range {:?} does not fit {} steps",
                self.rotor, len
            )));
        }
        Ok(())
    }
}

impl Default for Milestones {
    fn default() -> Self {
        Self {
            gradient_rises: [2, 4, 8],
            gradient_spent: 12,
            rotor: 12..14,
        }
    }
}

/// Immutable table of steps, indexed `0..len`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimelineData", into = "TimelineData")]
pub struct Timeline {
    steps: Arc<[TimelineStep]>,
    milestones: Milestones,
}

#[derive(Serialize, Deserialize)]
struct TimelineData {
    steps: Vec<TimelineStep>,
    #[serde(default)]
    milestones: Milestones,
}

impl TryFrom<TimelineData> for Timeline {
    type Error = TimelineError;

    fn try_from(data: TimelineData) -> Result<Self> {
        Self::new(data.steps, data.milestones)
    }
}

impl From<Timeline> for TimelineData {
    fn from(timeline: Timeline) -> Self {
        Self {
            steps: timeline.steps.to_vec(),
            milestones: timeline.milestones,
        }
    }
}

impl Timeline {
    /// Build a validated timeline
    pub fn new(steps: Vec<TimelineStep>, milestones: Milestones) -> Result<Self> {
        if steps.is_empty() {
            return Err(TimelineError::Empty);
        }
        if let Some(index) = steps.iter().position(|s| s.duration.is_zero()) {
            return Err(TimelineError::ZeroDuration { index });
        }
        milestones.validate(steps.len())?;

        Ok(Self {
            steps: steps.into(),
            milestones,
        })
    }

    /// Step at `index`
    pub fn get(&self, index: usize) -> Result<&TimelineStep> {
        self.steps.get(index).ok_or(TimelineError::OutOfRange {
            index,
            len: self.steps.len(),
        })
    }

    /// Number of steps (never zero)
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Never true for a validated timeline
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the final step
    pub fn last_index(&self) -> usize {
        self.steps.len() - 1
    }

    /// All steps in order
    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    /// Display milestones
    pub fn milestones(&self) -> &Milestones {
        &self.milestones
    }

    /// Total play time of one pass
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    /// Serialize to RON format
    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Deserialize from RON format
    pub fn from_ron(s: &str) -> Result<Self> {
        Ok(ron::from_str(s)?)
    }

    /// Load a timeline file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let timeline = Self::from_ron(&contents)?;
        tracing::info!("Loaded timeline with {} steps from {:?}", timeline.len(), path);
        Ok(timeline)
    }

    /// The electron transport chain, from NADH arriving at Complex I to ATP
    pub fn builtin() -> Self {
        Self {
            steps: builtin_steps().into(),
            milestones: Milestones::default(),
        }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::builtin()
    }
}

fn electron_pair(first: Position, second: Position) -> Positions {
    Arc::from([first, second])
}

/// Matrix protons with the given initial entries pumped out (opacity 0).
///
/// Pumped protons come first, in pumping order, followed by the remaining
/// initial protons in their original order.
fn matrix_after_pumping(pumped: &[usize]) -> Positions {
    let hidden = pumped
        .iter()
        .map(|&i| INITIAL_MATRIX_PROTONS[i].with_opacity(0.0));
    let remaining = INITIAL_MATRIX_PROTONS
        .iter()
        .enumerate()
        .filter(|(i, _)| !pumped.contains(i))
        .map(|(_, p)| *p);
    hidden.chain(remaining).collect()
}

/// Initial intermembrane protons followed by `extra`
fn intermembrane_with(extra: &[Position]) -> Positions {
    INITIAL_INTERMEMBRANE_PROTONS
        .iter()
        .chain(extra)
        .copied()
        .collect()
}

const PUMPED_BY_COMPLEX_I: Position = Position::new(25.0, 15.0, 1.0);
const PUMPED_BY_COMPLEX_III: Position = Position::new(22.0, 39.0, 1.0);
const PUMPED_BY_COMPLEX_IV: Position = Position::new(25.0, 53.0, 1.0);

fn builtin_steps() -> Vec<TimelineStep> {
    let pumped = [PUMPED_BY_COMPLEX_I, PUMPED_BY_COMPLEX_III, PUMPED_BY_COMPLEX_IV];

    vec![
        TimelineStep::new(
            "START",
            "NADH, an electron carrier, approaches Complex I to start the process.",
            1000,
            StepPatch::empty().with_electrons(electron_pair(
                Position::new(80.0, 10.0, 1.0),
                Position::new(80.0, 12.0, 1.0),
            )),
        ),
        TimelineStep::new(
            "NADH TO COMPLEX I",
            "NADH donates two high-energy electrons to Complex I.",
            1500,
            StepPatch::empty().with_electrons(electron_pair(
                Position::new(48.0, 14.0, 1.0),
                Position::new(52.0, 14.0, 1.0),
            )),
        ),
        TimelineStep::new(
            "PROTON PUMPING AT COMPLEX I",
            "The electrons' energy pumps a proton (H+) from the matrix into the intermembrane space.",
            1500,
            StepPatch::empty()
                .with_electrons(electron_pair(
                    Position::new(48.0, 21.0, 1.0),
                    Position::new(52.0, 21.0, 1.0),
                ))
                .with_matrix_protons(matrix_after_pumping(&[0]))
                .with_intermembrane_protons(intermembrane_with(&pumped[..1])),
        ),
        TimelineStep::new(
            "Q TO COMPLEX III",
            "Coenzyme Q (ubiquinone), the mobile carrier, takes the electrons to Complex III.",
            1500,
            StepPatch::empty().with_electrons(electron_pair(
                Position::new(48.0, 35.0, 1.0),
                Position::new(52.0, 35.0, 1.0),
            )),
        ),
        TimelineStep::new(
            "PROTON PUMPING AT COMPLEX III",
            "The electrons passing through Complex III pump another proton across the membrane.",
            1500,
            StepPatch::empty()
                .with_matrix_protons(matrix_after_pumping(&[0, 3]))
                .with_intermembrane_protons(intermembrane_with(&pumped[..2])),
        ),
        TimelineStep::new(
            "ELECTRONS TO CYTOCHROME C",
            "The electrons are handed to cytochrome c, another mobile carrier.",
            1500,
            StepPatch::empty().with_electrons(electron_pair(
                Position::new(33.0, 46.0, 1.0),
                Position::new(33.0, 46.0, 1.0),
            )),
        ),
        TimelineStep::new(
            "CYTOCHROME C TO COMPLEX IV",
            "Cytochrome c carries the electrons to Complex IV, the last stage of the chain.",
            1500,
            StepPatch::empty().with_electrons(electron_pair(
                Position::new(45.0, 52.0, 1.0),
                Position::new(45.0, 52.0, 1.0),
            )),
        ),
        TimelineStep::new(
            "ELECTRONS IN COMPLEX IV",
            "The electrons travel through Complex IV.",
            1000,
            StepPatch::empty(),
        ),
        TimelineStep::new(
            "PROTON PUMPING AT COMPLEX IV",
            "Complex IV pumps the final proton, steepening the gradient further.",
            1500,
            StepPatch::empty()
                .with_matrix_protons(matrix_after_pumping(&[0, 3, 6]))
                .with_intermembrane_protons(intermembrane_with(&pumped)),
        ),
        TimelineStep::new(
            "WATER FORMATION",
            "Oxygen, the final electron acceptor, takes the electrons and H+ ions to form water.",
            1500,
            StepPatch::empty().with_electrons(electron_pair(
                Position::new(70.0, 53.0, 0.0),
                Position::new(70.0, 53.0, 0.0),
            )),
        ),
        TimelineStep::new(
            "PROTON GRADIENT ESTABLISHED",
            "A strong proton gradient (potential energy) now exists across the membrane.",
            1000,
            StepPatch::empty().with_intermembrane_protons(intermembrane_with(&[
                PUMPED_BY_COMPLEX_I,
                PUMPED_BY_COMPLEX_III,
                PUMPED_BY_COMPLEX_IV,
                Position::new(18.0, 80.0, 1.0),
                Position::new(20.0, 75.0, 1.0),
            ])),
        ),
        TimelineStep::new(
            "PROTONS ENTER ATP SYNTHASE",
            "The gradient drives protons into the ATP synthase channel.",
            1500,
            StepPatch::empty().with_intermembrane_protons(intermembrane_with(&[
                PUMPED_BY_COMPLEX_I,
                PUMPED_BY_COMPLEX_III,
                PUMPED_BY_COMPLEX_IV,
                Position::new(35.0, 86.0, 1.0),
                Position::new(32.0, 88.0, 1.0),
            ])),
        ),
        TimelineStep::new(
            "PROTON FLOW DRIVES ATP SYNTHESIS",
            "The proton flow turns ATP synthase like a turbine, releasing energy.",
            2000,
            StepPatch::empty().with_intermembrane_protons(intermembrane_with(&[
                PUMPED_BY_COMPLEX_I,
                PUMPED_BY_COMPLEX_III,
                PUMPED_BY_COMPLEX_IV,
                Position::new(75.0, 86.0, 1.0),
                Position::new(78.0, 88.0, 1.0),
            ])),
        ),
        TimelineStep::new(
            "ATP IS PRODUCED",
            "The rotation's energy joins ADP and Pi into ATP, the cell's main energy currency.",
            1500,
            StepPatch::empty()
                .with_atp(Position::new(85.0, 88.0, 1.0))
                .with_intermembrane_protons(intermembrane_with(&[
                    PUMPED_BY_COMPLEX_I,
                    PUMPED_BY_COMPLEX_III,
                    PUMPED_BY_COMPLEX_IV,
                    Position::new(75.0, 86.0, 0.0),
                    Position::new(78.0, 88.0, 0.0),
                ]))
                .with_matrix_protons(
                    INITIAL_MATRIX_PROTONS
                        .iter()
                        .copied()
                        .chain([Position::new(80.0, 86.0, 1.0), Position::new(82.0, 88.0, 1.0)])
                        .collect::<Positions>(),
                ),
        ),
        TimelineStep::new(
            "END",
            "The cycle is complete! The energy of NADH has been used to make ATP.",
            2000,
            StepPatch::empty().with_atp(Position::new(90.0, 88.0, 0.0)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::ParticleSnapshot;

    #[test]
    fn test_builtin_table() {
        let timeline = Timeline::builtin();
        assert_eq!(timeline.len(), 15);
        assert_eq!(timeline.last_index(), 14);
        assert!(timeline.steps().iter().all(|s| s.duration > Duration::ZERO));
        assert_eq!(timeline.get(0).unwrap().duration, Duration::from_millis(1000));
        assert_eq!(timeline.get(12).unwrap().duration, Duration::from_millis(2000));
        assert_eq!(timeline.total_duration(), Duration::from_millis(22_000));
    }

    #[test]
    fn test_out_of_range() {
        let timeline = Timeline::builtin();
        assert!(matches!(
            timeline.get(15),
            Err(TimelineError::OutOfRange { index: 15, len: 15 })
        ));
    }

    #[test]
    fn test_sequential_merge_matches_step_data() {
        let timeline = Timeline::builtin();
        let mut snapshots = Vec::new();
        let mut current = ParticleSnapshot::initial();
        for step in timeline.steps() {
            current = current.merge(&step.patch);
            snapshots.push(current.clone());
        }

        // Step 1: electrons reach Complex I
        assert_eq!(
            &snapshots[1].electrons[..],
            &[Position::new(48.0, 14.0, 1.0), Position::new(52.0, 14.0, 1.0)]
        );

        // Step 2: one proton pumped out of the matrix
        let after_pump = &snapshots[2];
        let hidden = after_pump
            .matrix_protons
            .iter()
            .filter(|p| p.opacity == 0.0)
            .count();
        assert_eq!(hidden, 1);
        assert_eq!(after_pump.intermembrane_protons.len(), 5);
        assert_eq!(
            after_pump.intermembrane_protons[4],
            Position::new(25.0, 15.0, 1.0)
        );
        assert_eq!(after_pump.intermembrane_protons[4].top.to_string(), "25%");

        // Step 3 keeps the protons from step 2
        assert!(Arc::ptr_eq(
            &snapshots[3].matrix_protons,
            &snapshots[2].matrix_protons
        ));

        // Step 8: three protons pumped
        assert_eq!(snapshots[8].visible_matrix_protons(), 7);
        assert_eq!(snapshots[8].intermembrane_protons.len(), 7);
        assert_eq!(snapshots[8].matrix_protons[2], INITIAL_MATRIX_PROTONS[6].with_opacity(0.0));

        // Step 9: electrons consumed forming water
        assert!(snapshots[9].electrons.iter().all(|e| !e.is_visible()));

        // Step 13: ATP visible, protons back in the matrix
        assert!(snapshots[13].atp.is_visible());
        assert_eq!(snapshots[13].matrix_protons.len(), 12);
        assert_eq!(snapshots[13].visible_matrix_protons(), 12);

        // Step 14: ATP released
        assert!(!snapshots[14].atp.is_visible());
        assert_eq!(snapshots[14].atp, Position::new(90.0, 88.0, 0.0));
    }

    #[test]
    fn test_gradient_levels() {
        let milestones = Milestones::default();
        let levels: Vec<u8> = (0..15).map(|i| milestones.gradient_level(i)).collect();
        assert_eq!(levels, vec![0, 0, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 0, 0, 0]);

        for window in levels[..12].windows(2) {
            assert!(window[0] <= window[1]);
        }
    }

    #[test]
    fn test_rotor_window() {
        let milestones = Milestones::default();
        let active: Vec<usize> = (0..15).filter(|&i| milestones.rotor_active(i)).collect();
        assert_eq!(active, vec![12, 13]);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            Timeline::new(Vec::new(), Milestones::default()),
            Err(TimelineError::Empty)
        ));

        let steps = vec![
            TimelineStep::new("A", "", 100, StepPatch::empty()),
            TimelineStep::new("B", "", 0, StepPatch::empty()),
        ];
        assert!(matches!(
            Timeline::new(steps, Milestones::default()),
            Err(TimelineError::ZeroDuration { index: 1 })
        ));

        let steps = vec![TimelineStep::new("A", "", 100, StepPatch::empty())];
        assert!(matches!(
            Timeline::new(steps, Milestones::default()),
            Err(TimelineError::InvalidMilestones(_))
        ));
    }

    #[test]
    fn test_serialization() {
        let timeline = Timeline::builtin();
        let ron_str = timeline.to_ron().unwrap();
        assert!(ron_str.contains("duration_ms: 1500"));

        let loaded = Timeline::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, timeline);
    }

    #[test]
    fn test_parse_rejects_zero_duration() {
        let source = r#"(
            steps: [
                (name: "Only", description: "", duration_ms: 0),
            ],
            milestones: (gradient_rises: (0, 0, 0), gradient_spent: 1, rotor: (start: 0, end: 0)),
        )"#;
        assert!(Timeline::from_ron(source).is_err());
    }

    #[test]
    fn test_parse_minimal_timeline() {
        let source = r#"(
            steps: [
                (name: "Only", description: "single step", duration_ms: 250),
            ],
            milestones: (gradient_rises: (0, 0, 1), gradient_spent: 1, rotor: (start: 0, end: 1)),
        )"#;
        let timeline = Timeline::from_ron(source).unwrap();
        assert_eq!(timeline.len(), 1);
        assert!(timeline.get(0).unwrap().patch.is_empty());
        assert_eq!(timeline.milestones().gradient_level(0), 2);
    }
}
