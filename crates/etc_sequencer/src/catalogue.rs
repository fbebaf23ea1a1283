// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reference text for the respiratory complexes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Catalogue errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    /// Text that names no complex
    #[error("Unknown complex key: {0}")]
    UnknownKey(String),

    /// A loaded catalogue lacks one of the five complexes
    #[error("Catalogue has no entry for {0}")]
    MissingEntry(ComplexKey),

    /// RON parse error
    #[error("Failed to parse catalogue: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One of the clickable complexes on the inner membrane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplexKey {
    /// NADH dehydrogenase
    #[serde(rename = "I")]
    I,
    /// Succinate dehydrogenase
    #[serde(rename = "II")]
    II,
    /// Cytochrome bc1 complex
    #[serde(rename = "III")]
    III,
    /// Cytochrome c oxidase
    #[serde(rename = "IV")]
    IV,
    /// ATP synthase
    #[serde(rename = "ATP_SYNTHASE")]
    AtpSynthase,
}

impl ComplexKey {
    /// All keys in membrane order
    pub fn all() -> &'static [ComplexKey] {
        &[
            ComplexKey::I,
            ComplexKey::II,
            ComplexKey::III,
            ComplexKey::IV,
            ComplexKey::AtpSynthase,
        ]
    }

    /// Canonical text form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::I => "I",
            Self::II => "II",
            Self::III => "III",
            Self::IV => "IV",
            Self::AtpSynthase => "ATP_SYNTHASE",
        }
    }
}

impl fmt::Display for ComplexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplexKey {
    type Err = CatalogueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "I" | "1" => Ok(Self::I),
            "II" | "2" => Ok(Self::II),
            "III" | "3" => Ok(Self::III),
            "IV" | "4" => Ok(Self::IV),
            "ATP_SYNTHASE" | "ATP" => Ok(Self::AtpSynthase),
            _ => Err(CatalogueError::UnknownKey(s.to_string())),
        }
    }
}

/// A labelled chemical equation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// What the reaction is
    pub label: String,
    /// The equation itself
    pub equation: String,
}

/// Popup content for one complex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexInfo {
    /// Heading
    pub title: String,
    /// Enzyme name
    pub subtitle: String,
    /// Body text
    pub description: String,
    /// Reactions in display order
    pub reactions: Vec<Reaction>,
}

impl ComplexInfo {
    fn new(title: &str, subtitle: &str, description: &str, reactions: &[(&str, &str)]) -> Self {
        Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            description: description.to_string(),
            reactions: reactions
                .iter()
                .map(|(label, equation)| Reaction {
                    label: label.to_string(),
                    equation: equation.to_string(),
                })
                .collect(),
        }
    }
}

/// Read-only mapping from complex to popup content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "IndexMap<ComplexKey, ComplexInfo>", into = "IndexMap<ComplexKey, ComplexInfo>")]
pub struct Catalogue {
    entries: IndexMap<ComplexKey, ComplexInfo>,
}

impl TryFrom<IndexMap<ComplexKey, ComplexInfo>> for Catalogue {
    type Error = CatalogueError;

    fn try_from(entries: IndexMap<ComplexKey, ComplexInfo>) -> Result<Self, Self::Error> {
        if let Some(missing) = ComplexKey::all().iter().find(|k| !entries.contains_key(*k)) {
            return Err(CatalogueError::MissingEntry(*missing));
        }
        Ok(Self { entries })
    }
}

impl From<Catalogue> for IndexMap<ComplexKey, ComplexInfo> {
    fn from(catalogue: Catalogue) -> Self {
        catalogue.entries
    }
}

impl Catalogue {
    /// Look up a complex
    pub fn get(&self, key: ComplexKey) -> Result<&ComplexInfo, CatalogueError> {
        self.entries
            .get(&key)
            .ok_or(CatalogueError::MissingEntry(key))
    }

    /// Entries in display order
    pub fn iter(&self) -> impl Iterator<Item = (ComplexKey, &ComplexInfo)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Deserialize from RON format
    pub fn from_ron(s: &str) -> Result<Self, CatalogueError> {
        Ok(ron::from_str(s)?)
    }

    /// Load a catalogue file
    pub fn load(path: &Path) -> Result<Self, CatalogueError> {
        let contents = std::fs::read_to_string(path)?;
        let catalogue = Self::from_ron(&contents)?;
        tracing::info!("Loaded catalogue from {:?}", path);
        Ok(catalogue)
    }

    /// Built-in descriptions of the five complexes
    pub fn builtin() -> Self {
        let mut entries = IndexMap::new();
        entries.insert(
            ComplexKey::I,
            ComplexInfo::new(
                "Complex I",
                "NADH Dehydrogenase",
                "Accepts high-energy electrons from NADH. The energy released while the electrons \
                 are passed on pumps protons (H+) from the mitochondrial matrix into the \
                 intermembrane space.",
                &[
                    ("NADH oxidation", "NADH + H⁺ → NAD⁺ + 2e⁻"),
                    ("Proton pumping", "4H⁺ (matrix) → 4H⁺ (intermembrane space)"),
                ],
            ),
        );
        entries.insert(
            ComplexKey::II,
            ComplexInfo::new(
                "Complex II",
                "Succinate Dehydrogenase",
                "Accepts electrons from FADH₂, another electron carrier. Unlike the other \
                 complexes it does not pump protons across the membrane; it is an alternative \
                 entry point for electrons into the chain.",
                &[("FADH₂ oxidation", "FADH₂ → FAD + 2H⁺ + 2e⁻")],
            ),
        );
        entries.insert(
            ComplexKey::III,
            ComplexInfo::new(
                "Complex III",
                "Cytochrome bc₁ Complex",
                "Receives electrons from coenzyme Q (ubiquinone) and hands them to cytochrome c. \
                 This also pumps protons across the membrane, adding to the proton gradient.",
                &[
                    (
                        "Electron transfer",
                        "Q(2H) + 2 Cyt c (ox) → Q + 2 Cyt c (red) + 2H⁺",
                    ),
                    ("Proton pumping", "4H⁺ (matrix) → 4H⁺ (intermembrane space)"),
                ],
            ),
        );
        entries.insert(
            ComplexKey::IV,
            ComplexInfo::new(
                "Complex IV",
                "Cytochrome c Oxidase",
                "The last stage of the electron transport chain. Complex IV passes the electrons \
                 to oxygen (O₂), the final electron acceptor, which combines with protons to form \
                 water. This also pumps protons.",
                &[
                    ("Oxygen reduction", "4e⁻ + 4H⁺ + O₂ → 2H₂O"),
                    ("Proton pumping", "2H⁺ (matrix) → 2H⁺ (intermembrane space)"),
                ],
            ),
        );
        entries.insert(
            ComplexKey::AtpSynthase,
            ComplexInfo::new(
                "ATP Synthase",
                "The Molecular Turbine",
                "Uses the potential energy stored in the proton gradient (proton-motive force) to \
                 make ATP from ADP and inorganic phosphate (Pi). Protons flowing through the \
                 enzyme make it rotate and catalyse ATP production.",
                &[("ATP synthesis", "ADP + Pᵢ + H⁺ (out) → ATP + H₂O + H⁺ (in)")],
            ),
        );

        Self { entries }
    }
}

impl Default for Catalogue {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_key() {
        let catalogue = Catalogue::builtin();
        for key in ComplexKey::all() {
            assert!(catalogue.get(*key).is_ok(), "missing {key}");
        }
        assert_eq!(catalogue.get(ComplexKey::II).unwrap().reactions.len(), 1);
        assert_eq!(catalogue.get(ComplexKey::I).unwrap().title, "Complex I");

        let order: Vec<ComplexKey> = catalogue.iter().map(|(k, _)| k).collect();
        assert_eq!(order, ComplexKey::all());
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!("I".parse::<ComplexKey>().unwrap(), ComplexKey::I);
        assert_eq!("iv".parse::<ComplexKey>().unwrap(), ComplexKey::IV);
        assert_eq!("atp".parse::<ComplexKey>().unwrap(), ComplexKey::AtpSynthase);
        assert_eq!(
            "ATP_SYNTHASE".parse::<ComplexKey>().unwrap(),
            ComplexKey::AtpSynthase
        );
        assert!(matches!(
            "V".parse::<ComplexKey>(),
            Err(CatalogueError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_serialization() {
        let catalogue = Catalogue::builtin();
        let ron_str =
            ron::ser::to_string_pretty(&catalogue, ron::ser::PrettyConfig::default()).unwrap();
        let loaded = Catalogue::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, catalogue);
    }

    #[test]
    fn test_incomplete_catalogue_rejected() {
        let source = r#"{
            I: (title: "Complex I", subtitle: "", description: "", reactions: []),
        }"#;
        assert!(Catalogue::from_ron(source).is_err());
    }
}
