// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player configuration.
//!
//! Settings are read from an optional RON file and then overridden by
//! command-line flags. Every field has a default, so an empty file (or no
//! file at all) plays the built-in timeline.

use etc_sequencer::{
    Animation, Catalogue, CatalogueError, SequencerConfig, Timeline, TimelineError,
    DEFAULT_SETTLE_DELAY,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default tracing directives
pub const DEFAULT_LOG_FILTER: &str = "etc_player=info,etc_sequencer=info";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Timeline file could not be used
    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// Catalogue file could not be used
    #[error("Catalogue error: {0}")]
    Catalogue(#[from] CatalogueError),

    /// Settle delay must be positive
    #[error("Invalid settle delay: {0}ms")]
    InvalidSettleDelay(u64),
}

/// How frames are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable status lines
    #[default]
    Text,
    /// One JSON object per frame
    Json,
}

/// Player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Custom timeline file (RON); built-in timeline when absent
    pub timeline: Option<PathBuf>,
    /// Custom catalogue file (RON); built-in catalogue when absent
    pub catalogue: Option<PathBuf>,
    /// Delay between a replay reset and motion, in milliseconds
    pub settle_delay_ms: u64,
    /// Start playing immediately
    pub autoplay: bool,
    /// Frame output format
    pub output: OutputFormat,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            timeline: None,
            catalogue: None,
            settle_delay_ms: DEFAULT_SETTLE_DELAY.as_millis() as u64,
            autoplay: false,
            output: OutputFormat::Text,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl PlayerConfig {
    /// Deserialize from RON format
    pub fn from_ron(s: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.settle_delay_ms == 0 {
            return Err(ConfigError::InvalidSettleDelay(self.settle_delay_ms));
        }
        Ok(())
    }

    /// Sequencer settings derived from this config
    pub fn sequencer_config(&self) -> SequencerConfig {
        SequencerConfig {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
        }
    }

    /// The configured timeline, or the built-in one
    pub fn load_timeline(&self) -> Result<Timeline, ConfigError> {
        match &self.timeline {
            Some(path) => Ok(Timeline::load(path)?),
            None => Ok(Timeline::builtin()),
        }
    }

    /// The configured catalogue, or the built-in one
    pub fn load_catalogue(&self) -> Result<Catalogue, ConfigError> {
        match &self.catalogue {
            Some(path) => Ok(Catalogue::load(path)?),
            None => Ok(Catalogue::builtin()),
        }
    }

    /// Assemble the animation described by this config
    pub fn build_animation(&self) -> Result<Animation, ConfigError> {
        Ok(Animation::new(
            self.load_timeline()?,
            self.load_catalogue()?,
            self.sequencer_config(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PlayerConfig::default();
        assert_eq!(config.settle_delay_ms, 100);
        assert_eq!(config.output, OutputFormat::Text);
        assert!(!config.autoplay);
        assert_eq!(
            config.sequencer_config().settle_delay,
            Duration::from_millis(100)
        );
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = PlayerConfig::from_ron("(autoplay: true, output: Json)").unwrap();
        assert!(config.autoplay);
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.settle_delay_ms, 100);
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_zero_settle_delay_rejected() {
        assert!(matches!(
            PlayerConfig::from_ron("(settle_delay_ms: 0)"),
            Err(ConfigError::InvalidSettleDelay(0))
        ));
    }

    #[test]
    fn test_serialization() {
        let config = PlayerConfig {
            timeline: Some(PathBuf::from("timelines/short.ron")),
            ..PlayerConfig::default()
        };
        let ron_str = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let loaded = PlayerConfig::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_timeline_file() {
        let config = PlayerConfig {
            timeline: Some(PathBuf::from("/nonexistent/timeline.ron")),
            ..PlayerConfig::default()
        };
        assert!(matches!(
            config.build_animation(),
            Err(ConfigError::Timeline(TimelineError::Io(_)))
        ));
    }

    #[test]
    fn test_sample_config_parses() {
        let config = PlayerConfig::from_ron(include_str!("../assets/player.ron")).unwrap();
        assert!(config.autoplay);
        assert!(config.timeline.is_none());
        assert_eq!(config.log_filter, "etc_player=info,etc_sequencer=debug");
    }

    #[test]
    fn test_builds_builtin_animation() {
        let animation = PlayerConfig::default().build_animation().unwrap();
        assert_eq!(animation.sequencer().timeline().len(), 15);
    }
}
