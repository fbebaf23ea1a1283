// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player application: wires config, player task and console together.

use crate::config::{ConfigError, PlayerConfig};
use crate::console::{self, ConsoleError};
use crate::player::{self, PlayerCommand, PlayerError};
use thiserror::Error;

/// Application errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Console failure
    #[error("Console error: {0}")]
    Console(#[from] ConsoleError),

    /// Player task failure
    #[error("Player error: {0}")]
    Player(#[from] PlayerError),

    /// Runtime could not start
    #[error("Failed to start runtime: {0}")]
    Runtime(std::io::Error),

    /// Player task panicked
    #[error("Player task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// The terminal player
pub struct PlayerApp {
    config: PlayerConfig,
}

impl PlayerApp {
    /// Create the app from a resolved config
    pub fn new(config: PlayerConfig) -> Self {
        Self { config }
    }

    /// Run on a fresh single-threaded runtime until the console exits
    pub fn run(self) -> Result<(), AppError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(AppError::Runtime)?;
        runtime.block_on(self.run_async())
    }

    async fn run_async(self) -> Result<(), AppError> {
        let animation = self.config.build_animation()?;
        tracing::info!(
            "Loaded {} steps ({:?} per pass)",
            animation.sequencer().timeline().len(),
            animation.sequencer().timeline().total_duration()
        );

        let (handle, task) = player::spawn(animation);
        if self.config.autoplay {
            handle.send(PlayerCommand::Play).await?;
        }

        let result = console::run(&handle, self.config.output).await;
        drop(handle);
        task.await?;
        result?;

        tracing::info!("Player closed");
        Ok(())
    }
}
