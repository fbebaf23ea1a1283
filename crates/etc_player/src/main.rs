// SPDX-License-Identifier: MIT OR Apache-2.0
//! Terminal player for the electron transport chain animation.
//!
//! Plays the scripted animation of mitochondrial respiration:
//! - Timed steps from NADH at Complex I to ATP synthesis
//! - Play, pause, reset and replay from the keyboard
//! - Complex descriptions that hold playback while open
//! - Text or JSON frame output
//!
//! ## Architecture
//!
//! The player runs a single-threaded tokio runtime. One task owns the
//! animation and sleeps until its next timer; the console forwards stdin
//! commands to it and prints every published frame.

mod app;
mod config;
mod console;
mod player;

use app::PlayerApp;
use clap::Parser;
use config::{OutputFormat, PlayerConfig};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Command-line flags; each overrides the config file
#[derive(Debug, Parser)]
#[command(version, about = "Electron transport chain animation player")]
struct Cli {
    /// Config file (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Timeline file (RON)
    #[arg(short, long)]
    timeline: Option<PathBuf>,

    /// Start playing immediately
    #[arg(long)]
    autoplay: bool,

    /// Print frames as JSON
    #[arg(long)]
    json: bool,

    /// Print the resolved timeline as RON and exit
    #[arg(long)]
    dump_timeline: bool,
}

impl Cli {
    fn resolve(&self) -> Result<PlayerConfig, config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => PlayerConfig::load(path)?,
            None => PlayerConfig::default(),
        };
        if let Some(timeline) = &self.timeline {
            config.timeline = Some(timeline.clone());
        }
        if self.autoplay {
            config.autoplay = true;
        }
        if self.json {
            config.output = OutputFormat::Json;
        }
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match cli.resolve() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("etc_player: {e}");
            std::process::exit(2);
        }
    };

    // RUST_LOG wins over the configured filter
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting etc_player v{}", env!("CARGO_PKG_VERSION"));

    if cli.dump_timeline {
        match config.load_timeline().and_then(|t| Ok(t.to_ron()?)) {
            Ok(ron) => println!("{ron}"),
            Err(e) => {
                tracing::error!("Cannot dump timeline: {e}");
                std::process::exit(1);
            }
        }
        return;
    }

    if let Err(e) = PlayerApp::new(config).run() {
        tracing::error!("Player failed: {e}");
        std::process::exit(1);
    }
}
