// SPDX-License-Identifier: MIT OR Apache-2.0
//! Terminal front end.
//!
//! Reads one command per line from stdin, forwards it to the player and
//! prints each new frame, either as a status block or as JSON.

use crate::config::OutputFormat;
use crate::player::{PlayerCommand, PlayerError, PlayerHandle};
use etc_sequencer::{CatalogueError, ClickTarget, ComplexKey, RenderFrame};
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Help text listing every command
pub const HELP: &str = "\
Commands:
  play            start, resume, or replay a finished timeline
  pause           pause on the current step
  toggle          play/pause button
  reset           back to the first step
  replay          back to the first step and play again
  info <complex>  show a complex (I, II, III, IV, ATP)
  close           close the complex description
  backdrop        click outside the description
  body            click inside the description
  status          print the current frame
  help            print this text
  quit            exit";

/// Command parse errors
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Blank line
    #[error("Empty command")]
    Empty,

    /// Unrecognized command word
    #[error("Unknown command: {0} (type 'help')")]
    Unknown(String),

    /// `info` without a complex
    #[error("Missing complex, expected one of I, II, III, IV, ATP")]
    MissingComplex,

    /// Unrecognized complex
    #[error(transparent)]
    Complex(#[from] CatalogueError),
}

/// A parsed console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Forward to the player
    Player(PlayerCommand),
    /// Print the current frame
    Status,
    /// Print the command list
    Help,
    /// Leave the console
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(word) = words.next() else {
            return Err(CommandError::Empty);
        };

        let command = match word.to_ascii_lowercase().as_str() {
            "play" => PlayerCommand::Play,
            "pause" => PlayerCommand::Pause,
            "toggle" | "space" => PlayerCommand::Toggle,
            "reset" => PlayerCommand::Reset {
                play_after_reset: false,
            },
            "replay" => PlayerCommand::Reset {
                play_after_reset: true,
            },
            "info" | "complex" => {
                let key = words.next().ok_or(CommandError::MissingComplex)?;
                PlayerCommand::SelectComplex(key.parse::<ComplexKey>()?)
            }
            "close" => PlayerCommand::Click(ClickTarget::CloseButton),
            "backdrop" => PlayerCommand::Click(ClickTarget::Backdrop),
            "body" => PlayerCommand::Click(ClickTarget::Body),
            "dismiss" => PlayerCommand::DismissInfo,
            "status" => return Ok(Self::Status),
            "help" | "?" => return Ok(Self::Help),
            "quit" | "exit" | "q" => return Ok(Self::Quit),
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Self::Player(command))
    }
}

/// Human-readable status block for a frame
pub fn format_text(frame: &RenderFrame) -> String {
    let mut out = format!(
        "[{:>2}/{}] {} ({}ms)\n        {}\n        {} | {} | gradient {} | rotor {} | {}%",
        frame.step_index,
        frame.step_count - 1,
        frame.step_name,
        frame.step_duration_ms,
        frame.step_description,
        frame.state.status_text(),
        frame.play_button.label(),
        frame.gradient_level,
        if frame.rotor_active { "spinning" } else { "still" },
        frame.progress_percent(),
    );

    let snapshot = &frame.snapshot;
    out.push_str(&format!(
        "\n        H+ matrix {} | H+ intermembrane {} | ATP {}",
        snapshot.visible_matrix_protons(),
        snapshot.visible_intermembrane_protons(),
        if snapshot.atp.is_visible() { "visible" } else { "hidden" },
    ));
    for (i, electron) in snapshot.electrons.iter().filter(|e| e.is_visible()).enumerate() {
        out.push_str(&format!(
            "\n        e- {} at top {} left {}",
            i, electron.top, electron.left
        ));
    }

    if let Some(panel) = &frame.info {
        out.push_str(&format!(
            "\n  ┌ {} ({})\n  │ {}",
            panel.info.title, panel.info.subtitle, panel.info.description
        ));
        for reaction in &panel.info.reactions {
            out.push_str(&format!("\n  │ {}: {}", reaction.label, reaction.equation));
        }
        out.push_str("\n  └ close | backdrop");
    }
    out
}

/// Write one frame to `out` in the requested format
pub fn write_frame(
    out: &mut impl Write,
    frame: &RenderFrame,
    format: OutputFormat,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{}", format_text(frame)),
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, frame)?;
            writeln!(out)
        }
    }
}

/// Run the console until `quit` or end of input
pub async fn run(handle: &PlayerHandle, format: OutputFormat) -> Result<(), ConsoleError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut frames = handle.subscribe();
    let stdout = std::io::stdout();

    write_frame(&mut stdout.lock(), &frames.borrow_and_update(), format)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::debug!("End of input");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ConsoleCommand>() {
                    Ok(ConsoleCommand::Player(command)) => handle.send(command).await?,
                    Ok(ConsoleCommand::Status) => {
                        write_frame(&mut stdout.lock(), &handle.frame(), format)?;
                    }
                    Ok(ConsoleCommand::Help) => println!("{HELP}"),
                    Ok(ConsoleCommand::Quit) => break,
                    Err(e) => tracing::warn!("{e}"),
                }
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    tracing::warn!("Player stopped publishing frames");
                    break;
                }
                let frame = frames.borrow_and_update().clone();
                write_frame(&mut stdout.lock(), &frame, format)?;
            }
        }
    }
    Ok(())
}

/// Console errors
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Reading stdin or writing stdout failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The player task stopped
    #[error(transparent)]
    Player(#[from] PlayerError),
}
