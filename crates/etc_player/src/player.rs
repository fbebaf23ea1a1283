// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player task: drives an [`Animation`] on the tokio clock.
//!
//! The task owns the animation outright. Controls arrive as
//! [`PlayerCommand`]s over an mpsc channel and every change is published as
//! a [`RenderFrame`] on a watch channel. The sequencer's single pending
//! timer maps onto one `sleep_until`, recomputed after every event, so a
//! cancelled timer simply never gets waited on.

use etc_sequencer::{Animation, ClickTarget, ComplexKey, RenderFrame};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Command queue depth
const COMMAND_CAPACITY: usize = 32;

/// Control surface requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Play, or replay a finished timeline
    Play,
    /// Pause on the current step
    Pause,
    /// Play/pause button
    Toggle,
    /// Back to step 0
    Reset {
        /// Start playing again after the settle delay
        play_after_reset: bool,
    },
    /// Show a complex's description
    SelectComplex(ComplexKey),
    /// Close the description
    DismissInfo,
    /// Click on the open description
    Click(ClickTarget),
}

/// Player errors
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// The player task is gone
    #[error("Player task has stopped")]
    Closed,
}

/// Handle to a running player task.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
    frames: watch::Receiver<RenderFrame>,
}

impl PlayerHandle {
    /// Queue a command
    pub async fn send(&self, command: PlayerCommand) -> Result<(), PlayerError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PlayerError::Closed)
    }

    /// Latest published frame
    pub fn frame(&self) -> RenderFrame {
        self.frames.borrow().clone()
    }

    /// Receiver notified on every new frame
    pub fn subscribe(&self) -> watch::Receiver<RenderFrame> {
        self.frames.clone()
    }
}

/// Start a player task on the current runtime
pub fn spawn(animation: Animation) -> (PlayerHandle, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
    let (frame_tx, frame_rx) = watch::channel(animation.frame());

    let task = tokio::spawn(run(animation, command_rx, frame_tx));
    let handle = PlayerHandle {
        commands: command_tx,
        frames: frame_rx,
    };
    (handle, task)
}

async fn run(
    mut animation: Animation,
    mut commands: mpsc::Receiver<PlayerCommand>,
    frames: watch::Sender<RenderFrame>,
) {
    let origin = Instant::now();
    tracing::debug!("Player started");

    loop {
        let deadline = animation.next_deadline().map(|d| origin + d);

        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                animation.advance_to(origin.elapsed());
                apply(&mut animation, command);
            }
            () = wait_until(deadline) => {
                animation.advance_to(origin.elapsed());
            }
        }

        let next = animation.frame();
        frames.send_if_modified(|frame| {
            if *frame == next {
                return false;
            }
            *frame = next;
            true
        });
    }

    tracing::debug!("Player stopped");
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn apply(animation: &mut Animation, command: PlayerCommand) {
    tracing::trace!(?command, "Applying command");
    match command {
        PlayerCommand::Play => animation.play(),
        PlayerCommand::Pause => animation.pause(),
        PlayerCommand::Toggle => animation.toggle(),
        PlayerCommand::Reset { play_after_reset } => animation.reset(play_after_reset),
        PlayerCommand::SelectComplex(key) => {
            if let Err(e) = animation.on_complex_selected(key) {
                tracing::warn!("Cannot show complex {key}: {e}");
            }
        }
        PlayerCommand::DismissInfo => animation.on_info_dismissed(),
        PlayerCommand::Click(target) => {
            animation.on_info_clicked(target);
        }
    }
}
