use std::time::Duration;

use log::{info, warn};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::engine::GameEngine;
use crate::protocol::Command;
use crate::rng::RandomSource;
use crate::types::{Phase, SessionSummary, Snapshot};

const COMMAND_QUEUE_CAPACITY: usize = 64;

pub struct DriverHandle {
    pub commands: mpsc::Sender<Command>,
    pub snapshots: watch::Receiver<Snapshot>,
    pub task: JoinHandle<SessionSummary>,
}

impl DriverHandle {
    /// Stops the loop and returns the summary of the last session.
    pub async fn shutdown(self) -> Option<SessionSummary> {
        // The loop may already be gone; the join below still reports its result.
        let _ = self.commands.send(Command::Shutdown).await;
        self.task.await.ok()
    }
}

/// Runs `engine` on a fixed-period tokio interval.
///
/// Commands are applied between ticks in arrival order. A snapshot with the
/// drained events is published after every tick that advanced the game and
/// after every command. The task ends on `Command::Shutdown` or when every
/// command sender is dropped.
pub fn spawn_tick_loop<R>(mut engine: GameEngine<R>) -> DriverHandle
where
    R: RandomSource + Send + 'static,
{
    let (command_tx, mut command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
    let (snapshot_tx, snapshot_rx) = watch::channel(engine.build_snapshot(true));
    let tick_ms = engine.config.tick_ms;

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(tick_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if engine.phase() != Phase::Playing {
                        continue;
                    }
                    engine.tick();
                    if engine.phase().is_terminal() {
                        info!("tick loop: session ended as {:?}", engine.phase());
                    }
                    snapshot_tx.send_replace(engine.build_snapshot(true));
                }
                command = command_rx.recv() => {
                    match command {
                        Some(Command::Intent(dir)) => engine.submit_direction_intent(dir),
                        Some(Command::Start) => engine.start(),
                        Some(Command::Restart) => engine.restart(),
                        Some(Command::Shutdown) => break,
                        None => {
                            warn!("tick loop: command channel closed");
                            break;
                        }
                    }
                    snapshot_tx.send_replace(engine.build_snapshot(true));
                }
            }
        }
        engine.build_summary()
    });

    DriverHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
        task,
    }
}
