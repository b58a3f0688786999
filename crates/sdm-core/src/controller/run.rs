//! The monitor run loop: one task owning the controller.
//!
//! Periodic ticks, commands, download events, and deferred new-download
//! pauses are all serialized through a single `select!`, which is what makes
//! every cycle atomic with respect to every other cycle and command.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

use crate::downloads::{DownloadEvent, DownloadId};
use crate::status::{Command, CommandResponse};

use super::Controller;

/// Grace delay before auto-pausing a download observed while slow.
pub const NEW_DOWNLOAD_GRACE: Duration = Duration::from_secs(1);

/// One command paired with its reply channel.
pub type CommandRequest = (Command, oneshot::Sender<CommandResponse>);

/// Runs the controller until the command channel closes. The ticker fires at
/// the configured interval but cycles only run while monitoring is on; the
/// first cycle is issued by `start()` immediately.
pub async fn run(
    mut controller: Controller,
    mut commands: mpsc::Receiver<CommandRequest>,
    mut events: mpsc::Receiver<DownloadEvent>,
) -> Result<()> {
    let period = Duration::from_secs(controller.config().interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; start() already runs a cycle.
    ticker.tick().await;

    controller.start().await;

    let (defer_tx, mut deferred) = mpsc::channel::<DownloadId>(16);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if controller.is_monitoring() {
                    controller.run_cycle().await;
                }
            }
            request = commands.recv() => match request {
                Some((cmd, reply)) => {
                    let response = controller.handle_command(cmd).await;
                    let _ = reply.send(response);
                }
                None => break,
            },
            Some(event) = events.recv() => {
                controller.handle_event(event, &defer_tx);
            }
            Some(id) = deferred.recv() => {
                controller.pause_new_download(id).await;
            }
        }
    }

    tracing::info!("monitor loop stopped");
    Ok(())
}
