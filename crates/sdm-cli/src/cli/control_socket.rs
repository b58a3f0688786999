//! Control socket: server (during `sdm run`) and client (for the other
//! subcommands). Protocol: one JSON command per line, one JSON result line
//! back; a plain `watch` line switches the connection to a stream of
//! status-update events.

use anyhow::{Context, Result};
use sdm_core::controller::CommandRequest;
use sdm_core::status::{Command, CommandResponse, Event};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot};

/// Spawns a task that serves commands on `path`, forwarding each parsed
/// command into the monitor loop and writing the reply back. Unparseable
/// lines are answered with the unknown-action result, never dropped.
pub fn spawn_command_listener(
    path: impl AsRef<Path>,
    commands: mpsc::Sender<CommandRequest>,
    updates: broadcast::Sender<Event>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    let _ = std::fs::remove_file(&path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let listener = UnixListener::bind(&path)
        .with_context(|| format!("control socket bind {}", path.display()))?;

    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let commands = commands.clone();
                    let updates = updates.clone();
                    tokio::spawn(async move {
                        if let Err(e) = serve_connection(stream, commands, updates).await {
                            tracing::debug!("control connection: {}", e);
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

async fn serve_connection(
    stream: UnixStream,
    commands: mpsc::Sender<CommandRequest>,
    updates: broadcast::Sender<Event>,
) -> Result<()> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "watch" {
            return stream_updates(write, updates.subscribe()).await;
        }

        let response = match serde_json::from_str::<Command>(line) {
            Ok(cmd) => {
                let (reply_tx, reply_rx) = oneshot::channel();
                if commands.send((cmd, reply_tx)).await.is_err() {
                    CommandResponse::err("monitor loop stopped")
                } else {
                    reply_rx
                        .await
                        .unwrap_or_else(|_| CommandResponse::err("monitor loop stopped"))
                }
            }
            Err(_) => CommandResponse::unknown_action(),
        };

        let mut payload = serde_json::to_string(&response)?;
        payload.push('\n');
        write.write_all(payload.as_bytes()).await?;
    }
    Ok(())
}

async fn stream_updates(
    mut write: tokio::net::unix::OwnedWriteHalf,
    mut updates: broadcast::Receiver<Event>,
) -> Result<()> {
    loop {
        let event = match updates.recv().await {
            Ok(event) => event,
            // Skip over missed events rather than dropping the subscriber.
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        };
        let mut payload = serde_json::to_string(&event)?;
        payload.push('\n');
        write.write_all(payload.as_bytes()).await?;
    }
}

/// Sends one command to the daemon and returns its response.
pub async fn send_command(path: &Path, cmd: Command) -> Result<CommandResponse> {
    let stream = UnixStream::connect(path)
        .await
        .with_context(|| format!("daemon not running (no socket at {})", path.display()))?;
    let (read, mut write) = stream.into_split();

    let mut payload = serde_json::to_string(&cmd)?;
    payload.push('\n');
    write.write_all(payload.as_bytes()).await?;

    let mut reply = String::new();
    BufReader::new(read).read_line(&mut reply).await?;
    serde_json::from_str(reply.trim()).context("malformed daemon response")
}

/// Subscribes to the daemon's status-update stream, invoking `on_event` for
/// each broadcast until the daemon closes the connection.
pub async fn watch_updates(path: &Path, mut on_event: impl FnMut(Event)) -> Result<()> {
    let stream = UnixStream::connect(path)
        .await
        .with_context(|| format!("daemon not running (no socket at {})", path.display()))?;
    let (read, mut write) = stream.into_split();
    write.write_all(b"watch\n").await?;

    let mut lines = BufReader::new(read).lines();
    while let Some(line) = lines.next_line().await? {
        match serde_json::from_str::<Event>(&line) {
            Ok(event) => on_event(event),
            Err(e) => tracing::debug!("unrecognized update: {}", e),
        }
    }
    Ok(())
}
