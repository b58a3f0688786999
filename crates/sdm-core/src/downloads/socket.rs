//! Unix-socket client for the external download manager.
//!
//! Protocol: one line per command. `list` is answered with a single JSON
//! array line of downloads; `pause <id>` / `resume <id>` are answered with
//! `ok` or `error <reason>`. A `watch` line switches the connection to a
//! stream of `created <id>` / `changed <id> <state>` event lines.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{DownloadControl, DownloadEvent, DownloadId, DownloadItem, DownloadState};

const IO_TIMEOUT: Duration = Duration::from_secs(2);

/// Client that issues one command per connection. Stateless, so a restarted
/// download manager needs no reconnect handling here.
#[derive(Debug, Clone)]
pub struct SocketDownloads {
    path: PathBuf,
}

impl SocketDownloads {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn request(&self, line: &str) -> Result<String> {
        let stream = UnixStream::connect(&self.path)
            .with_context(|| format!("download manager socket {}", self.path.display()))?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;

        let mut writer = stream.try_clone()?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;

        let mut reply = String::new();
        BufReader::new(stream).read_line(&mut reply)?;
        Ok(reply.trim_end().to_string())
    }

    fn expect_ok(&self, line: &str) -> Result<()> {
        let reply = self.request(line)?;
        if reply == "ok" {
            Ok(())
        } else {
            anyhow::bail!("download manager: {}", reply)
        }
    }
}

impl DownloadControl for SocketDownloads {
    fn list_active(&self) -> Result<Vec<DownloadItem>> {
        let reply = self.request("list")?;
        let items: Vec<DownloadItem> =
            serde_json::from_str(&reply).context("malformed list reply")?;
        Ok(items
            .into_iter()
            .filter(|d| d.state == DownloadState::InProgress)
            .collect())
    }

    fn pause(&self, id: DownloadId) -> Result<()> {
        self.expect_ok(&format!("pause {id}"))
    }

    fn resume(&self, id: DownloadId) -> Result<()> {
        self.expect_ok(&format!("resume {id}"))
    }
}

/// Parses one event line from a `watch` stream. Malformed lines yield `None`
/// and are ignored by the listener.
pub fn parse_event_line(line: &str) -> Option<DownloadEvent> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "created" => {
            let id = parts.next()?.parse().ok()?;
            Some(DownloadEvent::Created(id))
        }
        "changed" => {
            let id = parts.next()?.parse().ok()?;
            let state = match parts.next()? {
                "in_progress" => DownloadState::InProgress,
                "paused" => DownloadState::Paused,
                "complete" => DownloadState::Complete,
                "interrupted" => DownloadState::Interrupted,
                _ => return None,
            };
            Some(DownloadEvent::Changed(id, state))
        }
        _ => None,
    }
}

/// Delay before the first reconnect attempt; doubled per failure up to the cap.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);
const RECONNECT_BACKOFF_CAP: Duration = Duration::from_secs(30);

/// Spawns a thread that subscribes to the manager's event stream and forwards
/// each event into `tx`. The subscription outlives the manager: a closed or
/// refused connection is retried with backoff, so a restarted manager picks
/// up where it left off. The thread exits only once the receiving side is
/// dropped.
pub fn spawn_event_listener(
    path: impl AsRef<Path>,
    tx: tokio::sync::mpsc::Sender<DownloadEvent>,
) -> std::thread::JoinHandle<()> {
    let path = path.as_ref().to_path_buf();
    std::thread::spawn(move || listener_loop(&path, &tx, RECONNECT_BACKOFF))
}

fn listener_loop(path: &Path, tx: &tokio::sync::mpsc::Sender<DownloadEvent>, initial: Duration) {
    let mut backoff = initial;
    loop {
        match watch_session(path, tx) {
            Ok(true) => return,
            Ok(false) => {
                tracing::debug!(path = %path.display(), "download event stream closed; reconnecting");
                backoff = initial;
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), "download event stream unavailable: {}", e);
            }
        }
        std::thread::sleep(backoff);
        backoff = (backoff * 2).min(RECONNECT_BACKOFF_CAP);
        if tx.is_closed() {
            return;
        }
    }
}

/// One `watch` session: connect, subscribe, forward lines until the manager
/// hangs up. Returns `Ok(true)` when the receiver is gone and the listener
/// should stop for good.
fn watch_session(path: &Path, tx: &tokio::sync::mpsc::Sender<DownloadEvent>) -> Result<bool> {
    let stream = UnixStream::connect(path)?;
    (&stream).write_all(b"watch\n")?;
    for line in BufReader::new(stream).lines() {
        let line = line?;
        if let Some(event) = parse_event_line(&line) {
            if tx.blocking_send(event).is_err() {
                return Ok(true);
            }
        }
    }
    Ok(false)
}
