//! Pause/resume reactions over the managed download set.
//!
//! The reactor only ever resumes downloads it paused itself. The managed set
//! holds exactly those ids: added on a successful pause, removed on resume
//! (successful or not) and when the external manager reports the download
//! complete or interrupted.
//!
//! Calls into the download manager are blocking socket I/O, so every batch
//! runs on the blocking pool; only the set itself is touched on the monitor
//! task, which keeps the single-writer discipline intact.

use std::collections::HashSet;
use std::sync::Arc;

use crate::downloads::{DownloadControl, DownloadId, DownloadState};

pub struct DownloadReactor {
    control: Arc<dyn DownloadControl>,
    managed: HashSet<DownloadId>,
}

impl DownloadReactor {
    pub fn new(control: Arc<dyn DownloadControl>) -> Self {
        Self {
            control,
            managed: HashSet::new(),
        }
    }

    /// Number of downloads currently paused by us. Reported as the paused
    /// count everywhere.
    pub fn managed_count(&self) -> usize {
        self.managed.len()
    }

    /// Pauses every in-progress download. A failure pausing one download is
    /// logged and skipped; the id is only tracked when the pause succeeded.
    /// Returns the number of successful pauses.
    pub async fn pause_all(&mut self) -> usize {
        let control = Arc::clone(&self.control);
        let paused = tokio::task::spawn_blocking(move || {
            let downloads = match control.list_active() {
                Ok(list) => list,
                Err(e) => {
                    tracing::warn!("could not list active downloads: {:#}", e);
                    return Vec::new();
                }
            };

            let mut paused = Vec::new();
            for d in downloads {
                match control.pause(d.id) {
                    Ok(()) => {
                        paused.push(d.id);
                        tracing::debug!(id = d.id, filename = %d.filename, "paused download");
                    }
                    Err(e) => {
                        tracing::warn!(id = d.id, "failed to pause download: {:#}", e);
                    }
                }
            }
            paused
        })
        .await;

        match paused {
            Ok(paused) => {
                let count = paused.len();
                self.managed.extend(paused);
                count
            }
            Err(e) => {
                tracing::warn!("pause batch task failed: {}", e);
                0
            }
        }
    }

    /// Resumes every managed download and drains the set unconditionally: a
    /// failed resume means the download is no longer our responsibility, and
    /// keeping it would only build up dead entries. Returns the number of
    /// successful resumes.
    pub async fn resume_all(&mut self) -> usize {
        // Drain before the batch runs; even an aborted batch leaves nothing
        // managed.
        let ids: Vec<DownloadId> = self.managed.drain().collect();
        if ids.is_empty() {
            return 0;
        }

        let control = Arc::clone(&self.control);
        let resumed = tokio::task::spawn_blocking(move || {
            let mut resumed = 0;
            for id in ids {
                match control.resume(id) {
                    Ok(()) => {
                        resumed += 1;
                        tracing::debug!(id, "resumed download");
                    }
                    Err(e) => {
                        tracing::warn!(id, "failed to resume download: {:#}", e);
                    }
                }
            }
            resumed
        })
        .await;

        resumed.unwrap_or_else(|e| {
            tracing::warn!("resume batch task failed: {}", e);
            0
        })
    }

    /// One pause attempt for a freshly observed download (the caller applies
    /// the grace delay first). Tracked only on success.
    pub async fn pause_new(&mut self, id: DownloadId) -> bool {
        let control = Arc::clone(&self.control);
        let ok = tokio::task::spawn_blocking(move || match control.pause(id) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(id, "failed to auto-pause new download: {:#}", e);
                false
            }
        })
        .await
        .unwrap_or_else(|e| {
            tracing::warn!("pause task failed: {}", e);
            false
        });

        if ok {
            self.managed.insert(id);
            tracing::info!(id, "auto-paused new download");
        }
        ok
    }

    /// Reacts to an external state change. A terminal state drops the id from
    /// the managed set without any resume call: the external system already
    /// took the download out of a pausable state.
    pub fn on_state_change(&mut self, id: DownloadId, state: DownloadState) {
        if state.is_terminal() && self.managed.remove(&id) {
            tracing::debug!(id, ?state, "download left managed set");
        }
    }
}

#[cfg(test)]
mod tests;
