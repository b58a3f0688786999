//! Download-control collaborator: the external download manager boundary.
//!
//! The reactor only needs three operations (list active, pause, resume) plus
//! a stream of state-change events. The trait keeps the engine testable with
//! in-memory fakes; `socket::SocketDownloads` is the real client.

pub mod socket;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub type DownloadId = i64;

/// External lifecycle state of a download, as the manager reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    InProgress,
    Paused,
    Complete,
    Interrupted,
}

impl DownloadState {
    /// True once the external system has taken the download out of any
    /// pausable state; tracking it further would leak managed entries.
    pub fn is_terminal(self) -> bool {
        matches!(self, DownloadState::Complete | DownloadState::Interrupted)
    }
}

/// One download as listed by the external manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadItem {
    pub id: DownloadId,
    pub state: DownloadState,
    pub filename: String,
}

/// State-change notification from the external manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadEvent {
    /// A new download appeared.
    Created(DownloadId),
    /// An existing download changed state.
    Changed(DownloadId, DownloadState),
}

/// Commands into the external download manager. Individual call failures are
/// expected (a download may finish between list and pause) and recoverable.
pub trait DownloadControl: Send + Sync {
    /// Downloads currently in progress.
    fn list_active(&self) -> Result<Vec<DownloadItem>>;
    fn pause(&self, id: DownloadId) -> Result<()>;
    fn resume(&self, id: DownloadId) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scriptable in-memory download manager for reactor/controller tests.

    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Default)]
    pub struct MockControl {
        inner: Mutex<Inner>,
    }

    #[derive(Debug, Default)]
    struct Inner {
        active: Vec<DownloadItem>,
        fail_pause: HashSet<DownloadId>,
        fail_resume: HashSet<DownloadId>,
        fail_all_resumes: bool,
        pause_calls: Vec<DownloadId>,
        resume_calls: Vec<DownloadId>,
    }

    impl MockControl {
        pub fn with_active(ids: &[DownloadId]) -> Self {
            let ctl = Self::default();
            {
                let mut inner = ctl.inner.lock().unwrap();
                inner.active = ids
                    .iter()
                    .map(|&id| DownloadItem {
                        id,
                        state: DownloadState::InProgress,
                        filename: format!("file-{id}"),
                    })
                    .collect();
            }
            ctl
        }

        pub fn fail_pause(&self, id: DownloadId) {
            self.inner.lock().unwrap().fail_pause.insert(id);
        }

        pub fn fail_all_resumes(&self) {
            self.inner.lock().unwrap().fail_all_resumes = true;
        }

        pub fn fail_resume(&self, id: DownloadId) {
            self.inner.lock().unwrap().fail_resume.insert(id);
        }

        pub fn pause_calls(&self) -> Vec<DownloadId> {
            self.inner.lock().unwrap().pause_calls.clone()
        }

        pub fn resume_calls(&self) -> Vec<DownloadId> {
            self.inner.lock().unwrap().resume_calls.clone()
        }
    }

    impl DownloadControl for MockControl {
        fn list_active(&self) -> Result<Vec<DownloadItem>> {
            Ok(self.inner.lock().unwrap().active.clone())
        }

        fn pause(&self, id: DownloadId) -> Result<()> {
            let mut inner = self.inner.lock().unwrap();
            inner.pause_calls.push(id);
            if inner.fail_pause.contains(&id) {
                anyhow::bail!("pause {} refused", id);
            }
            Ok(())
        }

        fn resume(&self, id: DownloadId) -> Result<()> {
            let mut inner = self.inner.lock().unwrap();
            inner.resume_calls.push(id);
            if inner.fail_all_resumes || inner.fail_resume.contains(&id) {
                anyhow::bail!("resume {} refused", id);
            }
            Ok(())
        }
    }
}
