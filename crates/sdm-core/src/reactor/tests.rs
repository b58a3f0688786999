//! Tests for the managed-set invariants of the reactor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crate::downloads::mock::MockControl;
use crate::downloads::{DownloadControl, DownloadId, DownloadItem, DownloadState};

use super::DownloadReactor;

#[tokio::test]
async fn pause_all_tracks_only_successful_pauses() {
    let control = Arc::new(MockControl::with_active(&[1, 2, 3]));
    control.fail_pause(2);
    let mut reactor = DownloadReactor::new(control.clone());

    assert_eq!(reactor.pause_all().await, 2);
    assert_eq!(reactor.managed_count(), 2);
    // The failed id was attempted but never tracked.
    assert_eq!(control.pause_calls(), vec![1, 2, 3]);
}

#[tokio::test]
async fn resume_all_returns_success_count_and_empties_set() {
    let control = Arc::new(MockControl::with_active(&[1, 2, 3]));
    let mut reactor = DownloadReactor::new(control.clone());
    assert_eq!(reactor.pause_all().await, 3);

    control.fail_resume(2);
    assert_eq!(reactor.resume_all().await, 2);
    assert_eq!(reactor.managed_count(), 0);
}

#[tokio::test]
async fn resume_all_empties_set_even_when_every_resume_fails() {
    let control = Arc::new(MockControl::with_active(&[10, 11]));
    let mut reactor = DownloadReactor::new(control.clone());
    assert_eq!(reactor.pause_all().await, 2);

    control.fail_all_resumes();
    assert_eq!(reactor.resume_all().await, 0);
    assert_eq!(reactor.managed_count(), 0);
    assert_eq!(control.resume_calls().len(), 2);
}

#[tokio::test]
async fn completed_download_is_dropped_without_resume() {
    let control = Arc::new(MockControl::with_active(&[5]));
    let mut reactor = DownloadReactor::new(control.clone());
    assert_eq!(reactor.pause_all().await, 1);

    reactor.on_state_change(5, DownloadState::Complete);
    assert_eq!(reactor.managed_count(), 0);
    assert!(control.resume_calls().is_empty());

    // Resuming afterwards touches nothing.
    assert_eq!(reactor.resume_all().await, 0);
    assert!(control.resume_calls().is_empty());
}

#[tokio::test]
async fn interrupted_download_is_dropped() {
    let control = Arc::new(MockControl::with_active(&[7]));
    let mut reactor = DownloadReactor::new(control.clone());
    reactor.pause_all().await;
    reactor.on_state_change(7, DownloadState::Interrupted);
    assert_eq!(reactor.managed_count(), 0);
}

#[tokio::test]
async fn non_terminal_change_keeps_download_managed() {
    let control = Arc::new(MockControl::with_active(&[7]));
    let mut reactor = DownloadReactor::new(control.clone());
    reactor.pause_all().await;
    reactor.on_state_change(7, DownloadState::Paused);
    assert_eq!(reactor.managed_count(), 1);
}

#[tokio::test]
async fn pause_new_tracks_on_success_only() {
    let control = Arc::new(MockControl::with_active(&[]));
    control.fail_pause(9);
    let mut reactor = DownloadReactor::new(control.clone());

    assert!(!reactor.pause_new(9).await);
    assert_eq!(reactor.managed_count(), 0);

    assert!(reactor.pause_new(8).await);
    assert_eq!(reactor.managed_count(), 1);
}

#[tokio::test]
async fn pausing_twice_does_not_duplicate_ids() {
    let control = Arc::new(MockControl::with_active(&[1, 2]));
    let mut reactor = DownloadReactor::new(control.clone());
    assert_eq!(reactor.pause_all().await, 2);
    // Second sweep sees the same actives again (manager never paused them);
    // the set must still hold two ids, not four.
    assert_eq!(reactor.pause_all().await, 2);
    assert_eq!(reactor.managed_count(), 2);
}

/// A control whose pause stalls in blocking I/O, like a slow manager socket.
struct StalledControl;

impl DownloadControl for StalledControl {
    fn list_active(&self) -> Result<Vec<DownloadItem>> {
        Ok(vec![DownloadItem {
            id: 1,
            filename: "big.iso".into(),
            state: DownloadState::InProgress,
        }])
    }

    fn pause(&self, _id: DownloadId) -> Result<()> {
        std::thread::sleep(Duration::from_millis(200));
        Ok(())
    }

    fn resume(&self, _id: DownloadId) -> Result<()> {
        Ok(())
    }
}

// On a current-thread runtime a pause batch run inline would freeze timers
// for its whole duration. The batch rides the blocking pool, so a timer due
// midway must still fire before the batch returns.
#[tokio::test]
async fn pause_batch_keeps_the_runtime_responsive() {
    let mut reactor = DownloadReactor::new(Arc::new(StalledControl));

    let fired = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&fired);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        flag.store(true, Ordering::SeqCst);
    });

    assert_eq!(reactor.pause_all().await, 1);
    assert!(fired.load(Ordering::SeqCst));
}
