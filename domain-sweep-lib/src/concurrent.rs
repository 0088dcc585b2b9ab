//! Concurrency utilities for the sweep pipeline.
//!
//! [`PendingCounter`] tracks how many items sit in a queue or are being
//! processed, which is what the shutdown coordinator waits on.
//! [`ScanStats`] holds the run counters shared by every task.

use crate::types::ScanSummary;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

/// Count of enqueued-but-unfinished items for one queue.
///
/// Producers call [`add`](Self::add) before sending, consumers call
/// [`done`](Self::done) after fully handling an item, so a zero count means
/// the queue is empty and nothing is in flight.
#[derive(Debug)]
pub struct PendingCounter {
    tx: watch::Sender<u64>,
}

impl PendingCounter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    pub fn add(&self) {
        self.tx.send_modify(|n| *n += 1);
    }

    pub fn done(&self) {
        self.tx.send_modify(|n| *n = n.saturating_sub(1));
    }

    pub fn pending(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Wait until the count reaches zero. Returns at once if it already is.
    pub async fn wait_idle(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for PendingCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Run counters updated by the generator, workers and sinks.
#[derive(Debug, Default)]
pub struct ScanStats {
    pub dispatched: AtomicU64,
    pub checked: AtomicU64,
    pub available: AtomicU64,
    pub failures: AtomicU64,
    pub faults: AtomicU64,
    pub skipped: AtomicU64,
}

impl ScanStats {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters into a summary, leaving the other fields default.
    pub fn snapshot(&self) -> ScanSummary {
        ScanSummary {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            checked: self.checked.load(Ordering::Relaxed),
            available: self.available.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            faults: self.faults.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            ..Default::default()
        }
    }
}
