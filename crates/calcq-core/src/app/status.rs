//! Manager counters and their serializable snapshot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of a manager.
///
/// - `completed` / `failed`: computations that finished on a worker. A job the
///   executor dropped unrun counts in neither.
/// - `retrieved`: handles consumed by a retrieval that saw a terminal state.
/// - `interrupted`: handles consumed by a retrieval whose wait was interrupted.
/// - `discarded`: handles whose outcome was ready but whose async retrieval
///   had already been dropped.
/// - `empty_polls`: retrievals that found the queue empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerStats {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub retrieved: u64,
    pub interrupted: u64,
    pub discarded: u64,
    pub empty_polls: u64,
    pub pending: usize,
    pub last_submitted_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub(crate) struct Counters {
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    retrieved: AtomicU64,
    interrupted: AtomicU64,
    discarded: AtomicU64,
    empty_polls: AtomicU64,
    last_submitted_at: Mutex<Option<DateTime<Utc>>>,
}

impl Counters {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        *self
            .last_submitted_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
    }

    pub(crate) fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retrieved(&self) {
        self.retrieved.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_interrupted(&self) {
        self.interrupted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self) {
        self.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_empty_poll(&self) {
        self.empty_polls.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, pending: usize) -> ManagerStats {
        ManagerStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            retrieved: self.retrieved.load(Ordering::Relaxed),
            interrupted: self.interrupted.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            empty_polls: self.empty_polls.load(Ordering::Relaxed),
            pending,
            last_submitted_at: *self
                .last_submitted_at
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}
