//! One-shot pending-result cell.
//!
//! [`pending_result`] creates a connected pair:
//! - [`Completer`]: write half, moved into the job that runs on a worker.
//! - [`PendingResult`]: read half, stored in the task queue.
//!
//! The cell is a `Mutex` slot plus a `Condvar`, so waiters block instead of
//! polling.
//!
//! # 学習ポイント
//! - Mutex + Condvar による blocking wait（ポーリングしない）
//! - Drop で「実行されなかった」ことを通知する（`Completer` → `Abandoned`）
//! - 割り込みは `InterruptToken` 経由で Condvar を起こす

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use super::HandleState;
use crate::domain::{Retrieval, TaskFailure, TaskId};
use crate::interrupt::{InterruptToken, Wake};

enum Slot<T> {
    Pending,
    Completed(T),
    Failed(TaskFailure),
    /// The outcome has been moved out by a waiter.
    Taken,
}

struct Cell<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Cell<T> {
    // No user code runs under this lock, so a poisoned lock still holds a
    // consistent slot.
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, outcome: Result<T, TaskFailure>) {
        let mut slot = self.lock();
        if matches!(*slot, Slot::Pending) {
            *slot = match outcome {
                Ok(value) => Slot::Completed(value),
                Err(failure) => Slot::Failed(failure),
            };
            self.ready.notify_all();
        }
    }
}

impl<T: Send> Wake for Cell<T> {
    fn wake(&self) {
        // Taking the lock orders this notify after the waiter's flag check.
        let _slot = self.lock();
        self.ready.notify_all();
    }
}

/// Create a connected completer / handle pair for task `id`.
pub fn pending_result<T>(id: TaskId) -> (Completer<T>, PendingResult<T>) {
    let cell = Arc::new(Cell {
        slot: Mutex::new(Slot::Pending),
        ready: Condvar::new(),
    });
    let completer = Completer {
        id,
        cell: Some(Arc::clone(&cell)),
    };
    (completer, PendingResult { id, cell })
}

/// Write half of a pending result.
///
/// Consumed by [`Completer::complete`]. Dropping it without completing marks
/// the handle [`TaskFailure::Abandoned`], so a waiter never hangs on a job the
/// executor threw away.
pub struct Completer<T> {
    id: TaskId,
    cell: Option<Arc<Cell<T>>>,
}

impl<T> Completer<T> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Move the handle to its terminal state and wake the waiter.
    pub fn complete(mut self, outcome: Result<T, TaskFailure>) {
        if let Some(cell) = self.cell.take() {
            cell.resolve(outcome);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(cell) = self.cell.take() {
            cell.resolve(Err(TaskFailure::Abandoned));
        }
    }
}

/// Read half of a pending result: the eventual outcome of one computation.
///
/// Waiting consumes the handle, so each outcome is delivered at most once.
pub struct PendingResult<T> {
    id: TaskId,
    cell: Arc<Cell<T>>,
}

impl<T> PendingResult<T> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn state(&self) -> HandleState {
        match *self.cell.lock() {
            Slot::Pending => HandleState::Pending,
            Slot::Completed(_) => HandleState::Completed,
            // Taken only happens inside a wait, which owns the handle.
            Slot::Failed(_) | Slot::Taken => HandleState::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }
}

impl<T: Send + 'static> PendingResult<T> {
    /// Block until the computation reaches a terminal state.
    ///
    /// Returns [`Retrieval::Value`] or [`Retrieval::Failed`].
    pub fn wait(self) -> Retrieval<T> {
        self.wait_inner(None)
    }

    /// Like [`PendingResult::wait`], but returns [`Retrieval::Interrupted`] as
    /// soon as `token` is interrupted.
    ///
    /// An outcome that is already available wins over a pending interrupt; in
    /// that case the token's flag is left set.
    pub fn wait_interruptible(self, token: &InterruptToken) -> Retrieval<T> {
        self.wait_inner(Some(token))
    }

    fn wait_inner(self, token: Option<&InterruptToken>) -> Retrieval<T> {
        let waiter: Arc<dyn Wake> = self.cell.clone();
        let _parked = token.map(|t| t.park(waiter));

        let mut slot = self.cell.lock();
        loop {
            match std::mem::replace(&mut *slot, Slot::Taken) {
                Slot::Completed(value) => return Retrieval::Value(value),
                Slot::Failed(failure) => return Retrieval::Failed(failure),
                Slot::Taken => return Retrieval::Failed(TaskFailure::Abandoned),
                Slot::Pending => *slot = Slot::Pending,
            }
            if token.is_some_and(InterruptToken::take_interrupt) {
                return Retrieval::Interrupted;
            }
            slot = self
                .cell
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl<T> std::fmt::Debug for PendingResult<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingResult")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}
