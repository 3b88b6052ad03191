//! FIFO of pending-result handles.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::PendingResult;

/// Thread-safe FIFO of handles.
///
/// Design:
/// - Append only at the tail (submission), remove only at the head (retrieval).
/// - The internal lock is held only for the push/pop itself, never while a
///   caller waits on a handle.
/// - Unbounded: `push_back` never blocks.
pub struct TaskQueue<T> {
    handles: Mutex<VecDeque<PendingResult<T>>>,
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(VecDeque::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<PendingResult<T>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a handle at the tail. Returns the queue length after the push.
    pub fn push_back(&self, handle: PendingResult<T>) -> usize {
        let mut handles = self.lock();
        handles.push_back(handle);
        handles.len()
    }

    /// Remove the head handle, if any.
    pub fn pop_front(&self) -> Option<PendingResult<T>> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
