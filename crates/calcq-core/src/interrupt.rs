//! Interrupting a blocked retrieval.
//!
//! A thread blocked in `retrieve_interruptible` parks itself on an
//! [`InterruptToken`]. Another thread calls [`InterruptToken::interrupt`] to
//! wake it; the retrieval then returns without a value. The computation it was
//! waiting for keeps running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Something a parked waiter is blocked on and that can be woken from outside.
pub(crate) trait Wake: Send + Sync {
    fn wake(&self);
}

struct Inner {
    interrupted: AtomicBool,
    parked: Mutex<Option<Arc<dyn Wake>>>,
}

/// Cloneable interrupt flag for one waiting thread.
///
/// Clones share the same flag. Use one token per waiting thread: if two
/// threads wait on the same token at once, `interrupt` only reaches the one
/// that parked last.
#[derive(Clone)]
pub struct InterruptToken {
    inner: Arc<Inner>,
}

impl InterruptToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                interrupted: AtomicBool::new(false),
                parked: Mutex::new(None),
            }),
        }
    }

    /// Set the flag and wake the thread currently parked on this token, if any.
    ///
    /// The flag stays set until a wait consumes it, so interrupting before the
    /// wait starts still takes effect.
    pub fn interrupt(&self) {
        self.inner.interrupted.store(true, Ordering::SeqCst);
        let parked = self
            .inner
            .parked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waiter) = parked {
            waiter.wake();
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.inner.interrupted.load(Ordering::SeqCst)
    }

    /// Guard that interrupts this token when dropped.
    pub(crate) fn interrupt_on_drop(&self) -> InterruptOnDrop {
        InterruptOnDrop {
            token: self.clone(),
        }
    }

    /// Clear the flag. Returns whether it was set.
    pub(crate) fn take_interrupt(&self) -> bool {
        self.inner.interrupted.swap(false, Ordering::SeqCst)
    }

    /// Register `waiter` as the thing to wake. Unregisters when the guard drops.
    ///
    /// Must happen before the waiter's first flag check, otherwise an interrupt
    /// landing between the check and the registration is lost.
    pub(crate) fn park(&self, waiter: Arc<dyn Wake>) -> ParkGuard<'_> {
        *self
            .inner
            .parked
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(waiter);
        ParkGuard { token: self }
    }
}

impl Default for InterruptToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InterruptToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterruptToken")
            .field("interrupted", &self.is_interrupted())
            .finish()
    }
}

pub(crate) struct InterruptOnDrop {
    token: InterruptToken,
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        self.token.interrupt();
    }
}

pub(crate) struct ParkGuard<'a> {
    token: &'a InterruptToken,
}

impl Drop for ParkGuard<'_> {
    fn drop(&mut self) {
        self.token
            .inner
            .parked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}
