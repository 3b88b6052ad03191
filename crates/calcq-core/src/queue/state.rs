//! Handle state machine.

use serde::{Deserialize, Serialize};

/// State of one pending-result handle.
///
/// State transitions:
/// - Pending -> Completed (worker returned a value)
/// - Pending -> Failed (worker panicked, returned `Err`, or dropped the job)
///
/// Exactly one transition happens per handle. An interrupted wait is not a
/// transition: the handle stays where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleState {
    /// Computation has not finished yet.
    Pending,

    /// Computation produced a value.
    Completed,

    /// Computation did not produce a value.
    Failed,
}

impl HandleState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, HandleState::Completed | HandleState::Failed)
    }
}
