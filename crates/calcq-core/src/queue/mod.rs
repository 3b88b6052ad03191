//! Pending-result queue: per-task handles, their state machine, and the FIFO
//! that orders retrieval.

mod handle;
mod state;
mod task_queue;

pub use handle::{Completer, PendingResult, pending_result};
pub use state::HandleState;
pub use task_queue::TaskQueue;
