//! InlineExecutor: synchronous executor.

use crate::ports::{Executor, Job};

/// Runs every job to completion inside `execute`.
///
/// `submit` therefore blocks for the length of the computation, and by the
/// time it returns the handle is already terminal. Useful for deterministic
/// tests and single-threaded callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl InlineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for InlineExecutor {
    fn execute(&self, job: Job) {
        job();
    }

    fn name(&self) -> &'static str {
        "inline"
    }
}
