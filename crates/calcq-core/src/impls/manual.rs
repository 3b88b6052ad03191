//! ManualExecutor: jobs run only when the caller says so.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::ports::{Executor, Job};

/// Holds submitted jobs in a local backlog until they are driven explicitly.
///
/// Lets tests pick the completion order (`run_last` finishes the newest job
/// first) independently of the submission order.
///
/// Jobs always run on the thread that drives them, outside the backlog lock.
#[derive(Default)]
pub struct ManualExecutor {
    backlog: Mutex<VecDeque<Job>>,
}

impl ManualExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Job>> {
        self.backlog.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of jobs waiting to be driven.
    pub fn queued(&self) -> usize {
        self.lock().len()
    }

    /// Run the oldest job. Returns false if there was none.
    pub fn run_next(&self) -> bool {
        let job = self.lock().pop_front();
        Self::run(job)
    }

    /// Run the newest job. Returns false if there was none.
    pub fn run_last(&self) -> bool {
        let job = self.lock().pop_back();
        Self::run(job)
    }

    /// Run every queued job, oldest first. Returns how many ran.
    ///
    /// Jobs queued by the jobs themselves are run as well.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        ran
    }

    /// Drop every queued job without running it.
    pub fn discard_all(&self) -> usize {
        let jobs: Vec<Job> = self.lock().drain(..).collect();
        jobs.len()
    }

    fn run(job: Option<Job>) -> bool {
        match job {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }
}

impl Executor for ManualExecutor {
    fn execute(&self, job: Job) {
        self.lock().push_back(job);
    }

    fn name(&self) -> &'static str {
        "manual"
    }
}
