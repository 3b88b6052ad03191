//! TokioBlockingPool: the default worker pool.
//!
//! Jobs go to tokio's blocking thread pool (`spawn_blocking`), which already
//! behaves like a cached thread pool: threads are spawned on demand while all
//! existing ones are busy, reused when idle, and retired after the keep-alive
//! period.

use std::time::Duration;

use log::{debug, info};
use tokio::runtime::{Builder, Handle, Runtime};

use crate::config::PoolConfig;
use crate::error::CalcError;
use crate::ports::{Executor, Job};

/// Executor backed by a tokio blocking pool.
///
/// Either owns a dedicated runtime ([`TokioBlockingPool::new`]) or borrows
/// the blocking pool of an existing one ([`TokioBlockingPool::from_handle`]).
pub struct TokioBlockingPool {
    /// Present only when this pool owns its runtime.
    runtime: Option<Runtime>,
    handle: Handle,
}

impl TokioBlockingPool {
    /// Start a dedicated runtime sized by `config`.
    pub fn new(config: &PoolConfig) -> Result<Self, CalcError> {
        config.validate()?;

        let runtime = Builder::new_multi_thread()
            // The async workers stay idle; all jobs run on blocking threads.
            .worker_threads(1)
            .max_blocking_threads(config.max_threads)
            .thread_keep_alive(config.keep_alive())
            .thread_name(config.thread_name.clone())
            .build()
            .map_err(CalcError::Runtime)?;

        info!(
            "worker pool started: max_threads={} keep_alive={:?} thread_name={}",
            config.max_threads,
            config.keep_alive(),
            config.thread_name
        );

        let handle = runtime.handle().clone();
        Ok(Self {
            runtime: Some(runtime),
            handle,
        })
    }

    /// Use the blocking pool of an already running runtime.
    ///
    /// Sizing then follows that runtime's builder, not a [`PoolConfig`].
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            runtime: None,
            handle,
        }
    }

    pub fn owns_runtime(&self) -> bool {
        self.runtime.is_some()
    }

    /// Shut the owned runtime down, waiting at most `timeout` for running jobs.
    ///
    /// Jobs that have not started yet are dropped and their handles report an
    /// abandoned computation. No-op for a borrowed runtime.
    pub fn shutdown_timeout(mut self, timeout: Duration) {
        if let Some(runtime) = self.runtime.take() {
            debug!("worker pool shutting down (timeout={timeout:?})");
            runtime.shutdown_timeout(timeout);
        }
    }
}

impl Drop for TokioBlockingPool {
    fn drop(&mut self) {
        // A plain runtime drop blocks on running jobs and panics inside an
        // async context; detach them instead.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl Executor for TokioBlockingPool {
    fn execute(&self, job: Job) {
        // Detached: the pending result is the only way to observe the job.
        drop(self.handle.spawn_blocking(job));
    }

    fn name(&self) -> &'static str {
        "tokio-blocking-pool"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Retrieval, TaskFailure, TaskId};
    use crate::queue::pending_result;
    use std::sync::mpsc;

    #[test]
    fn runs_jobs_on_named_pool_threads() {
        let config = PoolConfig::default().with_max_threads(2);
        let pool = TokioBlockingPool::new(&config).unwrap();
        assert!(pool.owns_runtime());

        let (tx, rx) = mpsc::channel();
        pool.execute(Box::new(move || {
            let name = std::thread::current().name().map(str::to_string);
            tx.send(name).unwrap();
        }));

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("calcq-worker"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PoolConfig::default().with_max_threads(0);
        assert!(matches!(
            TokioBlockingPool::new(&config),
            Err(CalcError::Config(_))
        ));
    }

    #[test]
    fn shutdown_abandons_jobs_that_never_started() {
        let config = PoolConfig::default().with_max_threads(1);
        let pool = TokioBlockingPool::new(&config).unwrap();

        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        pool.execute(Box::new(move || {
            started_tx.send(()).unwrap();
            let _ = release_rx.recv_timeout(Duration::from_secs(1));
        }));
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // The only blocking thread is busy, so this job stays queued.
        let (completer, handle) = pending_result::<u8>(TaskId::generate());
        pool.execute(Box::new(move || completer.complete(Ok(1))));

        pool.shutdown_timeout(Duration::from_millis(50));
        let _ = release_tx.send(());

        assert_eq!(handle.wait(), Retrieval::Failed(TaskFailure::Abandoned));
    }

    #[tokio::test]
    async fn borrowed_runtime_is_not_owned() {
        let pool = TokioBlockingPool::from_handle(Handle::current());
        assert!(!pool.owns_runtime());

        let (tx, rx) = tokio::sync::oneshot::channel();
        pool.execute(Box::new(move || {
            let _ = tx.send(21 * 2);
        }));

        assert_eq!(rx.await.unwrap(), 42);
        // Dropping a borrowed pool must not touch the caller's runtime.
        drop(pool);
    }
}
