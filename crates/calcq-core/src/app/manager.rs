//! ConcurrentCalculationManager: submit computations, retrieve results in
//! submission order.

use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::oneshot;

use super::status::{Counters, ManagerStats};
use super::ManagerBuilder;
use crate::domain::{Retrieval, RetrievalKind, TaskFailure, TaskId};
use crate::error::CalcError;
use crate::interrupt::InterruptToken;
use crate::ports::Executor;
use crate::queue::{TaskQueue, pending_result};

struct Inner<T> {
    queue: TaskQueue<T>,
    executor: Arc<dyn Executor>,
    counters: Arc<Counters>,
}

/// Runs computations in parallel and hands their results back in the order
/// they were submitted.
///
/// Design intent:
/// - `submit` schedules the computation and appends its handle to a FIFO.
///   It never blocks (unless the executor itself runs jobs inline).
/// - `retrieve` pops the head handle and waits for that one computation only.
///   A later computation finishing first does not let it jump the queue.
/// - Clones share the same queue and executor.
pub struct ConcurrentCalculationManager<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ConcurrentCalculationManager<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> ConcurrentCalculationManager<T> {
    /// Manager with a dedicated default-sized worker pool.
    pub fn new() -> Result<Self, CalcError> {
        ManagerBuilder::new().build()
    }

    pub fn builder() -> ManagerBuilder<T> {
        ManagerBuilder::new()
    }

    /// Manager running its jobs on `executor`.
    pub fn with_executor(executor: Arc<dyn Executor>) -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: TaskQueue::new(),
                executor,
                counters: Arc::new(Counters::default()),
            }),
        }
    }

    /// Schedule `work` and queue a handle for its result.
    ///
    /// A panic inside `work` is caught on the worker and turns into a failed
    /// result.
    pub fn submit<F>(&self, work: F) -> TaskId
    where
        F: FnOnce() -> T + Send + 'static,
    {
        self.schedule(move || Ok(work()))
    }

    /// Like [`ConcurrentCalculationManager::submit`] for computations that can
    /// fail; `Err(e)` is recorded as a failed result carrying `e.to_string()`.
    pub fn submit_fallible<F, E>(&self, work: F) -> TaskId
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        E: Display,
    {
        self.schedule(move || work().map_err(|e| TaskFailure::Errored(e.to_string())))
    }

    fn schedule<F>(&self, work: F) -> TaskId
    where
        F: FnOnce() -> Result<T, TaskFailure> + Send + 'static,
    {
        let id = TaskId::generate();
        let (completer, handle) = pending_result(id);
        let counters = Arc::clone(&self.inner.counters);

        self.inner.counters.record_submitted();
        self.inner.executor.execute(Box::new(move || {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(work)) {
                Ok(outcome) => outcome,
                Err(payload) => Err(TaskFailure::from_panic(payload)),
            };
            // Count before completing so a retriever never sees a value the
            // stats do not know about yet.
            match &outcome {
                Ok(_) => counters.record_completed(),
                Err(failure) => {
                    counters.record_failed();
                    warn!("{id} failed: {failure}");
                }
            }
            completer.complete(outcome);
        }));

        let pending = self.inner.queue.push_back(handle);
        debug!(
            "submitted {id} to {} (pending={pending})",
            self.inner.executor.name()
        );
        id
    }

    /// Result of the earliest-submitted task not yet retrieved.
    ///
    /// Returns `None` without blocking if nothing is queued, and `None` if the
    /// computation failed. Otherwise blocks until that computation finishes.
    pub fn retrieve(&self) -> Option<T> {
        self.retrieve_outcome().into_option()
    }

    /// [`ConcurrentCalculationManager::retrieve`] whose wait can be cut short
    /// through `token`.
    ///
    /// An interrupted call returns `None`; the dequeued task keeps running and
    /// its value is discarded.
    pub fn retrieve_interruptible(&self, token: &InterruptToken) -> Option<T> {
        self.retrieve_outcome_interruptible(token).into_option()
    }

    /// Same ordering as [`ConcurrentCalculationManager::retrieve`], but tells
    /// an empty queue, a failure and its cause apart.
    pub fn retrieve_outcome(&self) -> Retrieval<T> {
        self.retrieve_inner(None)
    }

    pub fn retrieve_outcome_interruptible(&self, token: &InterruptToken) -> Retrieval<T> {
        self.retrieve_inner(Some(token))
    }

    /// Retrieve from async code without blocking a runtime worker.
    ///
    /// The wait runs on the current runtime's blocking pool, so this must be
    /// awaited inside a tokio runtime.
    ///
    /// # Cancel safety
    /// Dropping the returned future (`timeout`, `select!`) before it resolves
    /// does not silently lose a result:
    /// - if the head has not been dequeued yet, it stays queued;
    /// - if the wait is in progress, it is interrupted, and the head is
    ///   counted in `stats().interrupted`;
    /// - if the head finished just as the future was dropped, its outcome is
    ///   counted in `stats().discarded`.
    ///
    /// In the last two cases the head is gone from the queue, as with an
    /// interrupted [`ConcurrentCalculationManager::retrieve_interruptible`].
    pub async fn retrieve_async(&self) -> Retrieval<T> {
        let this = self.clone();
        let token = InterruptToken::new();
        let _interrupt_on_drop = token.interrupt_on_drop();
        let (tx, rx) = oneshot::channel();

        drop(tokio::task::spawn_blocking(move || {
            if tx.is_closed() {
                return;
            }
            let Some((id, retrieval)) = this.next_outcome(Some(&token)) else {
                let _ = tx.send(Retrieval::Empty);
                return;
            };
            let kind = retrieval.kind();
            let failure = retrieval.failure().cloned();
            let delivered = tx.send(retrieval).is_ok();
            if delivered || kind == RetrievalKind::Interrupted {
                this.record_delivery(id, kind, failure.as_ref());
            } else {
                this.inner.counters.record_discarded();
                warn!("{id} finished after its async retrieval was dropped; result discarded");
            }
        }));

        match rx.await {
            Ok(retrieval) => retrieval,
            Err(_) => {
                warn!("async retrieval did not run; the queue was left untouched");
                Retrieval::Interrupted
            }
        }
    }

    fn retrieve_inner(&self, token: Option<&InterruptToken>) -> Retrieval<T> {
        let Some((id, retrieval)) = self.next_outcome(token) else {
            return Retrieval::Empty;
        };
        self.record_delivery(id, retrieval.kind(), retrieval.failure());
        retrieval
    }

    /// Dequeue the head and wait for it. `None` if the queue was empty.
    fn next_outcome(&self, token: Option<&InterruptToken>) -> Option<(TaskId, Retrieval<T>)> {
        let Some(handle) = self.inner.queue.pop_front() else {
            self.inner.counters.record_empty_poll();
            return None;
        };

        let id = handle.id();
        let retrieval = match token {
            Some(token) => handle.wait_interruptible(token),
            None => handle.wait(),
        };
        Some((id, retrieval))
    }

    fn record_delivery(&self, id: TaskId, kind: RetrievalKind, failure: Option<&TaskFailure>) {
        let counters = &self.inner.counters;
        match kind {
            RetrievalKind::Value => {
                counters.record_retrieved();
                debug!("retrieved {id}");
            }
            RetrievalKind::Failed => {
                counters.record_retrieved();
                if let Some(failure) = failure {
                    debug!("retrieved {id} without a value: {failure}");
                }
            }
            RetrievalKind::Interrupted => {
                counters.record_interrupted();
                warn!("wait for {id} interrupted; its result will be discarded");
            }
            RetrievalKind::Empty => {}
        }
    }

    /// Number of handles waiting to be retrieved.
    pub fn pending(&self) -> usize {
        self.inner.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.queue.is_empty()
    }

    pub fn stats(&self) -> ManagerStats {
        self.inner.counters.snapshot(self.inner.queue.len())
    }

    pub fn executor_name(&self) -> &'static str {
        self.inner.executor.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::impls::{InlineExecutor, ManualExecutor, TokioBlockingPool};
    use rand::Rng;
    use rstest::rstest;
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn pooled<T: Send + 'static>() -> ConcurrentCalculationManager<T> {
        ConcurrentCalculationManager::builder()
            .config(PoolConfig::default().with_max_threads(16))
            .build()
            .unwrap()
    }

    fn manual<T: Send + 'static>() -> (Arc<ManualExecutor>, ConcurrentCalculationManager<T>) {
        let executor = Arc::new(ManualExecutor::new());
        let manager = ConcurrentCalculationManager::with_executor(executor.clone());
        (executor, manager)
    }

    #[test]
    fn results_follow_submission_order_under_random_delays() {
        let manager = pooled::<usize>();
        let mut rng = rand::thread_rng();

        for n in 0..20 {
            let delay = Duration::from_millis(rng.gen_range(0..30));
            manager.submit(move || {
                thread::sleep(delay);
                n
            });
        }
        assert_eq!(manager.pending(), 20);

        let results: Vec<usize> = (0..20).filter_map(|_| manager.retrieve()).collect();
        assert_eq!(results, (0..20).collect::<Vec<_>>());
        assert!(manager.is_empty());
    }

    #[rstest]
    #[case::single(1)]
    #[case::few(10)]
    #[case::many(100)]
    fn reverse_completion_does_not_reorder(#[case] n: usize) {
        let (executor, manager) = manual::<usize>();
        for i in 0..n {
            manager.submit(move || i);
        }

        // Newest first.
        while executor.run_last() {}

        let results: Vec<usize> = (0..n).filter_map(|_| manager.retrieve()).collect();
        assert_eq!(results, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn empty_queue_returns_immediately() {
        let manager = pooled::<u8>();

        let start = Instant::now();
        assert_eq!(manager.retrieve(), None);
        assert_eq!(manager.retrieve_outcome(), Retrieval::Empty);
        assert!(start.elapsed() < Duration::from_millis(500));
        assert_eq!(manager.stats().empty_polls, 2);
    }

    #[test]
    fn panicking_computation_yields_no_result() {
        let manager = pooled::<u8>();
        manager.submit(|| panic!("boom"));
        manager.submit(|| 2);

        assert_eq!(manager.retrieve(), None);
        assert_eq!(manager.retrieve(), Some(2));

        let stats = manager.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.retrieved, 2);
    }

    #[test]
    fn tagged_outcome_keeps_failure_cause() {
        let (executor, manager) = manual::<u8>();
        manager.submit(|| panic!("boom"));
        manager.submit_fallible(|| Err::<u8, _>("bad input"));
        manager.submit_fallible(|| Ok::<u8, String>(9));
        executor.run_all();

        assert_eq!(
            manager.retrieve_outcome(),
            Retrieval::Failed(TaskFailure::Panicked("boom".into()))
        );
        assert_eq!(
            manager.retrieve_outcome(),
            Retrieval::Failed(TaskFailure::Errored("bad input".into()))
        );
        assert_eq!(manager.retrieve_outcome(), Retrieval::Value(9));
        assert_eq!(manager.retrieve_outcome(), Retrieval::Empty);
    }

    #[test]
    fn slow_head_blocks_even_when_later_task_is_done() {
        let manager = pooled::<char>();
        let (b_done_tx, b_done_rx) = mpsc::channel();

        let start = Instant::now();
        manager.submit(|| {
            thread::sleep(Duration::from_millis(100));
            'a'
        });
        manager.submit(move || {
            let _ = b_done_tx.send(());
            'b'
        });

        b_done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(manager.retrieve(), Some('a'));
        assert!(start.elapsed() >= Duration::from_millis(100));
        assert_eq!(manager.retrieve(), Some('b'));
    }

    #[test]
    fn concurrent_submitters_and_retrievers_see_each_result_once() {
        let manager = pooled::<u32>();

        let submitters: Vec<_> = (0..8u32)
            .map(|t| {
                let manager = manager.clone();
                thread::spawn(move || {
                    for i in 0..50u32 {
                        let value = t * 1000 + i;
                        manager.submit(move || value);
                    }
                })
            })
            .collect();
        for submitter in submitters {
            submitter.join().unwrap();
        }
        assert_eq!(manager.pending(), 400);

        let retrievers: Vec<_> = (0..4)
            .map(|_| {
                let manager = manager.clone();
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Retrieval::Value(v) = manager.retrieve_outcome() {
                        seen.push(v);
                    }
                    seen
                })
            })
            .collect();

        let mut all: Vec<u32> = Vec::new();
        for retriever in retrievers {
            all.extend(retriever.join().unwrap());
        }

        let expected: HashSet<u32> = (0..8u32)
            .flat_map(|t| (0..50u32).map(move |i| t * 1000 + i))
            .collect();
        assert_eq!(all.len(), 400);
        assert_eq!(all.iter().copied().collect::<HashSet<_>>(), expected);
        assert_eq!(manager.stats().retrieved, 400);
    }

    #[test]
    fn single_submitter_order_survives_concurrent_retrievers() {
        let (executor, manager) = manual::<u32>();
        for i in 0..100u32 {
            manager.submit(move || i);
        }
        executor.run_all();

        let retriever = {
            let manager = manager.clone();
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(v) = manager.retrieve() {
                    seen.push(v);
                }
                seen
            })
        };
        let mut mine = Vec::new();
        while let Some(v) = manager.retrieve() {
            mine.push(v);
        }
        let theirs = retriever.join().unwrap();

        // Each retriever sees an increasing subsequence of the submission order.
        assert!(mine.windows(2).all(|w| w[0] < w[1]));
        assert!(theirs.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(mine.len() + theirs.len(), 100);
    }

    #[test]
    fn interrupted_wait_returns_promptly() {
        let manager = pooled::<u8>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        manager.submit(move || {
            let _ = release_rx.recv();
            1
        });
        manager.submit(|| 2);

        let token = InterruptToken::new();
        let interrupter = {
            let token = token.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                token.interrupt();
            })
        };

        let start = Instant::now();
        assert_eq!(manager.retrieve_interruptible(&token), None);
        assert!(start.elapsed() < Duration::from_secs(2));
        interrupter.join().unwrap();

        // The interrupted head is gone; the next task is still there.
        assert_eq!(manager.pending(), 1);
        assert_eq!(manager.retrieve_interruptible(&token), Some(2));
        assert_eq!(manager.stats().interrupted, 1);

        release_tx.send(()).unwrap();
    }

    #[test]
    fn discarded_job_is_reported_as_abandoned() {
        let (executor, manager) = manual::<u8>();
        manager.submit(|| 1);
        executor.discard_all();

        assert_eq!(
            manager.retrieve_outcome(),
            Retrieval::Failed(TaskFailure::Abandoned)
        );
    }

    #[test]
    fn inline_executor_finishes_before_submit_returns() {
        let manager = ConcurrentCalculationManager::with_executor(Arc::new(InlineExecutor::new()));
        manager.submit(|| "ready");

        let stats = manager.stats();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 1);
        assert!(stats.last_submitted_at.is_some());
        assert_eq!(manager.retrieve(), Some("ready"));
    }

    #[test]
    fn submit_returns_distinct_ids() {
        let (_executor, manager) = manual::<u8>();
        let a = manager.submit(|| 1);
        let b = manager.submit(|| 2);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn async_retrieval_keeps_order() {
        let pool = TokioBlockingPool::from_handle(tokio::runtime::Handle::current());
        let manager = ConcurrentCalculationManager::with_executor(Arc::new(pool));

        manager.submit(|| {
            thread::sleep(Duration::from_millis(30));
            1
        });
        manager.submit(|| 2);

        assert_eq!(manager.retrieve_async().await, Retrieval::Value(1));
        assert_eq!(manager.retrieve_async().await, Retrieval::Value(2));
        assert_eq!(manager.retrieve_async().await, Retrieval::Empty);
    }

    #[tokio::test]
    async fn dropped_async_retrieval_reports_the_lost_head() {
        let pool = TokioBlockingPool::from_handle(tokio::runtime::Handle::current());
        let manager = ConcurrentCalculationManager::with_executor(Arc::new(pool));

        manager.submit(|| {
            thread::sleep(Duration::from_millis(200));
            1
        });
        manager.submit(|| 2);

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), manager.retrieve_async()).await;
        assert!(timed_out.is_err());

        // The abandoned wait is interrupted in the background.
        let deadline = Instant::now() + Duration::from_secs(5);
        while manager.stats().interrupted == 0 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let stats = manager.stats();
        assert_eq!(stats.interrupted, 1);
        assert_eq!(stats.retrieved, 0);
        assert_eq!(stats.discarded, 0);
        assert_eq!(stats.pending, 1);
        assert_eq!(manager.retrieve_async().await, Retrieval::Value(2));
    }
}
