//! Executor port: runs submitted jobs asynchronously.
//!
//! # 学習ポイント
//! - manager は具体的なスレッドプールではなく trait に依存する
//! - テストでは `ManualExecutor` に差し替えて実行順序を制御できる

/// A unit of work handed to an executor.
///
/// The manager wraps each computation so that the job itself never panics and
/// always resolves its pending result, even when dropped unrun.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Executor runs jobs on some thread, eventually, exactly once.
///
/// # Contract
/// - `execute` returns without waiting for the job, unless the executor runs
///   jobs on the calling thread (see `InlineExecutor`).
/// - A job may also be held until something drives it (see `ManualExecutor`).
/// - Dropping a job without running it is allowed; the manager reports it as
///   an abandoned computation.
pub trait Executor: Send + Sync {
    fn execute(&self, job: Job);

    /// Short name for logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
