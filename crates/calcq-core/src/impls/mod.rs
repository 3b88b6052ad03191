//! Executor implementations.
//!
//! # Included
//! - **TokioBlockingPool**: default pool; grows on demand, reclaims idle threads.
//! - **InlineExecutor**: runs the job on the submitting thread.
//! - **ManualExecutor**: holds jobs until a test runs them, in any order.
//!
//! どの実装も `Executor` trait を満たすので、`ManagerBuilder::executor` で
//! 差し替えられます。

pub mod inline;
pub mod manual;
pub mod tokio_pool;

pub use self::inline::InlineExecutor;
pub use self::manual::ManualExecutor;
pub use self::tokio_pool::TokioBlockingPool;
