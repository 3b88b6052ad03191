//! calcq-core
//!
//! Ordered concurrent calculation manager: submit zero-argument computations,
//! let a worker pool run them in parallel, and retrieve the results in
//! submission order regardless of which one finishes first.
//!
//! # Modules
//! - **domain**: task ids and retrieval outcomes
//! - **queue**: one-shot pending-result handles and the FIFO that orders them
//! - **ports**: the `Executor` capability the manager depends on
//! - **impls**: executors (tokio blocking pool, inline, manual)
//! - **app**: `ConcurrentCalculationManager`, its builder and stats
//! - **interrupt**: cutting a blocked retrieval short
//! - **config** / **error**: pool configuration and crate errors
//!
//! # Example
//! ```
//! use calcq_core::prelude::*;
//!
//! let manager = ConcurrentCalculationManager::<u64>::new().unwrap();
//! manager.submit(|| {
//!     std::thread::sleep(std::time::Duration::from_millis(20));
//!     1
//! });
//! manager.submit(|| 2);
//!
//! assert_eq!(manager.retrieve(), Some(1));
//! assert_eq!(manager.retrieve(), Some(2));
//! assert_eq!(manager.retrieve(), None);
//! ```

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod impls;
pub mod interrupt;
pub mod ports;
pub mod queue;

pub use app::{ConcurrentCalculationManager, ManagerBuilder, ManagerStats};
pub use config::PoolConfig;
pub use domain::{Retrieval, RetrievalKind, TaskFailure, TaskId};
pub use error::{CalcError, ConfigError};
pub use interrupt::InterruptToken;

pub mod prelude {
    pub use crate::app::{ConcurrentCalculationManager, ManagerBuilder, ManagerStats};
    pub use crate::config::PoolConfig;
    pub use crate::domain::{Retrieval, RetrievalKind, TaskFailure, TaskId};
    pub use crate::impls::{InlineExecutor, ManualExecutor, TokioBlockingPool};
    pub use crate::interrupt::InterruptToken;
    pub use crate::ports::Executor;
}
