//! App - the manager and its wiring.
//!
//! # Components
//! - **ConcurrentCalculationManager**: submission and ordered retrieval
//! - **ManagerBuilder**: picks the executor, validates config
//! - **ManagerStats**: counters snapshot

pub mod builder;
pub mod manager;
pub mod status;

pub use self::builder::ManagerBuilder;
pub use self::manager::ConcurrentCalculationManager;
pub use self::status::ManagerStats;
