//! Domain model: task identifiers and retrieval outcomes.

pub mod ids;
pub mod outcome;

pub use ids::TaskId;
pub use outcome::{Retrieval, RetrievalKind, TaskFailure};
