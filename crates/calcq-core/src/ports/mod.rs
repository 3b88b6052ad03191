//! Ports: the capabilities the manager depends on but does not implement.
//!
//! The manager only needs "run this job somewhere, eventually". How many
//! threads exist, how they are reused and when they shut down belongs to the
//! executor implementation (see `impls`).

pub mod executor;

pub use self::executor::{Executor, Job};
