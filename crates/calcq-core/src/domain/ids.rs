//! Task identifiers.
//!
//! Every submission gets a ULID-based [`TaskId`]. ULIDs sort by creation time,
//! which makes log lines from racing submitters easy to line up afterwards.
//!
//! # 学習ポイント
//! - newtype パターン（`TaskId(Ulid)`）で ID を型として区別する
//! - `#[repr(transparent)]` でラッパーのコストをゼロにする
//! - Display でプレフィックス付きの表示（`task-<ULID>`）

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Identifier of one submitted computation.
///
/// Rendered as `task-<ULID>` in logs.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Ulid);

impl TaskId {
    /// Generate a fresh id from the current time.
    pub fn generate() -> Self {
        Self(Ulid::new())
    }

    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for TaskId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task-{}", self.0)
    }
}
