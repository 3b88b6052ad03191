//! Retrieval outcomes.
//!
//! `retrieve()` reports a single "no result" sentinel for an empty queue, a
//! failed computation and an interrupted wait alike. [`Retrieval`] keeps those
//! cases apart for callers that care; [`Retrieval::into_option`] collapses them
//! back into the sentinel.

use std::any::Any;

use serde::{Deserialize, Serialize};

/// Why a computation did not produce a value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskFailure {
    /// The computation panicked on its worker.
    #[error("computation panicked: {0}")]
    Panicked(String),

    /// A fallible computation returned `Err`.
    #[error("computation returned an error: {0}")]
    Errored(String),

    /// The executor dropped the job without running it.
    #[error("computation was dropped before it ran")]
    Abandoned,
}

impl TaskFailure {
    /// Build a failure from a payload caught by `catch_unwind`.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        TaskFailure::Panicked(message)
    }
}

/// Result of one retrieval call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retrieval<T> {
    /// The head computation completed with a value.
    Value(T),

    /// The head computation failed.
    Failed(TaskFailure),

    /// The wait was interrupted before the head computation finished.
    /// The handle is gone; its eventual value is discarded.
    Interrupted,

    /// Nothing was queued.
    Empty,
}

impl<T> Retrieval<T> {
    /// Collapse into the "value or no result" view.
    pub fn into_option(self) -> Option<T> {
        match self {
            Retrieval::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn kind(&self) -> RetrievalKind {
        match self {
            Retrieval::Value(_) => RetrievalKind::Value,
            Retrieval::Failed(_) => RetrievalKind::Failed,
            Retrieval::Interrupted => RetrievalKind::Interrupted,
            Retrieval::Empty => RetrievalKind::Empty,
        }
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        match self {
            Retrieval::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Retrieval<U> {
        match self {
            Retrieval::Value(value) => Retrieval::Value(f(value)),
            Retrieval::Failed(failure) => Retrieval::Failed(failure),
            Retrieval::Interrupted => Retrieval::Interrupted,
            Retrieval::Empty => Retrieval::Empty,
        }
    }
}

impl<T> From<Retrieval<T>> for Option<T> {
    fn from(retrieval: Retrieval<T>) -> Self {
        retrieval.into_option()
    }
}

/// Payload-free classification of a [`Retrieval`], for reports.
///
/// Serialized as SCREAMING_SNAKE_CASE: VALUE / FAILED / INTERRUPTED / EMPTY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetrievalKind {
    Value,
    Failed,
    Interrupted,
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::failed(Retrieval::Failed(TaskFailure::Abandoned))]
    #[case::interrupted(Retrieval::Interrupted)]
    #[case::empty(Retrieval::Empty)]
    fn every_non_value_collapses_to_none(#[case] retrieval: Retrieval<u32>) {
        assert_eq!(retrieval.into_option(), None);
    }

    #[test]
    fn value_collapses_to_some() {
        assert_eq!(Retrieval::Value(7).into_option(), Some(7));
        let as_option: Option<u32> = Retrieval::Value(7).into();
        assert_eq!(as_option, Some(7));
    }

    #[test]
    fn kind_serializes_as_required_names() {
        let s = serde_json::to_string(&RetrievalKind::Value).unwrap();
        assert_eq!(s, "\"VALUE\"");

        let s = serde_json::to_string(&RetrievalKind::Interrupted).unwrap();
        assert_eq!(s, "\"INTERRUPTED\"");
    }

    #[test]
    fn panic_payloads_keep_their_message() {
        let from_str = TaskFailure::from_panic(Box::new("boom"));
        assert_eq!(from_str, TaskFailure::Panicked("boom".to_string()));

        let from_string = TaskFailure::from_panic(Box::new(String::from("bang")));
        assert_eq!(from_string, TaskFailure::Panicked("bang".to_string()));

        let opaque = TaskFailure::from_panic(Box::new(42_u8));
        assert!(matches!(opaque, TaskFailure::Panicked(_)));
    }

    #[test]
    fn map_keeps_the_variant() {
        assert_eq!(Retrieval::Value(2).map(|v| v * 10), Retrieval::Value(20));
        assert_eq!(Retrieval::<u32>::Empty.map(|v| v * 10), Retrieval::Empty);
        assert_eq!(
            Retrieval::<u32>::Failed(TaskFailure::Errored("x".into())).failure(),
            Some(&TaskFailure::Errored("x".into()))
        );
    }
}
