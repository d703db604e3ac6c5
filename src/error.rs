//! Crate-level error type.
//!
//! Each concern owns a narrow error enum (`QueryError`, `DispatchError`,
//! `TaskStartError`); `ExecutionError` rolls them up for callers that drive
//! the whole lifecycle. Configuration loading keeps its own `ConfigurationError`.

use thiserror::Error;

use crate::orchestration::async_task::AsyncTaskKey;
use crate::orchestration::errors::{DispatchError, QueryError, TaskStartError};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Task start error: {0}")]
    TaskStart(#[from] TaskStartError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Async task already in flight: {0}")]
    AlreadyInFlight(AsyncTaskKey),

    #[error("Async task poller is shut down")]
    PollerStopped,
}

impl ExecutionError {
    /// Whether the failure came from the sub-workflow store rather than from the task itself
    pub fn is_query_error(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}

pub type Result<T> = std::result::Result<T, ExecutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_errors_are_distinguishable() {
        let err: ExecutionError = QueryError::Unavailable("store offline".to_string()).into();
        assert!(err.is_query_error());
        assert_eq!(err.to_string(), "Query error: Sub-workflow store unavailable: store offline");

        let err: ExecutionError = DispatchError::Unavailable("queue full".to_string()).into();
        assert!(!err.is_query_error());

        let err = ExecutionError::AlreadyInFlight(AsyncTaskKey::new(1, 2));
        assert_eq!(
            err.to_string(),
            "Async task already in flight: workflow_instance=1/task_code=2"
        );
    }
}
