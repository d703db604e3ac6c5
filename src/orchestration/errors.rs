//! Errors raised at the orchestration boundary: the sub-workflow query port,
//! the command dispatch port, and task activation.

use thiserror::Error;

/// A sub-workflow query could not be answered
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("Sub-workflow store unavailable: {0}")]
    Unavailable(String),

    #[error("Query {operation} failed: {reason}")]
    Backend { operation: String, reason: String },

    #[error("Workflow instance not found: {0}")]
    InstanceNotFound(i64),
}

impl QueryError {
    pub fn backend(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Backend {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

/// The command port refused or failed to accept a command
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("Command {command_type} rejected: {reason}")]
    Rejected {
        command_type: String,
        reason: String,
    },

    #[error("Command queue unavailable: {0}")]
    Unavailable(String),
}

/// An async task activation could not be started
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskStartError {
    #[error("Invalid fan-out parameters: {0}")]
    InvalidParameters(String),

    #[error("Fan-out for workflow instance {workflow_instance_id} task {task_code} expands to zero iterations")]
    NoIterations {
        workflow_instance_id: i64,
        task_code: i64,
    },

    #[error("Failed to dispatch fan-out command: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("Failed to inspect existing sub-workflows: {0}")]
    Query(#[from] QueryError),
}
