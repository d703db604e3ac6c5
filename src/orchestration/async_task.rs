//! # Async Task Execution Contract
//!
//! Uniform, non-blocking interface the master loop uses to drive any task whose
//! completion is decided by polling external state.
//!
//! ## Lifecycle
//!
//! ```text
//! start() ──► probe_status() ──► Running ──► replenish() ──► probe_status() ...
//!                             ├─► Success ──► output_parameters()
//!                             └─► Failed
//! ```
//!
//! `start` is called exactly once per activation. `probe_status` is called on
//! the function's `check_interval` until it returns a terminal status; it must
//! stay side-effect-free so that duplicated or late probes are harmless.
//! `cancel` only raises a flag; the next probe reports `Failed`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::Result;
use crate::models::Property;
use crate::orchestration::errors::{QueryError, TaskStartError};
use crate::state_machine::AsyncTaskExecutionStatus;

/// Identifies one async task activation: the parent workflow instance and the task code within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AsyncTaskKey {
    pub workflow_instance_id: i64,
    pub task_code: i64,
}

impl AsyncTaskKey {
    pub fn new(workflow_instance_id: i64, task_code: i64) -> Self {
        Self {
            workflow_instance_id,
            task_code,
        }
    }
}

impl fmt::Display for AsyncTaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "workflow_instance={}/task_code={}",
            self.workflow_instance_id, self.task_code
        )
    }
}

#[async_trait]
pub trait AsyncTaskExecuteFunction: Send + Sync {
    fn task_key(&self) -> AsyncTaskKey;

    /// Delay between consecutive probes
    fn check_interval(&self) -> Duration;

    /// Issue the side effect that begins the work
    async fn start(&self) -> std::result::Result<(), TaskStartError>;

    /// Derive the current status from external state.
    ///
    /// Query failures are returned as errors and never folded into `Failed`.
    async fn probe_status(&self) -> std::result::Result<AsyncTaskExecutionStatus, QueryError>;

    /// Request cooperative cancellation
    fn cancel(&self);

    /// Called by the master after a probe returned `Running`
    async fn replenish(&self) -> Result<()> {
        Ok(())
    }

    /// Called by the master once after a probe returned `Success`
    async fn output_parameters(&self) -> Result<Vec<Property>> {
        Ok(Vec::new())
    }
}
