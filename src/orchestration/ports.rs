//! # External Collaborator Ports
//!
//! Interfaces the async task core consumes from the rest of the master node.
//!
//! - [`SubWorkflowQueryPort`]: read-only access to child workflow instances
//! - [`LogicTaskHandle`]: cancellation flag and parameters of the owning logic task
//! - [`CommandDispatchPort`]: the workflow engine's command queue
//!
//! Query operations return value snapshots. Implementations must not hand out
//! references into live engine state; each call reflects the store at the time
//! of the call.

use async_trait::async_trait;

use crate::models::{Command, DynamicParameters, Property, WorkflowInstance};
use crate::orchestration::errors::{DispatchError, QueryError};

/// Lookup and partitioning of the children spawned by one fan-out.
///
/// The `filter_*` operations have default implementations that partition by the
/// snapshot's own state. Stores that track finishedness differently (for
/// example, by consulting a separate completion table) can override them.
#[async_trait]
pub trait SubWorkflowQueryPort: Send + Sync {
    /// All children created for `(parent_workflow_instance_id, task_code)`, in creation order
    async fn all_sub_workflow_instances(
        &self,
        parent_workflow_instance_id: i64,
        task_code: i64,
    ) -> Result<Vec<WorkflowInstance>, QueryError>;

    /// Output variables a finished child produced
    async fn workflow_output_parameters(
        &self,
        instance: &WorkflowInstance,
    ) -> Result<Vec<Property>, QueryError>;

    async fn filter_finished(
        &self,
        instances: &[WorkflowInstance],
    ) -> Result<Vec<WorkflowInstance>, QueryError> {
        Ok(instances.iter().filter(|i| i.is_finished()).cloned().collect())
    }

    async fn filter_successful(
        &self,
        instances: &[WorkflowInstance],
    ) -> Result<Vec<WorkflowInstance>, QueryError> {
        Ok(instances.iter().filter(|i| i.is_success()).cloned().collect())
    }

    async fn filter_running(
        &self,
        instances: &[WorkflowInstance],
    ) -> Result<Vec<WorkflowInstance>, QueryError> {
        Ok(instances
            .iter()
            .filter(|i| i.state.is_running())
            .cloned()
            .collect())
    }

    async fn filter_wait_to_run(
        &self,
        instances: &[WorkflowInstance],
    ) -> Result<Vec<WorkflowInstance>, QueryError> {
        Ok(instances
            .iter()
            .filter(|i| i.state.is_wait_to_run())
            .cloned()
            .collect())
    }
}

/// The logic task that owns a fan-out.
///
/// Cancellation is a one-way latch: once `is_cancelled` returns true it must
/// keep returning true.
pub trait LogicTaskHandle: Send + Sync {
    fn is_cancelled(&self) -> bool;

    /// Request cooperative cancellation
    fn cancel(&self);

    fn task_parameters(&self) -> &DynamicParameters;
}

/// Sink for commands that create or launch child workflow instances
#[async_trait]
pub trait CommandDispatchPort: Send + Sync {
    async fn dispatch(&self, command: Command) -> Result<(), DispatchError>;
}
