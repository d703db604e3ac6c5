//! # System Constants
//!
//! Constants that define the operational boundaries of the async task core:
//! lifecycle event names, command parameter keys, and shipped defaults.

// Re-export state types for convenience
pub use crate::state_machine::{AsyncTaskExecutionStatus, WorkflowExecutionStatus};

/// Lifecycle events published by the async task poller
pub mod events {
    pub const ASYNC_TASK_STARTED: &str = "async_task.started";
    pub const ASYNC_TASK_START_FAILED: &str = "async_task.start_failed";
    pub const ASYNC_TASK_PROBE_ERROR: &str = "async_task.probe_error";
    pub const ASYNC_TASK_SUCCEEDED: &str = "async_task.succeeded";
    pub const ASYNC_TASK_FAILED: &str = "async_task.failed";
    pub const ASYNC_TASK_CANCEL_REQUESTED: &str = "async_task.cancel_requested";
}

/// Keys used inside a child workflow instance's command parameter blob
pub mod command_keys {
    pub const DYNAMIC_START_PARAMS: &str = "dynamic_start_params";
}

/// Defaults shared by configuration and fan-out parameters
pub mod defaults {
    /// Upper bound on children a single fan-out may generate
    pub const MAX_NUM_OF_SUB_WORKFLOW: usize = 1024;
    /// Separator applied to list parameters that do not declare one
    pub const LIST_PARAMETER_SEPARATOR: &str = ",";
    pub const CHECK_INTERVAL_MS: u64 = 10_000;
    pub const MAX_CONSECUTIVE_PROBE_ERRORS: u32 = 3;
    pub const EVENT_CHANNEL_CAPACITY: usize = 1000;
    pub const DISPATCH_CONCURRENCY: usize = 16;
}

/// Property name prefix for the aggregated fan-out output, `dynamic.out(<task name>)`
pub const DYNAMIC_OUTPUT_PROPERTY_PREFIX: &str = "dynamic.out";

/// Build the output property name for a fan-out task
pub fn dynamic_output_property_name(task_name: &str) -> String {
    format!("{DYNAMIC_OUTPUT_PROPERTY_PREFIX}({task_name})")
}
