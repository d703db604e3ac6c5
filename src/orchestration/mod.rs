//! # Orchestration
//!
//! Master-side machinery for asynchronous tasks: tasks whose completion is not
//! known when they are dispatched and has to be discovered by polling.
//!
//! ## Core Components
//!
//! - **AsyncTaskExecuteFunction**: start / probe / cancel contract for one async task
//! - **DynamicAsyncTaskExecuteFunction**: fan-out over parameter combinations, with
//!   child states reduced to one parent status
//! - **AsyncTaskPoller**: drives many execute functions concurrently and reports outcomes
//! - **Ports**: query, command, and logic-task collaborators supplied by the engine
//! - **InMemorySubWorkflowStore**: in-process implementation of both engine ports

pub mod async_task;
pub mod async_task_poller;
pub mod dynamic;
pub mod errors;
pub mod in_memory;
pub mod ports;

pub use async_task::{AsyncTaskExecuteFunction, AsyncTaskKey};
pub use async_task_poller::{
    AsyncTaskOutcome, AsyncTaskPoller, ChannelCompletionHandler, TaskCompletionHandler,
};
pub use dynamic::{DynamicAsyncTaskExecuteFunction, DynamicLogicTask, DynamicOutput};
pub use errors::{DispatchError, QueryError, TaskStartError};
pub use in_memory::InMemorySubWorkflowStore;
pub use ports::{CommandDispatchPort, LogicTaskHandle, SubWorkflowQueryPort};
