#![allow(clippy::doc_markdown)] // Allow technical terms in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Fanout Core
//!
//! Master-side execution core for asynchronous workflow tasks, with a dynamic
//! fan-out task type that spawns one child workflow instance per parameter
//! combination and aggregates the children's states into one verdict.
//!
//! ## Overview
//!
//! An asynchronous task is one whose completion cannot be known at dispatch
//! time. The master starts it once, then probes it periodically until the probe
//! reports a terminal status. Probes never block on the work itself: waiting is
//! expressed by returning `Running`.
//!
//! The dynamic fan-out reduces its child set on every probe:
//!
//! - cancelled parent: `Failed`
//! - no children yet, or some still unfinished: `Running`
//! - every finished child successful: `Success`, otherwise `Failed`
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Execute-function contract, fan-out implementation, poller, ports
//! - [`models`] - Workflow instances, fan-out parameters, commands, properties
//! - [`state_machine`] - Child workflow states and async task statuses
//! - [`config`] - Layered configuration
//! - [`events`] - Lifecycle event publishing
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fanout_core::config::AsyncTaskConfig;
//! use fanout_core::models::{DynamicInputParameter, DynamicParameters, TaskInstance};
//! use fanout_core::orchestration::{
//!     AsyncTaskPoller, ChannelCompletionHandler, DynamicAsyncTaskExecuteFunction,
//!     DynamicLogicTask, InMemorySubWorkflowStore,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AsyncTaskConfig::load()?;
//! let store = Arc::new(InMemorySubWorkflowStore::new());
//! let parameters = DynamicParameters::new(42)
//!     .with_list_parameter(DynamicInputParameter::new("region", "eu,us,ap"));
//!
//! let function = DynamicAsyncTaskExecuteFunction::new(
//!     TaskInstance::new(1, "split_regions", 7, 100),
//!     Arc::new(DynamicLogicTask::new(parameters)),
//!     store.clone(),
//!     store.clone(),
//! )
//! .with_config(&config);
//!
//! let (handler, mut outcomes) = ChannelCompletionHandler::new();
//! let poller = AsyncTaskPoller::new(&config, Arc::new(handler));
//! poller.submit(Arc::new(function)).await?;
//! let outcome = outcomes.recv().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod state_machine;

pub use config::{AsyncTaskConfig, ConfigurationError};
pub use constants::{AsyncTaskExecutionStatus, WorkflowExecutionStatus};
pub use error::{ExecutionError, Result};
pub use events::{EventPublisher, PublishedEvent};
pub use orchestration::{
    AsyncTaskExecuteFunction, AsyncTaskKey, AsyncTaskOutcome, AsyncTaskPoller,
    DynamicAsyncTaskExecuteFunction, TaskCompletionHandler,
};
