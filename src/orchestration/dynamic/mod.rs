//! # Dynamic Fan-out
//!
//! A dynamic task expands its list parameters into one child workflow instance
//! per combination and succeeds only when every child succeeds.

pub mod execute_function;
pub mod logic_task;
pub mod output;

pub use execute_function::DynamicAsyncTaskExecuteFunction;
pub use logic_task::DynamicLogicTask;
pub use output::DynamicOutput;
