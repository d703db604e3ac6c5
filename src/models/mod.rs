//! # Models
//!
//! Value types exchanged with the workflow engine. None of these are persisted
//! by this crate; they are snapshots read through ports or commands written
//! through them.

pub mod command;
pub mod dynamic_parameters;
pub mod property;
pub mod task_instance;
pub mod workflow_instance;

pub use command::{Command, CommandParam, CommandType};
pub use dynamic_parameters::{DynamicInputParameter, DynamicParameters};
pub use property::{DataType, Direct, Property};
pub use task_instance::TaskInstance;
pub use workflow_instance::WorkflowInstance;
