// State definitions for the async task core
//
// Child workflow instance states are read from the workflow engine; the parent
// async task status is derived on every probe and never stored.

pub mod states;

pub use states::{AsyncTaskExecutionStatus, WorkflowExecutionStatus};
