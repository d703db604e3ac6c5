//! Mock collaborators for exercising the async task core without a workflow engine.

#![allow(dead_code)]

pub mod mock_sub_workflow_port;

pub use mock_sub_workflow_port::{
    execute_function, MockLogicTask, MockSubWorkflowPort, MockSubWorkflowState,
    PARENT_WORKFLOW_INSTANCE_ID, TASK_CODE,
};
