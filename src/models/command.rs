//! # Command Model
//!
//! Commands the async task core hands to the workflow engine's command queue.
//! A fan-out issues one `DynamicGeneration` command per iteration when it
//! starts, then one `StartWaitingInstance` command per child it launches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::models::WorkflowInstance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    /// Create one child workflow instance for a fan-out iteration, parked in `wait_to_run`
    DynamicGeneration,
    /// Launch a child that is parked in `wait_to_run`
    StartWaitingInstance,
}

impl fmt::Display for CommandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DynamicGeneration => write!(f, "dynamic_generation"),
            Self::StartWaitingInstance => write!(f, "start_waiting_instance"),
        }
    }
}

/// Parameters written into the child's command parameter blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandParam {
    pub parent_workflow_instance_id: i64,
    pub parent_task_code: i64,
    #[serde(default)]
    pub dynamic_start_params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: Uuid,
    pub command_type: CommandType,
    pub workflow_definition_code: i64,
    pub workflow_definition_version: i32,
    /// Target child for `StartWaitingInstance`; unset for generation commands
    pub workflow_instance_id: Option<i64>,
    pub command_param: CommandParam,
    pub created_at: DateTime<Utc>,
}

impl Command {
    /// Command creating one fan-out child for the given iteration parameters
    pub fn dynamic_generation(
        parent_workflow_instance_id: i64,
        parent_task_code: i64,
        workflow_definition_code: i64,
        workflow_definition_version: i32,
        dynamic_start_params: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            command_type: CommandType::DynamicGeneration,
            workflow_definition_code,
            workflow_definition_version,
            workflow_instance_id: None,
            command_param: CommandParam {
                parent_workflow_instance_id,
                parent_task_code,
                dynamic_start_params,
            },
            created_at: Utc::now(),
        }
    }

    /// Command launching a parked child, carrying its iteration parameters
    pub fn start_waiting_instance(
        parent_workflow_instance_id: i64,
        parent_task_code: i64,
        child: &WorkflowInstance,
        dynamic_start_params: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            command_type: CommandType::StartWaitingInstance,
            workflow_definition_code: child.workflow_definition_code,
            workflow_definition_version: child.workflow_definition_version,
            workflow_instance_id: Some(child.id),
            command_param: CommandParam {
                parent_workflow_instance_id,
                parent_task_code,
                dynamic_start_params,
            },
            created_at: Utc::now(),
        }
    }
}
