//! # Workflow Instance Model
//!
//! Read-only snapshot of a workflow instance as reported by the workflow engine.
//!
//! ## Overview
//!
//! A fan-out task spawns child workflow instances; every probe of the parent
//! task reads a fresh set of these snapshots. The async task core never mutates
//! them: status transitions belong to the engine, and the snapshot is only as
//! current as the query that produced it.
//!
//! ## Command Parameter Blob
//!
//! `command_param` is the JSON object the child was created with. For fan-out
//! children it carries the iteration context:
//!
//! ```json
//! {
//!   "parent_workflow_instance_id": 1,
//!   "parent_task_code": 2,
//!   "dynamic_start_params": { "region": "eu", "tier": "gold" }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::constants::command_keys;
use crate::state_machine::WorkflowExecutionStatus;

/// Snapshot of one workflow instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    pub id: i64,
    pub name: String,
    pub workflow_definition_code: i64,
    pub workflow_definition_version: i32,
    pub state: WorkflowExecutionStatus,
    /// Raw JSON command parameters the instance was created with
    pub command_param: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WorkflowInstance {
    pub fn new(id: i64, name: impl Into<String>, state: WorkflowExecutionStatus) -> Self {
        Self {
            id,
            name: name.into(),
            workflow_definition_code: 0,
            workflow_definition_version: 1,
            state,
            command_param: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_definition(mut self, code: i64, version: i32) -> Self {
        self.workflow_definition_code = code;
        self.workflow_definition_version = version;
        self
    }

    pub fn with_command_param(mut self, command_param: impl Into<String>) -> Self {
        self.command_param = Some(command_param.into());
        self
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn is_success(&self) -> bool {
        self.state.is_success()
    }

    /// Parse the command parameter blob, treating a missing blob as an empty object
    pub fn command_param_value(&self) -> Result<Value, serde_json::Error> {
        match self.command_param.as_deref() {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw),
            _ => Ok(Value::Object(serde_json::Map::new())),
        }
    }

    /// Iteration parameters this child was spawned with.
    ///
    /// Returns an empty map when the blob has no `dynamic_start_params` entry.
    /// Non-string values are rendered as JSON text.
    pub fn dynamic_start_params(&self) -> Result<BTreeMap<String, String>, serde_json::Error> {
        let value = self.command_param_value()?;
        let Some(params) = value.get(command_keys::DYNAMIC_START_PARAMS) else {
            return Ok(BTreeMap::new());
        };

        match params {
            Value::Null => Ok(BTreeMap::new()),
            // Older writers stored the map as an embedded JSON string
            Value::String(embedded) => serde_json::from_str(embedded),
            Value::Object(map) => Ok(map
                .iter()
                .map(|(k, v)| {
                    let rendered = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), rendered)
                })
                .collect()),
            other => Err(serde::de::Error::custom(format!(
                "dynamic_start_params must be an object, got {other}"
            ))),
        }
    }
}
