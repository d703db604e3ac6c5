use serde::{Deserialize, Serialize};

/// The task instance a fan-out runs under.
///
/// `(workflow_instance_id, task_code)` identifies the fan-out; `name` is used
/// to label the aggregated output property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInstance {
    pub id: i64,
    pub name: String,
    pub task_code: i64,
    pub workflow_instance_id: i64,
}

impl TaskInstance {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        task_code: i64,
        workflow_instance_id: i64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            task_code,
            workflow_instance_id,
        }
    }
}
