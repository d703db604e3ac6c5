//! # In-Memory Sub-Workflow Store
//!
//! Thread-safe stand-in for the workflow engine, used by tests and the
//! simulator binary.
//!
//! ## Features
//!
//! - **Query Port**: serves snapshots of children grouped by `(parent, task code)`
//! - **Command Port**: generation commands materialise children in `wait_to_run`,
//!   start commands move a parked child to `running_execution`
//! - **Fault Injection**: the store can be made unavailable for queries, made
//!   to reject commands, or made to accept only a fixed number of further commands

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::models::{Command, CommandType, Property, WorkflowInstance};
use crate::orchestration::async_task::AsyncTaskKey;
use crate::orchestration::errors::{DispatchError, QueryError};
use crate::orchestration::ports::{CommandDispatchPort, SubWorkflowQueryPort};
use crate::state_machine::WorkflowExecutionStatus;

#[derive(Debug)]
pub struct InMemorySubWorkflowStore {
    instances: DashMap<i64, WorkflowInstance>,
    /// Child ids per fan-out, in creation order
    children_by_parent: DashMap<AsyncTaskKey, Vec<i64>>,
    output_parameters: DashMap<i64, Vec<Property>>,
    dispatched: Mutex<Vec<Command>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
    reject_dispatch: AtomicBool,
    /// Commands still accepted before dispatch starts failing; `None` is unlimited
    dispatch_allowance: Mutex<Option<usize>>,
}

impl Default for InMemorySubWorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySubWorkflowStore {
    pub fn new() -> Self {
        Self {
            instances: DashMap::new(),
            children_by_parent: DashMap::new(),
            output_parameters: DashMap::new(),
            dispatched: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            unavailable: AtomicBool::new(false),
            reject_dispatch: AtomicBool::new(false),
            dispatch_allowance: Mutex::new(None),
        }
    }

    fn register(&self, key: AsyncTaskKey, instance: WorkflowInstance) -> i64 {
        let id = instance.id;
        self.instances.insert(id, instance);
        self.children_by_parent.entry(key).or_default().push(id);
        id
    }

    /// Add a child directly, bypassing the command port. Returns the child id.
    pub fn insert_child(
        &self,
        parent_workflow_instance_id: i64,
        task_code: i64,
        state: WorkflowExecutionStatus,
    ) -> i64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let instance = WorkflowInstance::new(
            id,
            format!("{parent_workflow_instance_id}-{task_code}-{id}"),
            state,
        );
        self.register(AsyncTaskKey::new(parent_workflow_instance_id, task_code), instance)
    }

    /// Add a child carrying a raw command parameter blob, as written by the engine
    pub fn insert_child_with_command_param(
        &self,
        parent_workflow_instance_id: i64,
        task_code: i64,
        state: WorkflowExecutionStatus,
        command_param: impl Into<String>,
    ) -> i64 {
        let id = self.insert_child(parent_workflow_instance_id, task_code, state);
        if let Some(mut instance) = self.instances.get_mut(&id) {
            instance.command_param = Some(command_param.into());
        }
        id
    }

    /// Move a child to a new state; returns false when the id is unknown
    pub fn set_state(&self, id: i64, state: WorkflowExecutionStatus) -> bool {
        match self.instances.get_mut(&id) {
            Some(mut instance) => {
                instance.state = state;
                true
            }
            None => false,
        }
    }

    pub fn set_output_parameters(&self, id: i64, properties: Vec<Property>) {
        self.output_parameters.insert(id, properties);
    }

    /// Make every query fail with `QueryError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make every dispatch fail with `DispatchError::Unavailable`
    pub fn reject_dispatch(&self, reject: bool) {
        self.reject_dispatch.store(reject, Ordering::SeqCst);
    }

    /// Accept `remaining` more commands, then fail every dispatch; `None` lifts the limit
    pub fn limit_dispatch(&self, remaining: Option<usize>) {
        *self.dispatch_allowance.lock() = remaining;
    }

    fn take_dispatch_allowance(&self) -> bool {
        match self.dispatch_allowance.lock().as_mut() {
            Some(0) => false,
            Some(remaining) => {
                *remaining -= 1;
                true
            }
            None => true,
        }
    }

    /// Snapshot of the children of one fan-out, in creation order
    pub fn children(
        &self,
        parent_workflow_instance_id: i64,
        task_code: i64,
    ) -> Vec<WorkflowInstance> {
        let ids = self
            .children_by_parent
            .get(&AsyncTaskKey::new(parent_workflow_instance_id, task_code))
            .map(|ids| ids.clone())
            .unwrap_or_default();

        ids.iter()
            .filter_map(|id| self.instances.get(id).map(|i| i.clone()))
            .collect()
    }

    pub fn dispatched_commands(&self) -> Vec<Command> {
        self.dispatched.lock().clone()
    }

    fn ensure_available(&self, operation: &str) -> Result<(), QueryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueryError::Unavailable(format!(
                "in-memory store offline during {operation}"
            )));
        }
        Ok(())
    }

    fn generate_child(&self, command: &Command) -> Result<(), DispatchError> {
        let param = &command.command_param;
        let blob = serde_json::to_string(param).map_err(|e| DispatchError::Rejected {
            command_type: command.command_type.to_string(),
            reason: e.to_string(),
        })?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let instance = WorkflowInstance::new(
            id,
            format!(
                "{}-{}-{id}",
                param.parent_workflow_instance_id, param.parent_task_code
            ),
            WorkflowExecutionStatus::WaitToRun,
        )
        .with_definition(
            command.workflow_definition_code,
            command.workflow_definition_version,
        )
        .with_command_param(blob);

        self.register(
            AsyncTaskKey::new(param.parent_workflow_instance_id, param.parent_task_code),
            instance,
        );
        Ok(())
    }

    fn launch_child(&self, command: &Command) -> Result<(), DispatchError> {
        let rejected = |reason: String| DispatchError::Rejected {
            command_type: command.command_type.to_string(),
            reason,
        };

        let id = command
            .workflow_instance_id
            .ok_or_else(|| rejected("start command without target instance".to_string()))?;
        let mut instance = self
            .instances
            .get_mut(&id)
            .ok_or_else(|| rejected(format!("unknown workflow instance {id}")))?;

        if !instance.state.is_wait_to_run() {
            return Err(rejected(format!(
                "workflow instance {id} is {}, not wait_to_run",
                instance.state
            )));
        }
        instance.state = WorkflowExecutionStatus::RunningExecution;
        Ok(())
    }
}

#[async_trait]
impl SubWorkflowQueryPort for InMemorySubWorkflowStore {
    async fn all_sub_workflow_instances(
        &self,
        parent_workflow_instance_id: i64,
        task_code: i64,
    ) -> Result<Vec<WorkflowInstance>, QueryError> {
        self.ensure_available("all_sub_workflow_instances")?;
        Ok(self.children(parent_workflow_instance_id, task_code))
    }

    async fn workflow_output_parameters(
        &self,
        instance: &WorkflowInstance,
    ) -> Result<Vec<Property>, QueryError> {
        self.ensure_available("workflow_output_parameters")?;
        if !self.instances.contains_key(&instance.id) {
            return Err(QueryError::InstanceNotFound(instance.id));
        }
        Ok(self
            .output_parameters
            .get(&instance.id)
            .map(|p| p.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl CommandDispatchPort for InMemorySubWorkflowStore {
    async fn dispatch(&self, command: Command) -> Result<(), DispatchError> {
        if self.reject_dispatch.load(Ordering::SeqCst) || !self.take_dispatch_allowance() {
            return Err(DispatchError::Unavailable(
                "in-memory command queue rejecting commands".to_string(),
            ));
        }

        match command.command_type {
            CommandType::DynamicGeneration => self.generate_child(&command)?,
            CommandType::StartWaitingInstance => self.launch_child(&command)?,
        }

        self.dispatched.lock().push(command);
        Ok(())
    }
}
