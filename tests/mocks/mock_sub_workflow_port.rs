//! Mock Sub-Workflow Port
//!
//! Scripted implementation of the query and command ports. Children are held
//! as a fixed snapshot the test sets up front; every call is recorded so tests
//! can assert which queries a probe made.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use fanout_core::models::{
    Command, DynamicInputParameter, DynamicParameters, Property, TaskInstance, WorkflowInstance,
};
use fanout_core::orchestration::{
    CommandDispatchPort, DispatchError, DynamicAsyncTaskExecuteFunction, LogicTaskHandle,
    QueryError, SubWorkflowQueryPort,
};
use fanout_core::WorkflowExecutionStatus;

pub const PARENT_WORKFLOW_INSTANCE_ID: i64 = 1;
pub const TASK_CODE: i64 = 2;

/// Recorded calls and scripted responses
#[derive(Debug, Default, Clone)]
pub struct MockSubWorkflowState {
    pub children: Vec<WorkflowInstance>,
    /// Returned from every query instead of the children when set
    pub query_error: Option<QueryError>,
    pub all_instances_calls: Vec<(i64, i64)>,
    pub filter_finished_calls: usize,
    pub filter_successful_calls: usize,
    pub dispatched: Vec<Command>,
}

#[derive(Debug, Clone, Default)]
pub struct MockSubWorkflowPort {
    state: Arc<Mutex<MockSubWorkflowState>>,
}

impl MockSubWorkflowPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Children with the given states, ids assigned in order from 1
    pub fn with_children(states: &[WorkflowExecutionStatus]) -> Self {
        let port = Self::new();
        port.set_children(states);
        port
    }

    pub fn set_children(&self, states: &[WorkflowExecutionStatus]) {
        let children = states
            .iter()
            .enumerate()
            .map(|(i, state)| {
                let id = i as i64 + 1;
                WorkflowInstance::new(id, format!("child-{id}"), *state)
            })
            .collect();
        self.state.lock().unwrap().children = children;
    }

    pub fn fail_queries_with(&self, error: QueryError) {
        self.state.lock().unwrap().query_error = Some(error);
    }

    pub fn state(&self) -> MockSubWorkflowState {
        self.state.lock().unwrap().clone()
    }

    /// Total number of query-port calls made so far
    pub fn query_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.all_instances_calls.len()
            + state.filter_finished_calls
            + state.filter_successful_calls
    }

    fn scripted_error(&self) -> Result<(), QueryError> {
        match &self.state.lock().unwrap().query_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SubWorkflowQueryPort for MockSubWorkflowPort {
    async fn all_sub_workflow_instances(
        &self,
        parent_workflow_instance_id: i64,
        task_code: i64,
    ) -> Result<Vec<WorkflowInstance>, QueryError> {
        self.state
            .lock()
            .unwrap()
            .all_instances_calls
            .push((parent_workflow_instance_id, task_code));
        self.scripted_error()?;
        Ok(self.state.lock().unwrap().children.clone())
    }

    async fn workflow_output_parameters(
        &self,
        _instance: &WorkflowInstance,
    ) -> Result<Vec<Property>, QueryError> {
        self.scripted_error()?;
        Ok(Vec::new())
    }

    async fn filter_finished(
        &self,
        instances: &[WorkflowInstance],
    ) -> Result<Vec<WorkflowInstance>, QueryError> {
        self.state.lock().unwrap().filter_finished_calls += 1;
        Ok(instances.iter().filter(|i| i.is_finished()).cloned().collect())
    }

    async fn filter_successful(
        &self,
        instances: &[WorkflowInstance],
    ) -> Result<Vec<WorkflowInstance>, QueryError> {
        self.state.lock().unwrap().filter_successful_calls += 1;
        Ok(instances.iter().filter(|i| i.is_success()).cloned().collect())
    }
}

#[async_trait]
impl CommandDispatchPort for MockSubWorkflowPort {
    async fn dispatch(&self, command: Command) -> Result<(), DispatchError> {
        self.state.lock().unwrap().dispatched.push(command);
        Ok(())
    }
}

/// Logic task whose cancellation flag the test controls directly
#[derive(Debug)]
pub struct MockLogicTask {
    parameters: DynamicParameters,
    cancelled: AtomicBool,
}

impl MockLogicTask {
    pub fn new(cancelled: bool) -> Self {
        Self {
            parameters: DynamicParameters::new(42)
                .with_list_parameter(DynamicInputParameter::new("region", "eu,us")),
            cancelled: AtomicBool::new(cancelled),
        }
    }
}

impl LogicTaskHandle for MockLogicTask {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn task_parameters(&self) -> &DynamicParameters {
        &self.parameters
    }
}

/// Execute function wired to the mock port
pub fn execute_function(
    port: &MockSubWorkflowPort,
    cancelled: bool,
) -> DynamicAsyncTaskExecuteFunction {
    DynamicAsyncTaskExecuteFunction::new(
        TaskInstance::new(10, "fan_out", TASK_CODE, PARENT_WORKFLOW_INSTANCE_ID),
        Arc::new(MockLogicTask::new(cancelled)),
        Arc::new(port.clone()),
        Arc::new(port.clone()),
    )
}
