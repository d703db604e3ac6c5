//! # Dynamic Async Task Execute Function
//!
//! Fan-out implementation of [`AsyncTaskExecuteFunction`]: spawns one child
//! workflow instance per parameter combination and reduces the children's
//! states into one status for the parent task.
//!
//! ## Aggregation
//!
//! Every probe re-derives the verdict from a fresh snapshot of the child set:
//!
//! 1. Cancelled logic task: `Failed`, before any query is made.
//! 2. No children observed: `Running`.
//! 3. Fewer finished children than children: `Running`.
//! 4. Every finished child successful: `Success`; otherwise `Failed`.
//!
//! Nothing about the children is cached between probes, so missed or repeated
//! probes cannot skew the result. A single finished-but-unsuccessful child fails
//! the whole fan-out.
//!
//! ## Launch Throttling
//!
//! Children are created parked in `wait_to_run`. After each `Running` probe the
//! master calls [`replenish`](AsyncTaskExecuteFunction::replenish), which
//! launches parked children while the number of running ones stays within the
//! fan-out's degree of parallelism.

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::config::AsyncTaskConfig;
use crate::constants::{defaults, dynamic_output_property_name};
use crate::error::Result;
use crate::models::{Command, Property, TaskInstance, WorkflowInstance};
use crate::orchestration::async_task::{AsyncTaskExecuteFunction, AsyncTaskKey};
use crate::orchestration::dynamic::output::DynamicOutput;
use crate::orchestration::errors::{QueryError, TaskStartError};
use crate::orchestration::ports::{CommandDispatchPort, LogicTaskHandle, SubWorkflowQueryPort};
use crate::state_machine::AsyncTaskExecutionStatus;

pub struct DynamicAsyncTaskExecuteFunction {
    key: AsyncTaskKey,
    task_instance: TaskInstance,
    logic_task: Arc<dyn LogicTaskHandle>,
    sub_workflows: Arc<dyn SubWorkflowQueryPort>,
    commands: Arc<dyn CommandDispatchPort>,
    check_interval: Duration,
    dispatch_concurrency: usize,
    /// Cap applied when the fan-out parameters leave `max_num_of_sub_workflow` at 0
    default_max_sub_workflows: usize,
    /// Children this function already issued a start command for
    launched: Mutex<HashSet<i64>>,
}

impl DynamicAsyncTaskExecuteFunction {
    pub fn new(
        task_instance: TaskInstance,
        logic_task: Arc<dyn LogicTaskHandle>,
        sub_workflows: Arc<dyn SubWorkflowQueryPort>,
        commands: Arc<dyn CommandDispatchPort>,
    ) -> Self {
        let key = AsyncTaskKey::new(task_instance.workflow_instance_id, task_instance.task_code);
        Self {
            key,
            task_instance,
            logic_task,
            sub_workflows,
            commands,
            check_interval: Duration::from_millis(defaults::CHECK_INTERVAL_MS),
            dispatch_concurrency: defaults::DISPATCH_CONCURRENCY,
            default_max_sub_workflows: defaults::MAX_NUM_OF_SUB_WORKFLOW,
            launched: Mutex::new(HashSet::new()),
        }
    }

    /// Apply probe cadence and dispatch fan-out width from configuration
    pub fn with_config(mut self, config: &AsyncTaskConfig) -> Self {
        self.check_interval = config.check_interval();
        self.dispatch_concurrency = config.dispatch_concurrency.max(1);
        self.default_max_sub_workflows = config.default_max_sub_workflows;
        self
    }

    /// Number of children this function has launched so far
    pub fn launched_count(&self) -> usize {
        self.launched.lock().len()
    }

    /// Parameter groups this fan-out must spawn one child for, after filter and cap
    fn parameter_groups(&self) -> std::result::Result<Vec<ParameterGroup>, TaskStartError> {
        let mut parameters = self.logic_task.task_parameters().clone();
        parameters.validate()?;
        if parameters.max_num_of_sub_workflow == 0 {
            parameters.max_num_of_sub_workflow = self.default_max_sub_workflows;
        }

        let groups = parameters.generate_parameter_groups();
        if groups.is_empty() {
            return Err(TaskStartError::NoIterations {
                workflow_instance_id: self.key.workflow_instance_id,
                task_code: self.key.task_code,
            });
        }
        Ok(groups)
    }

    fn generation_command(&self, group: ParameterGroup) -> Command {
        let parameters = self.logic_task.task_parameters();
        Command::dynamic_generation(
            self.key.workflow_instance_id,
            self.key.task_code,
            parameters.workflow_definition_code,
            parameters.workflow_definition_version,
            group,
        )
    }
}

type ParameterGroup = BTreeMap<String, String>;

/// Groups with no existing child spawned from them.
///
/// Matching is by multiset, so a group listed twice needs two children.
/// Children whose command parameters cannot be read match nothing.
fn missing_groups(
    groups: Vec<ParameterGroup>,
    existing: &[WorkflowInstance],
) -> Vec<ParameterGroup> {
    let mut spawned: HashMap<ParameterGroup, usize> = HashMap::new();
    for child in existing {
        match child.dynamic_start_params() {
            Ok(params) => *spawned.entry(params).or_default() += 1,
            Err(e) => warn!(
                child_id = child.id,
                error = %e,
                "Ignoring sub-workflow instance with unreadable command parameters"
            ),
        }
    }

    groups
        .into_iter()
        .filter(|group| match spawned.get_mut(group) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        })
        .collect()
}

#[async_trait]
impl AsyncTaskExecuteFunction for DynamicAsyncTaskExecuteFunction {
    fn task_key(&self) -> AsyncTaskKey {
        self.key
    }

    fn check_interval(&self) -> Duration {
        self.check_interval
    }

    #[instrument(skip(self), fields(key = %self.key))]
    async fn start(&self) -> std::result::Result<(), TaskStartError> {
        let groups = self.parameter_groups()?;
        let expected = groups.len();

        let existing = self
            .sub_workflows
            .all_sub_workflow_instances(self.key.workflow_instance_id, self.key.task_code)
            .await?;
        let missing = missing_groups(groups, &existing);
        if missing.is_empty() {
            info!(
                existing_children = existing.len(),
                "Fan-out children already exist, resuming without generating new ones"
            );
            return Ok(());
        }
        if !existing.is_empty() {
            info!(
                existing_children = existing.len(),
                missing_children = missing.len(),
                "Resuming partially generated fan-out"
            );
        }

        let total = missing.len();
        let commands = missing.into_iter().map(|group| self.generation_command(group));
        stream::iter(commands.map(|command| self.commands.dispatch(command)))
            .buffer_unordered(self.dispatch_concurrency)
            .try_collect::<Vec<()>>()
            .await?;

        info!(
            children = total,
            expected = expected,
            task_name = %self.task_instance.name,
            "Dispatched fan-out generation commands"
        );
        Ok(())
    }

    #[instrument(skip(self), fields(key = %self.key))]
    async fn probe_status(&self) -> std::result::Result<AsyncTaskExecutionStatus, QueryError> {
        if self.logic_task.is_cancelled() {
            info!("Logic task cancelled, fan-out failed");
            return Ok(AsyncTaskExecutionStatus::Failed);
        }

        let all = self
            .sub_workflows
            .all_sub_workflow_instances(self.key.workflow_instance_id, self.key.task_code)
            .await?;
        if all.is_empty() {
            debug!("No sub-workflow instances observed yet");
            return Ok(AsyncTaskExecutionStatus::Running);
        }

        let finished = self.sub_workflows.filter_finished(&all).await?;
        if finished.len() < all.len() {
            debug!(
                total = all.len(),
                finished = finished.len(),
                "Sub-workflow instances still in flight"
            );
            return Ok(AsyncTaskExecutionStatus::Running);
        }

        let successful = self.sub_workflows.filter_successful(&finished).await?;
        if successful.len() == finished.len() {
            info!(total = all.len(), "All sub-workflow instances succeeded");
            Ok(AsyncTaskExecutionStatus::Success)
        } else {
            info!(
                total = all.len(),
                successful = successful.len(),
                failed = finished.len() - successful.len(),
                "Sub-workflow instances finished with failures"
            );
            Ok(AsyncTaskExecutionStatus::Failed)
        }
    }

    fn cancel(&self) {
        info!(key = %self.key, "Cancelling fan-out");
        self.logic_task.cancel();
    }

    #[instrument(skip(self), fields(key = %self.key))]
    async fn replenish(&self) -> Result<()> {
        if self.logic_task.is_cancelled() {
            return Ok(());
        }

        let all = self
            .sub_workflows
            .all_sub_workflow_instances(self.key.workflow_instance_id, self.key.task_code)
            .await?;
        let running = self.sub_workflows.filter_running(&all).await?;
        let waiting = self.sub_workflows.filter_wait_to_run(&all).await?;

        let launched = self.launched.lock().clone();
        // Launched children the engine has not picked up yet still hold a slot
        let pending_launch = waiting.iter().filter(|c| launched.contains(&c.id)).count();
        let candidates: Vec<_> = waiting
            .into_iter()
            .filter(|c| !launched.contains(&c.id))
            .collect();

        let budget = match self.logic_task.task_parameters().parallelism_limit() {
            Some(limit) => limit.saturating_sub(running.len() + pending_launch),
            None => candidates.len(),
        };
        if budget == 0 || candidates.is_empty() {
            return Ok(());
        }

        let mut slots = budget;
        for child in candidates {
            if slots == 0 {
                break;
            }
            let params = match child.dynamic_start_params() {
                Ok(params) => params,
                Err(e) => {
                    error!(
                        child_id = child.id,
                        error = %e,
                        "Skipping sub-workflow instance with unreadable command parameters"
                    );
                    continue;
                }
            };
            let command = Command::start_waiting_instance(
                self.key.workflow_instance_id,
                self.key.task_code,
                &child,
                params,
            );
            self.commands.dispatch(command).await?;
            self.launched.lock().insert(child.id);
            debug!(child_id = child.id, "Launched waiting sub-workflow instance");
            slots -= 1;
        }

        Ok(())
    }

    #[instrument(skip(self), fields(key = %self.key))]
    async fn output_parameters(&self) -> Result<Vec<Property>> {
        let children = self
            .sub_workflows
            .all_sub_workflow_instances(self.key.workflow_instance_id, self.key.task_code)
            .await?;

        let mut outputs = Vec::with_capacity(children.len());
        for (index, child) in children.iter().enumerate() {
            let output_value = self
                .sub_workflows
                .workflow_output_parameters(child)
                .await?
                .into_iter()
                .map(|property| (property.prop, property.value))
                .collect();

            outputs.push(DynamicOutput {
                dyn_params: child.dynamic_start_params()?,
                output_value,
                mapped_times: index + 1,
            });
        }

        if outputs.is_empty() {
            warn!("Collecting outputs for a fan-out without children");
        }

        let property = Property::varchar_out(
            dynamic_output_property_name(&self.task_instance.name),
            serde_json::to_string(&outputs)?,
        );
        debug!(property = %property.prop, children = outputs.len(), "Aggregated fan-out output");
        Ok(vec![property])
    }
}
