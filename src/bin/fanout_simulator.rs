//! # Fan-out Simulator
//!
//! Runs one dynamic fan-out end to end against the in-memory sub-workflow
//! store: children are generated, launched under the degree of parallelism,
//! driven to completion by a simulated engine, and the aggregated outcome is
//! printed as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use fanout_core::config::AsyncTaskConfig;
use fanout_core::logging::init_structured_logging;
use fanout_core::models::{DynamicInputParameter, DynamicParameters, Property, TaskInstance};
use fanout_core::orchestration::{
    AsyncTaskKey, AsyncTaskOutcome, AsyncTaskPoller, ChannelCompletionHandler,
    DynamicAsyncTaskExecuteFunction, DynamicLogicTask, InMemorySubWorkflowStore,
};
use fanout_core::WorkflowExecutionStatus;

#[derive(Parser)]
#[command(name = "fanout-simulator")]
#[command(about = "Simulate a dynamic fan-out task against an in-memory workflow engine")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// List parameter as NAME=V1,V2,... (repeatable)
    #[arg(long = "param", value_parser = parse_list_parameter, required = true)]
    params: Vec<DynamicInputParameter>,

    /// Comma-separated values whose combinations are skipped
    #[arg(long)]
    filter: Option<String>,

    /// Maximum children running at once (0 = unlimited)
    #[arg(short = 'p', long, default_value_t = 0)]
    parallelism: usize,

    /// 1-based creation indexes of children that should fail
    #[arg(long, value_delimiter = ',')]
    fail: Vec<usize>,

    /// Cancel the fan-out after this many milliseconds
    #[arg(long)]
    cancel_after_ms: Option<u64>,

    /// Configuration directory (default: ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,
}

fn parse_list_parameter(raw: &str) -> std::result::Result<DynamicInputParameter, String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=V1,V2,... but got '{raw}'"))?;
    Ok(DynamicInputParameter::new(name.trim(), value))
}

const PARENT_WORKFLOW_INSTANCE_ID: i64 = 1;
const TASK_CODE: i64 = 1001;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_structured_logging();

    let config = AsyncTaskConfig::load_from_directory(cli.config_dir.clone())
        .context("failed to load async task configuration")?;

    let mut parameters = DynamicParameters::new(42).with_degree_of_parallelism(cli.parallelism);
    for param in cli.params {
        parameters = parameters.with_list_parameter(param);
    }
    if let Some(filter) = cli.filter {
        parameters = parameters.with_filter_condition(filter);
    }

    let store = Arc::new(InMemorySubWorkflowStore::new());
    let function = DynamicAsyncTaskExecuteFunction::new(
        TaskInstance::new(1, "fan_out", TASK_CODE, PARENT_WORKFLOW_INSTANCE_ID),
        Arc::new(DynamicLogicTask::new(parameters)),
        store.clone(),
        store.clone(),
    )
    .with_config(&config);

    let (handler, mut outcomes) = ChannelCompletionHandler::new();
    let poller = Arc::new(AsyncTaskPoller::new(&config, Arc::new(handler)));
    poller
        .submit(Arc::new(function))
        .await
        .context("fan-out failed to start")?;

    let engine = tokio::spawn(simulate_engine(
        store.clone(),
        cli.fail,
        config.check_interval() / 2,
    ));

    if let Some(delay) = cli.cancel_after_ms {
        let poller = Arc::clone(&poller);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            let key = AsyncTaskKey::new(PARENT_WORKFLOW_INSTANCE_ID, TASK_CODE);
            if poller.cancel(&key).await {
                warn!(task = %key, "Cancelled fan-out");
            }
        });
    }

    let outcome = outcomes
        .recv()
        .await
        .context("poller stopped without reporting an outcome")?;
    engine.abort();
    poller.shutdown().await;

    let children = store.children(PARENT_WORKFLOW_INSTANCE_ID, TASK_CODE);
    let report = match outcome {
        AsyncTaskOutcome::Succeeded { outputs, .. } => serde_json::json!({
            "status": "success",
            "children": children.len(),
            "outputs": outputs,
        }),
        AsyncTaskOutcome::Failed { .. } => serde_json::json!({
            "status": "failed",
            "children": children.len(),
        }),
        AsyncTaskOutcome::Errored { error, .. } => serde_json::json!({
            "status": "error",
            "error": error.to_string(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Finish every running child on each tick, recording a per-child output
async fn simulate_engine(store: Arc<InMemorySubWorkflowStore>, fail: Vec<usize>, tick: Duration) {
    let mut interval = tokio::time::interval(tick.max(Duration::from_millis(10)));
    loop {
        interval.tick().await;
        let children = store.children(PARENT_WORKFLOW_INSTANCE_ID, TASK_CODE);
        for (index, child) in children.iter().enumerate() {
            if child.state != WorkflowExecutionStatus::RunningExecution {
                continue;
            }
            let state = if fail.contains(&(index + 1)) {
                WorkflowExecutionStatus::Failure
            } else {
                WorkflowExecutionStatus::Success
            };
            let params = child.dynamic_start_params().unwrap_or_default();
            store.set_output_parameters(
                child.id,
                vec![Property::varchar_out(
                    "summary",
                    format!("processed {}", serde_json::json!(params)),
                )],
            );
            store.set_state(child.id, state);
            info!(child = child.id, state = %state, "Simulated child finished");
        }
    }
}
