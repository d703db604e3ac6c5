use fanout_core::models::{DynamicInputParameter, DynamicParameters};
use fanout_core::WorkflowExecutionStatus;
use proptest::prelude::*;

pub const ALL_STATES: [WorkflowExecutionStatus; 13] = [
    WorkflowExecutionStatus::SubmittedSuccess,
    WorkflowExecutionStatus::RunningExecution,
    WorkflowExecutionStatus::ReadyPause,
    WorkflowExecutionStatus::Pause,
    WorkflowExecutionStatus::ReadyStop,
    WorkflowExecutionStatus::Stop,
    WorkflowExecutionStatus::Failure,
    WorkflowExecutionStatus::Success,
    WorkflowExecutionStatus::DelayExecution,
    WorkflowExecutionStatus::SerialWait,
    WorkflowExecutionStatus::ReadyBlock,
    WorkflowExecutionStatus::Block,
    WorkflowExecutionStatus::WaitToRun,
];

/// Any child state the engine can report
pub fn child_state_strategy() -> impl Strategy<Value = WorkflowExecutionStatus> {
    prop::sample::select(ALL_STATES.to_vec())
}

/// Only states a child will not leave on its own
pub fn finished_state_strategy() -> impl Strategy<Value = WorkflowExecutionStatus> {
    prop::sample::select(
        ALL_STATES
            .iter()
            .copied()
            .filter(|s| s.is_finished())
            .collect::<Vec<_>>(),
    )
}

pub fn unfinished_state_strategy() -> impl Strategy<Value = WorkflowExecutionStatus> {
    prop::sample::select(
        ALL_STATES
            .iter()
            .copied()
            .filter(|s| !s.is_finished())
            .collect::<Vec<_>>(),
    )
}

/// Child sets of any size up to 32, possibly empty
pub fn child_set_strategy() -> impl Strategy<Value = Vec<WorkflowExecutionStatus>> {
    prop::collection::vec(child_state_strategy(), 0..32)
}

/// Fan-out parameters with up to three list parameters of up to four distinct values each
pub fn dynamic_parameters_strategy() -> impl Strategy<Value = DynamicParameters> {
    prop::collection::vec(prop::collection::btree_set("[a-z]{1,6}", 1..5), 1..4).prop_map(
        |lists| {
            lists
                .into_iter()
                .enumerate()
                .fold(DynamicParameters::new(7), |params, (i, values)| {
                    let value = values.into_iter().collect::<Vec<_>>().join(",");
                    params.with_list_parameter(DynamicInputParameter::new(format!("p{i}"), value))
                })
        },
    )
}
