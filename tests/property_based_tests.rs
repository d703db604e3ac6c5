//! Property tests for fan-out aggregation and parameter expansion.
//!
//! Probes are async; each case drives them with `tokio_test::block_on`.

mod common;
mod mocks;

use common::strategies::*;
use fanout_core::orchestration::AsyncTaskExecuteFunction;
use fanout_core::{AsyncTaskExecutionStatus, WorkflowExecutionStatus};
use mocks::{execute_function, MockSubWorkflowPort};
use proptest::prelude::*;

fn probe(
    states: &[WorkflowExecutionStatus],
    cancelled: bool,
) -> (AsyncTaskExecutionStatus, MockSubWorkflowPort) {
    let port = MockSubWorkflowPort::with_children(states);
    let function = execute_function(&port, cancelled);
    let status = tokio_test::block_on(function.probe_status()).unwrap();
    (status, port)
}

proptest! {
    /// Property: a cancelled task fails before any child is queried
    #[test]
    fn cancellation_takes_precedence(states in child_set_strategy()) {
        let (status, port) = probe(&states, true);
        prop_assert_eq!(status, AsyncTaskExecutionStatus::Failed);
        prop_assert_eq!(port.query_count(), 0);
    }

    /// Property: any unfinished child keeps the fan-out running
    #[test]
    fn unfinished_children_gate_the_verdict(
        mut states in child_set_strategy(),
        unfinished in unfinished_state_strategy(),
        position in any::<prop::sample::Index>(),
    ) {
        let at = position.index(states.len() + 1);
        states.insert(at, unfinished);
        let (status, _) = probe(&states, false);
        prop_assert_eq!(status, AsyncTaskExecutionStatus::Running);
    }

    /// Property: all children successful means success
    #[test]
    fn all_successful_children_succeed(count in 1usize..32) {
        let states = vec![WorkflowExecutionStatus::Success; count];
        let (status, _) = probe(&states, false);
        prop_assert_eq!(status, AsyncTaskExecutionStatus::Success);
    }

    /// Property: all finished with at least one non-success means failure
    #[test]
    fn any_unsuccessful_finished_child_fails(
        mut states in prop::collection::vec(finished_state_strategy(), 0..32),
        bad in prop::sample::select(vec![
            WorkflowExecutionStatus::Failure,
            WorkflowExecutionStatus::Stop,
            WorkflowExecutionStatus::Pause,
        ]),
        position in any::<prop::sample::Index>(),
    ) {
        let at = position.index(states.len() + 1);
        states.insert(at, bad);
        let (status, _) = probe(&states, false);
        prop_assert_eq!(status, AsyncTaskExecutionStatus::Failed);
    }

    /// Property: probing is idempotent and issues no commands
    #[test]
    fn repeated_probes_agree(states in child_set_strategy(), cancelled in any::<bool>()) {
        let port = MockSubWorkflowPort::with_children(&states);
        let function = execute_function(&port, cancelled);
        let first = tokio_test::block_on(function.probe_status()).unwrap();
        let second = tokio_test::block_on(function.probe_status()).unwrap();
        prop_assert_eq!(first, second);
        prop_assert!(port.state().dispatched.is_empty());
    }

    /// Property: the verdict does not depend on the order children are returned in
    #[test]
    fn verdict_is_order_independent(states in child_set_strategy()) {
        let mut reversed = states.clone();
        reversed.reverse();
        let (forward, _) = probe(&states, false);
        let (backward, _) = probe(&reversed, false);
        prop_assert_eq!(forward, backward);
    }

    /// Property: expansion yields the full cartesian product of distinct values
    #[test]
    fn parameter_groups_cover_the_product(params in dynamic_parameters_strategy()) {
        let expected: usize = params.list_parameters.iter().map(|p| p.values().len()).product();
        let groups = params.generate_parameter_groups();

        prop_assert_eq!(groups.len(), expected);
        for group in &groups {
            prop_assert_eq!(group.len(), params.list_parameters.len());
        }
        let unique: std::collections::BTreeSet<_> = groups.iter().collect();
        prop_assert_eq!(unique.len(), groups.len());
    }

    /// Property: filtered values never appear and the cap is respected
    #[test]
    fn filter_and_cap_are_applied(params in dynamic_parameters_strategy(), cap in 1usize..10) {
        let excluded = params.list_parameters[0].values()[0].clone();
        let params = params
            .with_filter_condition(excluded.clone())
            .with_max_num_of_sub_workflow(cap);

        let groups = params.generate_parameter_groups();
        prop_assert!(groups.len() <= cap);
        prop_assert!(groups.iter().all(|g| g.values().all(|v| v != &excluded)));
    }
}

#[test]
fn empty_child_set_is_running() {
    let (status, port) = probe(&[], false);
    assert_eq!(status, AsyncTaskExecutionStatus::Running);
    assert_eq!(port.state().all_instances_calls.len(), 1);
}
