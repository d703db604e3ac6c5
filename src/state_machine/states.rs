use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of a workflow instance as reported by the workflow engine.
///
/// The async task core only reads these; transitions are owned by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowExecutionStatus {
    SubmittedSuccess,
    RunningExecution,
    ReadyPause,
    Pause,
    ReadyStop,
    Stop,
    Failure,
    Success,
    DelayExecution,
    SerialWait,
    ReadyBlock,
    Block,
    /// Created by a fan-out but not launched yet
    WaitToRun,
}

impl WorkflowExecutionStatus {
    /// Check if the instance reached a state it will not leave on its own
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Stop | Self::Pause)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Check if the instance occupies an execution slot
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Self::SubmittedSuccess
                | Self::RunningExecution
                | Self::ReadyPause
                | Self::ReadyStop
                | Self::DelayExecution
                | Self::SerialWait
                | Self::ReadyBlock
                | Self::Block
        )
    }

    pub fn is_wait_to_run(&self) -> bool {
        matches!(self, Self::WaitToRun)
    }
}

impl fmt::Display for WorkflowExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SubmittedSuccess => "submitted_success",
            Self::RunningExecution => "running_execution",
            Self::ReadyPause => "ready_pause",
            Self::Pause => "pause",
            Self::ReadyStop => "ready_stop",
            Self::Stop => "stop",
            Self::Failure => "failure",
            Self::Success => "success",
            Self::DelayExecution => "delay_execution",
            Self::SerialWait => "serial_wait",
            Self::ReadyBlock => "ready_block",
            Self::Block => "block",
            Self::WaitToRun => "wait_to_run",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for WorkflowExecutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "submitted_success" => Ok(Self::SubmittedSuccess),
            "running_execution" => Ok(Self::RunningExecution),
            "ready_pause" => Ok(Self::ReadyPause),
            "pause" => Ok(Self::Pause),
            "ready_stop" => Ok(Self::ReadyStop),
            "stop" => Ok(Self::Stop),
            "failure" => Ok(Self::Failure),
            "success" => Ok(Self::Success),
            "delay_execution" => Ok(Self::DelayExecution),
            "serial_wait" => Ok(Self::SerialWait),
            "ready_block" => Ok(Self::ReadyBlock),
            "block" => Ok(Self::Block),
            "wait_to_run" => Ok(Self::WaitToRun),
            _ => Err(format!("Invalid workflow execution status: {s}")),
        }
    }
}

/// Status of an async task as seen by the master loop.
///
/// Derived on every probe and never stored. `Running` may be followed by any
/// status; `Success` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsyncTaskExecutionStatus {
    Running,
    Success,
    Failed,
}

impl AsyncTaskExecutionStatus {
    /// Check if this is a terminal state (the master stops polling)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for AsyncTaskExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_states() {
        assert!(WorkflowExecutionStatus::Success.is_finished());
        assert!(WorkflowExecutionStatus::Failure.is_finished());
        assert!(WorkflowExecutionStatus::Stop.is_finished());
        assert!(WorkflowExecutionStatus::Pause.is_finished());
        assert!(!WorkflowExecutionStatus::RunningExecution.is_finished());
        assert!(!WorkflowExecutionStatus::WaitToRun.is_finished());
        assert!(!WorkflowExecutionStatus::ReadyStop.is_finished());
    }

    #[test]
    fn test_only_success_is_successful() {
        assert!(WorkflowExecutionStatus::Success.is_success());
        assert!(!WorkflowExecutionStatus::Stop.is_success());
        assert!(!WorkflowExecutionStatus::Pause.is_success());
        assert!(!WorkflowExecutionStatus::Failure.is_success());
    }

    #[test]
    fn test_running_and_waiting_are_disjoint() {
        assert!(!WorkflowExecutionStatus::WaitToRun.is_running());
        assert!(WorkflowExecutionStatus::WaitToRun.is_wait_to_run());
        assert!(WorkflowExecutionStatus::SubmittedSuccess.is_running());
        assert!(!WorkflowExecutionStatus::Success.is_running());
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(WorkflowExecutionStatus::WaitToRun.to_string(), "wait_to_run");
        assert_eq!(
            "running_execution".parse::<WorkflowExecutionStatus>().unwrap(),
            WorkflowExecutionStatus::RunningExecution
        );
        assert!("cancelled".parse::<WorkflowExecutionStatus>().is_err());
    }

    #[test]
    fn test_async_status_terminality() {
        assert!(!AsyncTaskExecutionStatus::Running.is_terminal());
        assert!(AsyncTaskExecutionStatus::Success.is_terminal());
        assert!(AsyncTaskExecutionStatus::Failed.is_terminal());
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&WorkflowExecutionStatus::SubmittedSuccess).unwrap();
        assert_eq!(json, "\"submitted_success\"");

        let parsed: AsyncTaskExecutionStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, AsyncTaskExecutionStatus::Failed);
    }
}
