use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

use crate::models::DynamicParameters;
use crate::orchestration::ports::LogicTaskHandle;

/// Logic task backing a dynamic fan-out.
///
/// Holds the fan-out parameters and the cancellation latch. Once cancelled it
/// stays cancelled.
#[derive(Debug)]
pub struct DynamicLogicTask {
    parameters: DynamicParameters,
    cancelled: AtomicBool,
}

impl DynamicLogicTask {
    pub fn new(parameters: DynamicParameters) -> Self {
        Self {
            parameters,
            cancelled: AtomicBool::new(false),
        }
    }
}

impl LogicTaskHandle for DynamicLogicTask {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            info!(
                workflow_definition_code = self.parameters.workflow_definition_code,
                "Dynamic logic task cancelled"
            );
        }
    }

    fn task_parameters(&self) -> &DynamicParameters {
        &self.parameters
    }
}
