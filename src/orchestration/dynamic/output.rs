use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output of one fan-out child, as folded into the parent's `dynamic.out(<task>)` property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicOutput {
    /// Iteration parameters the child was spawned with
    pub dyn_params: BTreeMap<String, String>,
    /// Output variables the child produced, keyed by property name
    pub output_value: BTreeMap<String, String>,
    /// 1-based position of the child in creation order
    pub mapped_times: usize,
}
