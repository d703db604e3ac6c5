//! # Fan-out Parameters
//!
//! Describes how a dynamic task iterates: which child workflow definition to
//! run, the list parameters whose cartesian product yields one child per
//! combination, values to filter out, and limits on how many children exist
//! and how many run at once.
//!
//! ## Expansion
//!
//! ```text
//! region = "eu,us"   tier = "gold|silver" (separator "|")   filter = "silver"
//!
//! product:  {eu,gold} {eu,silver} {us,gold} {us,silver}
//! filtered: {eu,gold} {us,gold}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::warn;

use crate::constants::defaults;
use crate::orchestration::errors::TaskStartError;

/// One list-valued input of a fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicInputParameter {
    pub name: String,
    pub value: String,
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_separator() -> String {
    defaults::LIST_PARAMETER_SEPARATOR.to_string()
}

fn default_max_num_of_sub_workflow() -> usize {
    defaults::MAX_NUM_OF_SUB_WORKFLOW
}

impl DynamicInputParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            separator: default_separator(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Split the raw value into trimmed, non-empty items
    pub fn values(&self) -> Vec<String> {
        self.value
            .split(self.separator.as_str())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Immutable description of one fan-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicParameters {
    pub workflow_definition_code: i64,
    #[serde(default = "default_definition_version")]
    pub workflow_definition_version: i32,
    #[serde(default = "default_max_num_of_sub_workflow")]
    pub max_num_of_sub_workflow: usize,
    /// Maximum children running at once; 0 means unlimited
    #[serde(default)]
    pub degree_of_parallelism: usize,
    #[serde(default)]
    pub list_parameters: Vec<DynamicInputParameter>,
    /// Comma-separated values; any combination containing one of them is skipped
    #[serde(default)]
    pub filter_condition: Option<String>,
}

fn default_definition_version() -> i32 {
    1
}

impl Default for DynamicParameters {
    fn default() -> Self {
        Self {
            workflow_definition_code: 0,
            workflow_definition_version: default_definition_version(),
            max_num_of_sub_workflow: defaults::MAX_NUM_OF_SUB_WORKFLOW,
            degree_of_parallelism: 0,
            list_parameters: Vec::new(),
            filter_condition: None,
        }
    }
}

impl DynamicParameters {
    pub fn new(workflow_definition_code: i64) -> Self {
        Self {
            workflow_definition_code,
            ..Default::default()
        }
    }

    pub fn with_list_parameter(mut self, parameter: DynamicInputParameter) -> Self {
        self.list_parameters.push(parameter);
        self
    }

    pub fn with_filter_condition(mut self, filter: impl Into<String>) -> Self {
        self.filter_condition = Some(filter.into());
        self
    }

    pub fn with_degree_of_parallelism(mut self, degree: usize) -> Self {
        self.degree_of_parallelism = degree;
        self
    }

    pub fn with_max_num_of_sub_workflow(mut self, max: usize) -> Self {
        self.max_num_of_sub_workflow = max;
        self
    }

    /// `None` when the fan-out may launch every child at once
    pub fn parallelism_limit(&self) -> Option<usize> {
        (self.degree_of_parallelism > 0).then_some(self.degree_of_parallelism)
    }

    pub fn validate(&self) -> Result<(), TaskStartError> {
        if self.workflow_definition_code <= 0 {
            return Err(TaskStartError::InvalidParameters(format!(
                "workflow_definition_code must be positive, got {}",
                self.workflow_definition_code
            )));
        }

        if self.list_parameters.is_empty() {
            return Err(TaskStartError::InvalidParameters(
                "at least one list parameter is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for parameter in &self.list_parameters {
            if parameter.name.trim().is_empty() {
                return Err(TaskStartError::InvalidParameters(
                    "list parameter name must not be empty".to_string(),
                ));
            }
            if parameter.separator.is_empty() {
                return Err(TaskStartError::InvalidParameters(format!(
                    "list parameter '{}' has an empty separator",
                    parameter.name
                )));
            }
            if !seen.insert(parameter.name.as_str()) {
                return Err(TaskStartError::InvalidParameters(format!(
                    "duplicate list parameter '{}'",
                    parameter.name
                )));
            }
        }

        Ok(())
    }

    fn filter_values(&self) -> BTreeSet<String> {
        self.filter_condition
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Expand the list parameters into one parameter map per child.
    ///
    /// Combinations are produced in declaration order with the first list
    /// parameter varying slowest. Filtered combinations are dropped before the
    /// `max_num_of_sub_workflow` cap is applied.
    pub fn generate_parameter_groups(&self) -> Vec<BTreeMap<String, String>> {
        let mut groups: Vec<BTreeMap<String, String>> = vec![BTreeMap::new()];

        for parameter in &self.list_parameters {
            let values = parameter.values();
            let mut expanded = Vec::with_capacity(groups.len() * values.len());
            for group in &groups {
                for value in &values {
                    let mut next = group.clone();
                    next.insert(parameter.name.clone(), value.clone());
                    expanded.push(next);
                }
            }
            groups = expanded;
        }

        let filters = self.filter_values();
        if !filters.is_empty() {
            groups.retain(|group| !group.values().any(|v| filters.contains(v)));
        }

        if self.max_num_of_sub_workflow > 0 && groups.len() > self.max_num_of_sub_workflow {
            warn!(
                generated = groups.len(),
                max_num_of_sub_workflow = self.max_num_of_sub_workflow,
                "Fan-out parameter groups exceed the sub-workflow limit, truncating"
            );
            groups.truncate(self.max_num_of_sub_workflow);
        }

        groups
    }
}
