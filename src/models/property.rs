//! Workflow variable properties exchanged between tasks.

use serde::{Deserialize, Serialize};

/// Direction of a property relative to the task that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direct {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataType {
    Varchar,
    Integer,
    Long,
    Float,
    Double,
    Date,
    Time,
    Timestamp,
    Boolean,
    List,
    File,
}

/// A named workflow variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub prop: String,
    pub direct: Direct,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub value: String,
}

impl Property {
    pub fn new(
        prop: impl Into<String>,
        direct: Direct,
        data_type: DataType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            prop: prop.into(),
            direct,
            data_type,
            value: value.into(),
        }
    }

    /// Shorthand for a VARCHAR output property
    pub fn varchar_out(prop: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(prop, Direct::Out, DataType::Varchar, value)
    }
}
