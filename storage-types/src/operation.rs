//! Operation progress log handed to filesystem handlers

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    #[default]
    None,
    Execute,
    Success,
    Error,
    Info,
}

/// One step of an operation, with nested sub-steps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDetail {
    pub description: String,
    pub status: OperationStatus,
    pub children: Vec<OperationDetail>,
}

impl OperationDetail {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            status: OperationStatus::Execute,
            children: Vec::new(),
        }
    }

    /// Append a sub-step and return it for further logging
    pub fn add_child(&mut self, description: impl Into<String>) -> &mut OperationDetail {
        self.children.push(OperationDetail::new(description));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn set_status(&mut self, status: OperationStatus) {
        self.status = status;
    }
}
