//! Progress records for long-running operations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::output::{GeneratedField, ObjectType, OutputScalar, OutputType};
use crate::resolve::Resolvable;

/// API name of the progress record type.
pub const PROGRESS_TYPE_NAME: &str = "ResultStep";

/// One step of a long-running operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStep {
    pub steps: u32,
    pub current_step: u32,
    pub text: String,
    pub is_end: bool,
    pub is_error: bool,
}

impl ProgressStep {
    pub fn new(steps: u32, current_step: u32, text: impl Into<String>) -> Self {
        Self {
            steps,
            current_step,
            text: text.into(),
            is_end: false,
            is_error: false,
        }
    }

    /// Final step of a successful operation.
    pub fn end(steps: u32, current_step: u32, text: impl Into<String>) -> Self {
        Self {
            is_end: true,
            ..Self::new(steps, current_step, text)
        }
    }

    /// Failure; always ends the operation.
    pub fn error(steps: u32, current_step: u32, text: impl Into<String>) -> Self {
        Self {
            is_end: true,
            is_error: true,
            ..Self::new(steps, current_step, text)
        }
    }
}

impl Resolvable for ProgressStep {
    fn attribute(&self, name: &str) -> Option<Value> {
        match name {
            "steps" => Some(self.steps.into()),
            "current_step" => Some(self.current_step.into()),
            "text" => Some(self.text.clone().into()),
            "is_end" => Some(self.is_end.into()),
            "is_error" => Some(self.is_error.into()),
            _ => None,
        }
    }
}

/// The `ResultStep` API type describing [`ProgressStep`].
pub fn progress_type() -> Arc<ObjectType> {
    let field = |source: &str, scalar: OutputScalar, description: &str| GeneratedField {
        description: Some(description.to_string()),
        ..GeneratedField::new(source, OutputType::Scalar(scalar))
    };

    Arc::new(ObjectType {
        name: PROGRESS_TYPE_NAME.to_string(),
        description: Some("A step of a long-running operation".to_string()),
        fields: vec![
            field("steps", OutputScalar::Int, "Total number of steps"),
            field("current_step", OutputScalar::Int, "Index of the current step"),
            field("text", OutputScalar::String, "Description of the current step"),
            field("is_end", OutputScalar::Boolean, "Whether this is the last step"),
            field("is_error", OutputScalar::Boolean, "Whether the operation failed"),
        ],
        discriminator: None,
    })
}
