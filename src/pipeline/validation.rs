// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! Pipeline validation
//!
//! Pre-flight checks on a definition. Nothing here is required before a run;
//! a bad program still surfaces as a launch failure when the pipeline runs.

use std::path::Path;

use crate::pipeline::{PipelineDefinition, StageDefinition};

/// Pipeline validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate a pipeline definition
    pub fn validate(definition: &PipelineDefinition) -> ValidationResult {
        let mut result = ValidationResult::new();

        if definition.stages.is_empty() {
            result.add_warning("Pipeline has no stages; running it produces no output");
        }

        for (index, stage) in definition.stages.iter().enumerate() {
            Self::validate_stage(index, stage, &mut result);
        }

        result
    }

    /// Validate a single stage
    fn validate_stage(index: usize, stage: &StageDefinition, result: &mut ValidationResult) {
        if stage.program.trim().is_empty() {
            result.add_error(&format!("Stage {}: program name is empty", index));
            return;
        }

        if which::which(&stage.program).is_err() {
            result.add_warning(&format!(
                "Stage {}: '{}' was not found on PATH",
                index, stage.program
            ));
        }

        for path in &stage.cleanup {
            if path.as_os_str().is_empty() || path == Path::new("/") {
                result.add_error(&format!(
                    "Stage {}: refusing cleanup path '{}'",
                    index,
                    path.display()
                ));
            }
        }
    }
}

/// Result of pipeline validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
