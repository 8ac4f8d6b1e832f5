// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! Pipeline definition files
//!
//! A definition lists stages as plain argv, in YAML or TOML:
//!
//! ```yaml
//! name: find-lantern
//! stages:
//!   - program: ps
//!     args: ["-ef"]
//!   - program: grep
//!     args: ["lantern"]
//!     cleanup: ["/tmp/lantern.out"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{Pipeline, PipelineOptions, RemovePaths, Stage, NO_CLEAN};
use crate::errors::{ShellpipeError, ShellpipeResult};

/// Pipeline definition as read from a file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// Pipeline name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Pipeline description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Log each launched argv at INFO
    #[serde(default)]
    pub trace: bool,

    /// Stages in execution order
    #[serde(default)]
    pub stages: Vec<StageDefinition>,
}

/// A single stage in a definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Program to run
    pub program: String,

    /// Arguments, passed verbatim
    #[serde(default)]
    pub args: Vec<String>,

    /// Paths removed when the pipeline is cleaned
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cleanup: Vec<PathBuf>,
}

impl StageDefinition {
    /// Build the runnable stage
    pub fn to_stage(&self) -> Stage {
        if self.cleanup.is_empty() {
            Stage::new(NO_CLEAN, self.program.clone(), self.args.clone())
        } else {
            Stage::new(
                RemovePaths::new(self.cleanup.clone()),
                self.program.clone(),
                self.args.clone(),
            )
        }
    }
}

impl PipelineDefinition {
    /// Load a definition, picking the format from the file extension
    pub fn from_file(path: &Path) -> ShellpipeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ShellpipeError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml(&content),
            Some("toml") => Self::from_toml(&content),
            _ => Err(ShellpipeError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parse a definition from YAML
    pub fn from_yaml(yaml: &str) -> ShellpipeResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Parse a definition from TOML
    pub fn from_toml(source: &str) -> ShellpipeResult<Self> {
        toml::from_str(source).map_err(Into::into)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ShellpipeResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Build a definition from an argv list split on `separator`
    ///
    /// `["ps", "-ef", "|", "grep", "foo"]` becomes two stages. Only whole
    /// tokens equal to `separator` split; no other shell syntax is
    /// interpreted.
    pub fn from_argv<S: AsRef<str>>(tokens: &[S], separator: &str) -> ShellpipeResult<Self> {
        let mut stages = Vec::new();

        if tokens.is_empty() {
            return Ok(Self::default());
        }

        for (position, segment) in tokens
            .split(|token| token.as_ref() == separator)
            .enumerate()
        {
            let Some((program, args)) = segment.split_first() else {
                return Err(ShellpipeError::InvalidPipeline {
                    reason: format!("stage {} is empty", position),
                    help: Some(format!(
                        "Each '{}' must sit between two commands",
                        separator
                    )),
                });
            };

            stages.push(StageDefinition {
                program: program.as_ref().to_string(),
                args: args.iter().map(|a| a.as_ref().to_string()).collect(),
                cleanup: Vec::new(),
            });
        }

        Ok(Self {
            stages,
            ..Self::default()
        })
    }

    /// Build the runnable pipeline
    pub fn to_pipeline(&self) -> Pipeline {
        Pipeline::new(self.stages.iter().map(StageDefinition::to_stage))
            .with_options(PipelineOptions { trace: self.trace })
    }

    /// Display name, falling back to the first program
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.stages.first().map(|s| s.program.as_str()))
            .unwrap_or("(empty)")
    }
}
