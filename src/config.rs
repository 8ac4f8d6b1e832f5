// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! User settings
//!
//! Optional defaults read from `config.toml` in the platform config
//! directory (e.g. `~/.config/shellpipe/config.toml` on Linux). Command-line
//! flags always take precedence.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{ShellpipeError, ShellpipeResult};

/// Default token that separates inline stages on the command line
pub const DEFAULT_SEPARATOR: &str = "|";

/// Settings loaded from the user config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default run timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Trace launched argv by default
    pub trace: bool,

    /// Separator token for inline stages
    pub separator: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            trace: false,
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl Settings {
    /// Location of the user config file, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "shellpipe").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> ShellpipeResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load settings from a specific file
    pub fn from_file(path: &Path) -> ShellpipeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ShellpipeError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let settings: Self = toml::from_str(&content)?;

        if settings.separator.is_empty() {
            return Err(ShellpipeError::InvalidPipeline {
                reason: format!("empty separator in {}", path.display()),
                help: Some("Remove the 'separator' key to use '|'".into()),
            });
        }

        Ok(settings)
    }

    /// Default timeout as a duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
