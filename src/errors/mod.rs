// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! Error types
//!
//! Every failure of a run names the stage it happened in, so callers can
//! match on the variant and still report which command went wrong.

use miette::Diagnostic;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for shellpipe operations
pub type ShellpipeResult<T> = Result<T, ShellpipeError>;

/// Why a run context fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The context was cancelled explicitly
    Cancelled,
    /// The context's deadline passed
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("context canceled"),
            Self::DeadlineExceeded => f.write_str("context deadline exceeded"),
        }
    }
}

/// A single failed cleanup, as collected by `Pipeline::clean`
#[derive(Debug, Clone)]
pub struct CleanupFailure {
    /// Position of the stage in its pipeline
    pub stage: usize,
    /// Program the stage runs
    pub program: String,
    /// Failure message returned by the cleanup
    pub message: String,
}

/// Main error type for shellpipe
#[derive(Error, Debug, Diagnostic)]
pub enum ShellpipeError {
    // ─────────────────────────────────────────────────────────────────────────
    // Run Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Stage {stage} ('{program}') could not be started: {reason}")]
    #[diagnostic(code(shellpipe::launch_failed))]
    LaunchFailed {
        stage: usize,
        program: String,
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Stage {stage} ('{program}') failed: {reason}")]
    #[diagnostic(code(shellpipe::execution_failed))]
    ExecutionFailed {
        stage: usize,
        program: String,
        /// Exit code, `None` when the process was killed by a signal
        /// or the wait itself failed
        code: Option<i32>,
        stderr: String,
        reason: String,
    },

    #[error("Stage {stage} ('{program}') interrupted: {reason}")]
    #[diagnostic(
        code(shellpipe::cancelled),
        help("The run context fired before the stage finished; later stages were not started")
    )]
    Cancelled {
        stage: usize,
        program: String,
        reason: CancelReason,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Cleanup Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{}", join_failures(.failures))]
    #[diagnostic(code(shellpipe::cleanup_failed))]
    CleanupFailed { failures: Vec<CleanupFailure> },

    // ─────────────────────────────────────────────────────────────────────────
    // Definition Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(shellpipe::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Unsupported pipeline file format: {path}")]
    #[diagnostic(
        code(shellpipe::unsupported_format),
        help("Use a .yaml, .yml or .toml file")
    )]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid pipeline configuration: {reason}")]
    #[diagnostic(code(shellpipe::invalid_pipeline))]
    InvalidPipeline {
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(shellpipe::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(shellpipe::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(shellpipe::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(shellpipe::toml_error))]
    Toml { message: String },
}

fn join_failures(failures: &[CleanupFailure]) -> String {
    failures
        .iter()
        .map(|f| f.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

impl From<std::io::Error> for ShellpipeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for ShellpipeError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for ShellpipeError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for ShellpipeError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl ShellpipeError {
    /// Create a launch failure, with a PATH hint when the program is missing
    pub fn launch_failed(stage: usize, program: &str, error: &std::io::Error) -> Self {
        let help = match error.kind() {
            std::io::ErrorKind::NotFound => match which::which(program) {
                Ok(found) => Some(format!(
                    "'{}' resolves to {} but could not be executed",
                    program,
                    found.display()
                )),
                Err(_) => Some(format!(
                    "'{}' was not found; install it or check your PATH",
                    program
                )),
            },
            std::io::ErrorKind::PermissionDenied => {
                Some(format!("'{}' is not executable by the current user", program))
            }
            _ => None,
        };

        Self::LaunchFailed {
            stage,
            program: program.to_string(),
            reason: error.to_string(),
            help,
        }
    }

    /// Whether this error comes from a fired run context
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// The reason the run context fired, if this is a cancellation
    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self {
            Self::Cancelled { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Index of the stage a run error refers to
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            Self::LaunchFailed { stage, .. }
            | Self::ExecutionFailed { stage, .. }
            | Self::Cancelled { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_failed_joins_messages_in_order() {
        let err = ShellpipeError::CleanupFailed {
            failures: vec![
                CleanupFailure {
                    stage: 1,
                    program: "grep".into(),
                    message: "x".into(),
                },
                CleanupFailure {
                    stage: 2,
                    program: "wc".into(),
                    message: "y".into(),
                },
            ],
        };

        assert_eq!(err.to_string(), "x\ny");
    }

    #[test]
    fn test_launch_failed_not_found_has_help() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory");
        let err = ShellpipeError::launch_failed(0, "definitely-not-a-real-program-42", &io);

        match err {
            ShellpipeError::LaunchFailed { help, stage, .. } => {
                assert_eq!(stage, 0);
                assert!(help.unwrap().contains("PATH"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cancel_reason_accessors() {
        let err = ShellpipeError::Cancelled {
            stage: 3,
            program: "sleep".into(),
            reason: CancelReason::DeadlineExceeded,
        };

        assert!(err.is_cancelled());
        assert_eq!(err.cancel_reason(), Some(CancelReason::DeadlineExceeded));
        assert_eq!(err.stage_index(), Some(3));
        assert!(err.to_string().contains("deadline exceeded"));
    }
}
