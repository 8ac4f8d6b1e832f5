// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! # shellpipe - shell-style command pipelines
//!
//! `shellpipe` chains external commands the way `a | b | c` does in a shell,
//! without spawning a shell. Stages run one at a time: the complete stdout of
//! each stage becomes the stdin of the next, and a [`RunContext`] can cancel
//! or time out the whole chain.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use shellpipe::{Pipeline, RunContext, Stage, NO_CLEAN};
//!
//! # async fn example() -> shellpipe::ShellpipeResult<()> {
//! let pipeline = Pipeline::new([
//!     Stage::new(NO_CLEAN, "ps", ["-ef"]),
//!     Stage::new(NO_CLEAN, "grep", ["lantern"]),
//!     Stage::new(NO_CLEAN, "grep", ["-v", "grep"]),
//! ]);
//!
//! let ctx = RunContext::background().with_timeout(Duration::from_secs(5));
//! let output = pipeline.run(&ctx).await?;
//! println!("{}", output.stdout);
//!
//! // Optionally tear down whatever the stages left behind
//! pipeline.clean()?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod errors;
pub mod executors;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use context::RunContext;
pub use errors::{CancelReason, CleanupFailure, ShellpipeError, ShellpipeResult};
pub use pipeline::{
    Cleanup, NoClean, Pipeline, PipelineDefinition, PipelineOptions, RemovePaths, RunOutput,
    Stage, StageReport, NO_CLEAN,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
