// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! Process execution
//!
//! Thin layer over `tokio::process` used by the pipeline engine to launch
//! one stage at a time.

mod process;

pub use process::SpawnedProcess;

use std::process::ExitStatus;
use std::time::Duration;

/// Everything a finished stage produced
#[derive(Debug)]
pub struct StageOutput {
    /// Bytes written to stdout
    pub stdout: Vec<u8>,

    /// Bytes written to stderr
    pub stderr: Vec<u8>,

    /// Exit status
    pub status: ExitStatus,

    /// Wall time from spawn to exit
    pub duration: Duration,
}

impl StageOutput {
    /// Exit code, `None` if the process was terminated by a signal
    pub fn exit_code(&self) -> Option<i32> {
        self.status.code()
    }

    /// stderr decoded lossily as UTF-8
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}
