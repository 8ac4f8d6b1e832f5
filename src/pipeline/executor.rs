// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! Pipeline executor
//!
//! Runs stages strictly one after another. Each stage's complete stdout is
//! buffered and handed to the next stage as its stdin, so at most one child
//! process is alive at any time.

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::errors::{CleanupFailure, ShellpipeError, ShellpipeResult};
use crate::executors::{SpawnedProcess, StageOutput};
use crate::pipeline::Stage;

/// Pipeline construction options
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Log every launched argv at INFO instead of DEBUG
    pub trace: bool,
}

/// What one executed stage left behind
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    /// Position in the pipeline
    pub index: usize,
    /// Program that was run
    pub program: String,
    /// Exit code
    pub exit_code: Option<i32>,
    /// Captured stderr
    pub stderr: String,
    /// Wall time of the stage
    pub duration: Duration,
}

/// Result of a successful run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunOutput {
    /// Final stage's stdout
    pub stdout: String,
    /// Final stage's stderr
    pub stderr: String,
    /// One report per executed stage, in order
    pub reports: Vec<StageReport>,
}

/// An ordered chain of stages
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
    options: PipelineOptions,
}

impl Pipeline {
    /// Create a pipeline running `stages` in the given order
    pub fn new(stages: impl IntoIterator<Item = Stage>) -> Self {
        Self {
            stages: stages.into_iter().collect(),
            options: PipelineOptions::default(),
        }
    }

    /// Replace the pipeline options
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// Toggle argv tracing
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.options.trace = trace;
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order, piping stdout into the next stage's stdin
    ///
    /// Stops at the first stage that cannot be launched, exits with a failing
    /// status, or is interrupted by `ctx`. Stages after it are never started.
    pub async fn run(&self, ctx: &RunContext) -> ShellpipeResult<RunOutput> {
        let mut input = Vec::new();
        let mut stderr = Vec::new();
        let mut reports = Vec::with_capacity(self.stages.len());

        for (index, stage) in self.stages.iter().enumerate() {
            let output = self.run_stage(index, stage, input, ctx).await?;

            debug!(
                stage = index,
                program = stage.program(),
                bytes = output.stdout.len(),
                elapsed_ms = output.duration.as_millis() as u64,
                "stage finished"
            );

            reports.push(StageReport {
                index,
                program: stage.program().to_string(),
                exit_code: output.exit_code(),
                stderr: output.stderr_lossy(),
                duration: output.duration,
            });

            input = output.stdout;
            stderr = output.stderr;
        }

        Ok(RunOutput {
            stdout: String::from_utf8_lossy(&input).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            reports,
        })
    }

    /// Launch one stage and race its completion against `ctx`
    async fn run_stage(
        &self,
        index: usize,
        stage: &Stage,
        input: Vec<u8>,
        ctx: &RunContext,
    ) -> ShellpipeResult<StageOutput> {
        if let Some(reason) = ctx.err() {
            return Err(ShellpipeError::Cancelled {
                stage: index,
                program: stage.program().to_string(),
                reason,
            });
        }

        if self.options.trace {
            info!(stage = index, argv = ?stage.argv(), "launching stage");
        } else {
            debug!(stage = index, argv = ?stage.argv(), "launching stage");
        }

        let mut process = SpawnedProcess::spawn(stage, input)
            .map_err(|e| ShellpipeError::launch_failed(index, stage.program(), &e))?;

        let finished = tokio::select! {
            biased;
            reason = ctx.done() => Err(reason),
            result = process.finish() => Ok(result),
        };

        match finished {
            Err(reason) => {
                if let Err(e) = process.kill().await {
                    warn!(
                        stage = index,
                        program = stage.program(),
                        error = %e,
                        "failed to kill stage"
                    );
                }
                Err(ShellpipeError::Cancelled {
                    stage: index,
                    program: stage.program().to_string(),
                    reason,
                })
            }
            Ok(Err(e)) => Err(ShellpipeError::ExecutionFailed {
                stage: index,
                program: stage.program().to_string(),
                code: None,
                stderr: String::new(),
                reason: e.to_string(),
            }),
            Ok(Ok(output)) if !output.status.success() => Err(ShellpipeError::ExecutionFailed {
                stage: index,
                program: stage.program().to_string(),
                code: output.exit_code(),
                stderr: output.stderr_lossy(),
                reason: output.status.to_string(),
            }),
            Ok(Ok(output)) => Ok(output),
        }
    }

    /// Run every stage's cleanup, in order, without stopping on failure
    pub fn clean(&self) -> ShellpipeResult<()> {
        let failures: Vec<CleanupFailure> = self
            .stages
            .iter()
            .enumerate()
            .filter_map(|(index, stage)| {
                let err = stage.clean().err()?;
                warn!(
                    stage = index,
                    program = stage.program(),
                    error = %err,
                    "cleanup failed"
                );
                Some(CleanupFailure {
                    stage: index,
                    program: stage.program().to_string(),
                    message: format!("{:#}", err),
                })
            })
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ShellpipeError::CleanupFailed { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CancelReason;
    use crate::pipeline::NO_CLEAN;
    use std::path::Path;
    use std::time::Instant;

    fn sh(script: &str) -> Stage {
        Stage::new(NO_CLEAN, "sh", ["-c", script])
    }

    fn touch(marker: &Path) -> Stage {
        Stage::new(NO_CLEAN, "touch", [marker.to_string_lossy().into_owned()])
    }

    #[tokio::test]
    async fn test_single_stage_returns_its_output() {
        let pipeline = Pipeline::new([sh("printf hello; printf oops >&2")]);

        let output = pipeline.run(&RunContext::background()).await.unwrap();

        assert_eq!(output.stdout, "hello");
        assert_eq!(output.stderr, "oops");
        assert_eq!(output.reports.len(), 1);
        assert_eq!(output.reports[0].exit_code, Some(0));
    }

    #[tokio::test]
    async fn test_output_feeds_next_stage() {
        let pipeline = Pipeline::new([
            Stage::new(NO_CLEAN, "printf", ["a\\nb\\nc\\n"]),
            Stage::new(NO_CLEAN, "wc", ["-l"]),
        ]);

        let output = pipeline.run(&RunContext::background()).await.unwrap();

        assert_eq!(output.stdout.trim(), "3");
    }

    #[tokio::test]
    async fn test_grep_chain() {
        let pipeline = Pipeline::new([
            Stage::new(NO_CLEAN, "printf", ["lantern 1\\ngrep lantern\\nother\\nlantern 2\\n"]),
            Stage::new(NO_CLEAN, "grep", ["lantern"]),
            Stage::new(NO_CLEAN, "grep", ["-v", "grep"]),
        ]);

        let output = pipeline.run(&RunContext::background()).await.unwrap();

        assert_eq!(output.stdout, "lantern 1\nlantern 2\n");
        assert_eq!(output.reports.len(), 3);
    }

    #[tokio::test]
    async fn test_intermediate_stderr_is_reported() {
        let pipeline = Pipeline::new([
            sh("printf data; printf warn >&2"),
            Stage::new(NO_CLEAN, "cat", Vec::<String>::new()),
        ]);

        let output = pipeline.run(&RunContext::background()).await.unwrap();

        assert_eq!(output.stdout, "data");
        assert_eq!(output.stderr, "");
        assert_eq!(output.reports[0].stderr, "warn");
    }

    #[tokio::test]
    async fn test_empty_pipeline() {
        let pipeline = Pipeline::new(Vec::<Stage>::new());

        let output = pipeline.run(&RunContext::background()).await.unwrap();

        assert!(output.stdout.is_empty());
        assert!(output.stderr.is_empty());
        assert!(output.reports.is_empty());
    }

    #[tokio::test]
    async fn test_failing_middle_stage_stops_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("after-failure");
        let pipeline = Pipeline::new([
            Stage::new(NO_CLEAN, "printf", ["input"]),
            sh("printf broken >&2; exit 3"),
            touch(&marker),
        ]);

        let err = pipeline.run(&RunContext::background()).await.unwrap_err();

        match err {
            ShellpipeError::ExecutionFailed {
                stage, code, stderr, ..
            } => {
                assert_eq!(stage, 1);
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("never");
        let pipeline = Pipeline::new([
            Stage::new(NO_CLEAN, "shellpipe-no-such-program", Vec::<String>::new()),
            touch(&marker),
        ]);

        let err = pipeline.run(&RunContext::background()).await.unwrap_err();

        assert!(matches!(err, ShellpipeError::LaunchFailed { stage: 0, .. }));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_pre_cancelled_context_launches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("launched");
        let pipeline = Pipeline::new([touch(&marker)]);
        let ctx = RunContext::background();
        ctx.cancel();

        let err = pipeline.run(&ctx).await.unwrap_err();

        assert_eq!(err.cancel_reason(), Some(CancelReason::Cancelled));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_pre_expired_deadline() {
        let pipeline = Pipeline::new([Stage::new(NO_CLEAN, "sleep", ["5"])]);
        let ctx = RunContext::background().with_timeout(Duration::ZERO);

        let err = pipeline.run(&ctx).await.unwrap_err();

        assert_eq!(err.cancel_reason(), Some(CancelReason::DeadlineExceeded));
        assert_eq!(err.stage_index(), Some(0));
    }

    #[tokio::test]
    async fn test_timeout_kills_running_stage() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("after-timeout");
        let pipeline = Pipeline::new([
            Stage::new(NO_CLEAN, "printf", ["x"]),
            Stage::new(NO_CLEAN, "sleep", ["30"]),
            touch(&marker),
        ]);
        let ctx = RunContext::background().with_timeout(Duration::from_millis(200));

        let started = Instant::now();
        let err = pipeline.run(&ctx).await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(err.cancel_reason(), Some(CancelReason::DeadlineExceeded));
        assert_eq!(err.stage_index(), Some(1));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_explicit_cancel_mid_run() {
        let pipeline = Pipeline::new([Stage::new(NO_CLEAN, "sleep", ["30"])]);
        let ctx = RunContext::background();
        let handle = ctx.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            handle.cancel();
        });

        let err = pipeline.run(&ctx).await.unwrap_err();

        assert_eq!(err.cancel_reason(), Some(CancelReason::Cancelled));
    }

    #[tokio::test]
    async fn test_concurrent_runs_share_a_pipeline() {
        let pipeline = Pipeline::new([
            Stage::new(NO_CLEAN, "printf", ["one\\ntwo\\n"]),
            Stage::new(NO_CLEAN, "wc", ["-l"]),
        ]);
        let ctx = RunContext::background();

        let (a, b) = tokio::join!(pipeline.run(&ctx), pipeline.run(&ctx));

        assert_eq!(a.unwrap().stdout.trim(), "2");
        assert_eq!(b.unwrap().stdout.trim(), "2");
    }

    #[test]
    fn test_clean_collects_every_failure_in_order() {
        let fail = |msg: &'static str| {
            move |_: &Stage| -> anyhow::Result<()> { anyhow::bail!(msg) }
        };
        let pipeline = Pipeline::new([
            Stage::new(NO_CLEAN, "ps", ["-ef"]),
            Stage::new(fail("x"), "grep", ["lantern"]),
            Stage::new(fail("y"), "grep", ["-v", "grep"]),
        ]);

        let err = pipeline.clean().unwrap_err();

        assert_eq!(err.to_string(), "x\ny");
        match err {
            ShellpipeError::CleanupFailed { failures } => {
                let stages: Vec<_> = failures.iter().map(|f| f.stage).collect();
                assert_eq!(stages, vec![1, 2]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_clean_succeeds_without_failures() {
        let pipeline = Pipeline::new([Stage::new(NO_CLEAN, "true", Vec::<String>::new())]);
        assert!(pipeline.clean().is_ok());
        assert!(Pipeline::default().clean().is_ok());
    }

    #[test]
    fn test_trace_option() {
        let pipeline = Pipeline::new(Vec::<Stage>::new()).with_trace(true);
        assert!(pipeline.options().trace);
        assert!(pipeline.is_empty());
    }
}
