// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! Stage descriptors and cleanup hooks

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;

/// Teardown action attached to a stage
///
/// Runs after a pipeline has been run (or not), through `Pipeline::clean`.
pub trait Cleanup: Send + Sync {
    /// Perform the teardown for `stage`
    fn clean(&self, stage: &Stage) -> anyhow::Result<()>;
}

impl<F> Cleanup for F
where
    F: Fn(&Stage) -> anyhow::Result<()> + Send + Sync,
{
    fn clean(&self, stage: &Stage) -> anyhow::Result<()> {
        self(stage)
    }
}

/// Cleanup that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClean;

/// The default cleanup for stages with nothing to tear down
pub const NO_CLEAN: NoClean = NoClean;

impl Cleanup for NoClean {
    fn clean(&self, _stage: &Stage) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Cleanup that removes files or directories a stage left behind
///
/// Paths that no longer exist are skipped.
#[derive(Debug, Clone, Default)]
pub struct RemovePaths {
    paths: Vec<PathBuf>,
}

impl RemovePaths {
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Cleanup for RemovePaths {
    fn clean(&self, stage: &Stage) -> anyhow::Result<()> {
        for path in &self.paths {
            let result = if path.is_dir() {
                std::fs::remove_dir_all(path)
            } else {
                std::fs::remove_file(path)
            };

            match result {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("{}: failed to remove {}", stage, path.display())
                    })
                }
            }
        }
        Ok(())
    }
}

/// One external command in a pipeline
///
/// Stages are immutable; cloning one shares its cleanup.
#[derive(Clone)]
pub struct Stage {
    program: String,
    args: Vec<String>,
    cleanup: Arc<dyn Cleanup>,
}

impl Stage {
    /// Create a stage running `program` with `args`
    ///
    /// Nothing is checked here; a bad program name surfaces when the
    /// pipeline is run.
    pub fn new<C, I, S>(cleanup: C, program: impl Into<String>, args: I) -> Self
    where
        C: Cleanup + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_shared_cleanup(Arc::new(cleanup), program, args)
    }

    /// Create a stage whose cleanup is shared with other stages
    pub fn with_shared_cleanup<I, S>(
        cleanup: Arc<dyn Cleanup>,
        program: impl Into<String>,
        args: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cleanup,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Program followed by its arguments
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect()
    }

    /// Run this stage's cleanup
    pub fn clean(&self) -> anyhow::Result<()> {
        self.cleanup.clean(self)
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("program", &self.program)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_new_stores_values_verbatim() {
        let stage = Stage::new(NO_CLEAN, "grep", ["-v", "grep"]);

        assert_eq!(stage.program(), "grep");
        assert_eq!(stage.args(), ["-v", "grep"]);
        assert_eq!(stage.argv(), vec!["grep", "-v", "grep"]);
        assert_eq!(stage.to_string(), "grep -v grep");
    }

    #[test]
    fn test_empty_program_is_accepted() {
        let stage = Stage::new(NO_CLEAN, "", Vec::<String>::new());
        assert_eq!(stage.program(), "");
        assert!(stage.args().is_empty());
    }

    #[test]
    fn test_closure_cleanup_receives_its_stage() {
        let stage = Stage::new(
            |s: &Stage| -> anyhow::Result<()> { anyhow::bail!("{}", s.args().join(" ")) },
            "ps",
            ["-ef"],
        );

        let err = stage.clean().unwrap_err();
        assert_eq!(err.to_string(), "-ef");
    }

    #[test]
    fn test_clones_share_cleanup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let stage = Stage::new(
            move |_: &Stage| -> anyhow::Result<()> {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
            "true",
            Vec::<String>::new(),
        );
        let copy = stage.clone();

        stage.clean().unwrap();
        copy.clean().unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_remove_paths_removes_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("out.txt");
        let sub = dir.path().join("work");
        std::fs::write(&file, "data").unwrap();
        std::fs::create_dir_all(sub.join("nested")).unwrap();

        let stage = Stage::new(RemovePaths::new([&file, &sub]), "true", Vec::<String>::new());
        stage.clean().unwrap();

        assert!(!file.exists());
        assert!(!sub.exists());
    }

    #[test]
    fn test_remove_paths_ignores_missing() {
        let dir = tempfile::tempdir().unwrap();
        let cleanup = RemovePaths::new([dir.path().join("never-created")]);
        let stage = Stage::new(cleanup, "true", Vec::<String>::new());

        assert!(stage.clean().is_ok());
    }
}
