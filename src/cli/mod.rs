// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for shellpipe.

pub mod run;
pub mod validate;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell-style command pipelines
///
/// Chain external commands like `a | b | c`, without a shell.
#[derive(Parser, Debug)]
#[clap(
    name = "shellpipe",
    version,
    about = "Run external commands as a pipeline, without a shell",
    long_about = None,
    after_help = "Examples:\n\
        shellpipe run -- ps -ef '|' grep lantern '|' grep -v grep\n\
        shellpipe run --timeout 5 -f pipeline.yaml\n\
        shellpipe validate pipeline.yaml\n\n\
        See 'shellpipe <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a pipeline
    Run {
        /// Pipeline definition file (.yaml, .yml or .toml)
        #[clap(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Abort the run after this many seconds
        #[clap(long, env = "SHELLPIPE_TIMEOUT", value_name = "SECS")]
        timeout: Option<u64>,

        /// Log each launched argv
        #[clap(long)]
        trace: bool,

        /// Run stage cleanups after the pipeline
        #[clap(long)]
        clean: bool,

        /// Output format
        #[clap(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Token separating inline stages
        #[clap(long, value_name = "TOKEN")]
        separator: Option<String>,

        /// Inline stages, e.g. `-- ps -ef '|' grep foo`
        #[clap(last = true, value_name = "ARGV")]
        argv: Vec<String>,
    },

    /// Validate a pipeline definition
    Validate {
        /// Pipeline file to validate
        #[clap(default_value = "shellpipe.yaml")]
        pipeline: PathBuf,
    },
}

/// Output format for the run command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Final stdout/stderr as-is
    Text,
    /// Run output as a JSON document
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_inline_run() {
        let cli = Cli::parse_from([
            "shellpipe", "run", "--timeout", "3", "--", "ps", "-ef", "|", "wc",
        ]);

        match cli.command {
            Commands::Run { timeout, argv, format, .. } => {
                assert_eq!(timeout, Some(3));
                assert_eq!(argv, vec!["ps", "-ef", "|", "wc"]);
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
