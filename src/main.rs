// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! shellpipe - shell-style command pipelines without a shell

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shellpipe::cli::run::RunArgs;
use shellpipe::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shellpipe=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    match cli.command {
        Commands::Run {
            file,
            timeout,
            trace,
            clean,
            format,
            separator,
            argv,
        } => {
            let args = RunArgs {
                file,
                timeout,
                trace,
                clean,
                format,
                separator,
                argv,
            };
            shellpipe::cli::run::run(args, cli.verbose).await
        }
        Commands::Validate { pipeline } => {
            shellpipe::cli::validate::run(pipeline, cli.verbose).await
        }
    }
}
