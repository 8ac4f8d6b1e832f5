// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! Run command - execute a pipeline

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::OutputFormat;
use crate::config::Settings;
use crate::context::RunContext;
use crate::errors::ShellpipeError;
use crate::pipeline::{PipelineDefinition, RunOutput};
use crate::utils::create_spinner;

/// Arguments of the run command
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub file: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub trace: bool,
    pub clean: bool,
    pub format: OutputFormat,
    pub separator: Option<String>,
    pub argv: Vec<String>,
}

/// Run the pipeline
pub async fn run(args: RunArgs, verbose: bool) -> Result<()> {
    let settings = Settings::load()?;
    let separator = args.separator.as_deref().unwrap_or(&settings.separator);

    let definition = match (&args.file, args.argv.is_empty()) {
        (Some(path), true) => {
            if !path.exists() {
                return Err(miette::miette!(
                    "Pipeline file not found: {}",
                    path.display()
                ));
            }
            PipelineDefinition::from_file(path)?
        }
        (None, false) => PipelineDefinition::from_argv(&args.argv, separator)?,
        (Some(_), false) => {
            return Err(miette::miette!(
                "Pass either --file or inline stages after '--', not both"
            ))
        }
        (None, true) => {
            return Err(miette::miette!(
                "Nothing to run\n\n\
                 Pass a definition with --file or stages after '--', e.g.\n  \
                 shellpipe run -- ps -ef '{}' grep foo",
                separator
            ))
        }
    };

    let trace = args.trace || definition.trace || settings.trace;
    let pipeline = definition.to_pipeline().with_trace(trace);

    let root = RunContext::background();
    let timeout = args.timeout.map(Duration::from_secs).or(settings.timeout());
    let ctx = match timeout {
        Some(timeout) => root.with_timeout(timeout),
        None => root.child(),
    };

    let interrupt = root.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.cancel();
        }
    });

    let spinner = (args.format == OutputFormat::Text && !trace)
        .then(|| create_spinner(&format!("Running {}", definition.display_name())));

    let result = pipeline.run(&ctx).await;

    ctrl_c.abort();
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    let cleaned = if args.clean { pipeline.clean() } else { Ok(()) };

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            if let Err(clean_err) = cleaned {
                eprintln!("{} {}", "Cleanup also failed:".yellow().bold(), clean_err);
            }
            if let ShellpipeError::ExecutionFailed { stderr, .. } = &e {
                if !stderr.is_empty() {
                    eprintln!("{}", stderr.dimmed());
                }
            }
            return Err(e.into());
        }
    };

    match args.format {
        OutputFormat::Text => print_text(&output, verbose),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&output).map_err(ShellpipeError::from)?;
            println!("{}", json);
        }
    }

    cleaned?;
    Ok(())
}

fn print_text(output: &RunOutput, verbose: bool) {
    print!("{}", output.stdout);
    eprint!("{}", output.stderr);

    if verbose {
        eprintln!();
        eprintln!("{}:", "Stages".bold());
        for report in &output.reports {
            let code = report
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            eprintln!(
                "  {} {} (exit {}, {:.2}s)",
                "✓".green(),
                report.program.bold(),
                code,
                report.duration.as_secs_f64()
            );
            if !report.stderr.is_empty() && report.index + 1 < output.reports.len() {
                eprintln!("{}", report.stderr.dimmed());
            }
        }
    }
}
