// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! Validate command - check a pipeline definition

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::pipeline::{PipelineDefinition, PipelineValidator};
use crate::utils::{print_error, print_success, print_warning};

/// Run the validate command
pub async fn run(pipeline_path: PathBuf, verbose: bool) -> Result<()> {
    println!("{}", "Validating pipeline...".bold());
    println!();

    if !pipeline_path.exists() {
        return Err(miette::miette!(
            "Pipeline file not found: {}",
            pipeline_path.display()
        ));
    }

    let definition = match PipelineDefinition::from_file(&pipeline_path) {
        Ok(d) => d,
        Err(e) => {
            print_error("Failed to parse pipeline");
            println!();
            return Err(e.into());
        }
    };

    print_success("Pipeline file parsed");

    let validation = PipelineValidator::validate(&definition);

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            print_error(error);
        }
    }

    if validation.has_warnings() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            print_warning(warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Pipeline summary".bold());
        println!("  Name: {}", definition.display_name());
        println!("  Stages: {}", definition.stages.len());
        for stage in &definition.stages {
            let argv = std::iter::once(stage.program.as_str())
                .chain(stage.args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            println!("    - {}", argv);
        }
    }

    println!();

    if !validation.is_valid() {
        Err(miette::miette!("Pipeline validation failed"))
    } else if validation.has_warnings() {
        println!("{}", "Pipeline is valid but has warnings.".yellow().bold());
        Ok(())
    } else {
        println!("{}", "Pipeline is valid!".green().bold());
        Ok(())
    }
}
