// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 shellpipe contributors

//! Pipelines and stages
//!
//! A [`Pipeline`] is an ordered chain of [`Stage`]s run one at a time, the
//! captured stdout of each feeding the stdin of the next.

mod definition;
mod executor;
mod stage;
mod validation;

pub use definition::*;
pub use executor::{Pipeline, PipelineOptions, RunOutput, StageReport};
pub use stage::{Cleanup, NoClean, RemovePaths, Stage, NO_CLEAN};
pub use validation::{PipelineValidator, ValidationResult};
