// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::types::ExecutionParameter;

mod results;

pub use results::{CommandResult, DispatchPlan};

#[derive(Debug, Clone)]
pub enum Command {
    RunNotebook(RunNotebookCommand),
}

/// One notebook execution request, fully parsed from the command line.
#[derive(Debug, Clone)]
pub struct RunNotebookCommand {
    pub notebook_to_run: String,
    pub output_notebook: Option<String>,
    pub output_path: Option<String>,
    pub name: Option<String>,
    pub logging: Option<String>,
    pub image: Option<String>,
    pub boot_disk_size: u32,
    pub start_timeout: u32,
    pub parameters: Vec<ExecutionParameter>,
    pub parameters_file: Option<String>,
    pub packages_to_install: Vec<String>,
    pub passthrough: Vec<String>,
    pub dry_run: bool,
    pub output_bucket_reference: Option<String>,
}
