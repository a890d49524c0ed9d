// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde::Serialize;

use crate::app::services::{CommandLine, Stack};

/// Everything a run decided before touching storage or the batch service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchPlan {
    pub stack: Stack,
    pub job_name: String,
    pub user: String,
    pub image: String,
    pub output_path: String,
    pub logging_path: String,
    pub notebook_to_run: String,
    pub staged_from: Option<String>,
    pub output_notebook: String,
    pub command: CommandLine,
}

#[derive(Debug, Clone)]
pub enum CommandResult {
    DryRun { plan: DispatchPlan },
    Submitted { plan: DispatchPlan, exit_code: i32 },
}

impl CommandResult {
    pub fn plan(&self) -> &DispatchPlan {
        match self {
            CommandResult::DryRun { plan } | CommandResult::Submitted { plan, .. } => plan,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CommandResult::DryRun { .. } => 0,
            CommandResult::Submitted { exit_code, .. } => *exit_code,
        }
    }
}
