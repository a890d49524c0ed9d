// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

mod format;

use crate::app::commands::CommandResult;
use crate::app::errors::{AppError, AppResult};
use crate::app::ports::{ChildStdout, OutputPort};
use format::{format_dry_run, format_submitted};

pub struct TerminalOutput;

impl TerminalOutput {
    pub fn new() -> Self {
        Self
    }
}

impl OutputPort for TerminalOutput {
    fn render(&self, result: &CommandResult) -> AppResult<()> {
        match result {
            CommandResult::DryRun { plan } => print!("{}", format_dry_run(plan)),
            CommandResult::Submitted { plan, exit_code } => {
                let summary = format_submitted(plan, *exit_code);
                if *exit_code == 0 {
                    print!("{summary}");
                } else {
                    eprint!("{summary}");
                }
            }
        }
        Ok(())
    }

    fn render_error(&self, error: &AppError) -> AppResult<()> {
        eprintln!("{}", error.message);
        Ok(())
    }

    fn info(&self, message: &str) -> AppResult<()> {
        println!("{message}");
        Ok(())
    }

    fn child_stdout(&self) -> ChildStdout {
        ChildStdout::Inherit
    }
}
