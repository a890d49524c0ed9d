// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

mod format;

use serde_json::json;

use crate::app::commands::CommandResult;
use crate::app::errors::{AppError, AppResult};
use crate::app::ports::{ChildStdout, OutputPort};
use format::result_to_json;

/// Machine-readable output; progress messages are suppressed.
pub struct JsonOutput;

impl JsonOutput {
    pub fn new() -> Self {
        Self
    }
}

impl OutputPort for JsonOutput {
    fn render(&self, result: &CommandResult) -> AppResult<()> {
        let payload = json!({
            "ok": true,
            "result": result_to_json(result)?,
        });
        let output = serde_json::to_string_pretty(&payload)
            .map_err(|err| AppError::internal_error(err.to_string()))?;
        println!("{output}");
        Ok(())
    }

    fn render_error(&self, error: &AppError) -> AppResult<()> {
        let payload = json!({
            "ok": false,
            "errorType": error.kind.as_str(),
            "reason": error.message,
            "exitCode": error.exit_code,
        });
        let output = serde_json::to_string_pretty(&payload)
            .map_err(|err| AppError::internal_error(err.to_string()))?;
        eprintln!("{output}");
        Ok(())
    }

    fn info(&self, _message: &str) -> AppResult<()> {
        Ok(())
    }

    fn child_stdout(&self) -> ChildStdout {
        ChildStdout::Stderr
    }
}
