// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde_json::{Value, json};

use crate::app::commands::CommandResult;
use crate::app::errors::{AppError, AppResult};

pub fn result_to_json(result: &CommandResult) -> AppResult<Value> {
    let plan = serde_json::to_value(result.plan())
        .map_err(|err| AppError::internal_error(err.to_string()))?;
    Ok(match result {
        CommandResult::DryRun { .. } => json!({
            "dryRun": true,
            "plan": plan,
        }),
        CommandResult::Submitted { exit_code, .. } => json!({
            "dryRun": false,
            "plan": plan,
            "exitCode": exit_code,
        }),
    })
}
