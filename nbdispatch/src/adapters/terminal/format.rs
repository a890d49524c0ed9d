// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::commands::DispatchPlan;

pub fn format_dry_run(plan: &DispatchPlan) -> String {
    let mut out = String::new();
    if let Some(local) = plan.staged_from.as_deref() {
        out.push_str(&format!(
            "Would stage {local} to {}\n",
            plan.notebook_to_run
        ));
    }
    out.push_str(&format!("dsub command: {}\n", plan.command));
    out.push_str("Dry run - exiting.\n");
    out
}

pub fn format_submitted(plan: &DispatchPlan, exit_code: i32) -> String {
    if exit_code == 0 {
        format!(
            "Submitted {}.\nResults: {}\nLogs: {}\n",
            plan.job_name, plan.output_path, plan.logging_path
        )
    } else {
        format!("dsub exited with status {exit_code}\n")
    }
}
