// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::services::shell::{CommandLine, sh_escape, shell_quote};
use crate::app::types::{EnvBinding, ExecutionParameter};

// Placeholders resolved by dsub inside the job, never substituted here.
pub const NOTEBOOK_TO_RUN_VAR: &str = "NOTEBOOK_TO_RUN";
pub const OUTPUT_NOTEBOOK_VAR: &str = "OUTPUT_NOTEBOOK";
pub const OUTPUT_PATH_VAR: &str = "OUTPUT_PATH";
pub const PARAMETERS_FILE_VAR: &str = "PARAMETERS_FILE";

pub fn build_papermill_command(
    start_timeout: u32,
    parameters: &[ExecutionParameter],
    has_parameters_file: bool,
) -> String {
    let mut parts = vec![
        "papermill".to_string(),
        "--start-timeout".to_string(),
        start_timeout.to_string(),
    ];
    for param in parameters {
        parts.push("--parameters".to_string());
        parts.push(shell_quote(&param.key));
        parts.push(shell_quote(&param.value));
    }
    if has_parameters_file {
        parts.push("--parameters_file".to_string());
        parts.push(format!("${{{PARAMETERS_FILE_VAR}}}"));
    }
    parts.push(format!("\"${{{NOTEBOOK_TO_RUN_VAR}}}\""));
    parts.push(format!("\"${{{OUTPUT_NOTEBOOK_VAR}}}\""));
    parts.join(" ")
}

pub fn build_pip_command(packages: &[String]) -> Option<String> {
    if packages.is_empty() {
        return None;
    }
    let names: Vec<String> = packages.iter().map(|p| shell_quote(p)).collect();
    Some(format!("pip3 install {}", names.join(" ")))
}

/// The shell expression dsub runs in the container. The trailing `true`
/// masks papermill's status so the rendered notebook is always copied back.
pub fn build_remote_command(pip: Option<&str>, papermill: &str) -> String {
    let mut chain = vec![format!("cd \"${{{OUTPUT_PATH_VAR}}}\"")];
    if let Some(pip) = pip {
        chain.push(pip.to_string());
    }
    chain.push(papermill.to_string());
    format!(
        "{}; true; cp \"${{{OUTPUT_NOTEBOOK_VAR}}}\" \"${{{OUTPUT_PATH_VAR}}}\"",
        chain.join(" && ")
    )
}

#[derive(Debug, Clone)]
pub struct DsubSpec<'a> {
    pub job_name: &'a str,
    pub provider: &'a str,
    pub boot_disk_size: u32,
    pub google_project: &'a str,
    pub network: &'a str,
    pub subnetwork: &'a str,
    pub service_account: &'a str,
    pub user: &'a str,
    pub zones: &'a str,
    pub logging_path: &'a str,
    pub image: &'a str,
    pub env_bindings: &'a [EnvBinding],
    pub notebook_to_run: &'a str,
    pub parameters_file: Option<&'a str>,
    pub output_notebook: &'a str,
    pub output_path: &'a str,
    pub remote_command: &'a str,
    pub passthrough: &'a [String],
}

pub fn build_dsub_command(spec: &DsubSpec<'_>) -> CommandLine {
    let mut lines = vec![
        "dsub".to_string(),
        format!("--name {}", shell_quote(spec.job_name)),
        format!("--provider {}", shell_quote(spec.provider)),
        format!("--boot-disk-size {}", spec.boot_disk_size),
        format!("--project {}", shell_quote(spec.google_project)),
        format!("--network {}", shell_quote(spec.network)),
        format!("--subnetwork {}", shell_quote(spec.subnetwork)),
        format!("--service-account {}", shell_quote(spec.service_account)),
        format!("--user {}", shell_quote(spec.user)),
        format!("--zones {}", shell_quote(spec.zones)),
        format!("--logging {}", shell_quote(spec.logging_path)),
        format!("--image {}", shell_quote(spec.image)),
    ];
    for binding in spec.env_bindings {
        lines.push(format!(
            "--env {}",
            shell_quote(&format!("{}={}", binding.name, binding.value))
        ));
    }
    lines.push(binding_flag(
        "--input",
        NOTEBOOK_TO_RUN_VAR,
        spec.notebook_to_run,
    ));
    if let Some(parameters_file) = spec.parameters_file {
        lines.push(binding_flag("--input", PARAMETERS_FILE_VAR, parameters_file));
    }
    lines.push(binding_flag(
        "--output",
        OUTPUT_NOTEBOOK_VAR,
        spec.output_notebook,
    ));
    lines.push(binding_flag(
        "--output-recursive",
        OUTPUT_PATH_VAR,
        spec.output_path,
    ));

    let mut last = format!("--command {}", sh_escape(spec.remote_command));
    if !spec.passthrough.is_empty() {
        let extra: Vec<String> = spec.passthrough.iter().map(|a| shell_quote(a)).collect();
        last.push(' ');
        last.push_str(&extra.join(" "));
    }
    lines.push(last);

    CommandLine::from_lines(lines)
}

fn binding_flag(flag: &str, name: &str, location: &str) -> String {
    format!("{flag} {}", shell_quote(&format!("{name}={location}")))
}
