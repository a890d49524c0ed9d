// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

mod command;
mod identity;
mod naming;
mod params;
mod shell;
mod stack;

pub use command::{
    DsubSpec, build_dsub_command, build_papermill_command, build_pip_command,
    build_remote_command,
};
pub use identity::IdentityResolver;
pub use naming::{
    RunArea, default_run_path, is_remote, job_name_from_notebook, staged_notebook_location,
    timestamped_notebook_location,
};
pub use params::{ParameterParseError, email_local_part, parse_parameter};
pub use shell::{CommandLine, ShellSplitError, shell_quote};
pub use stack::{
    DEFAULT_BUCKET_REFERENCE, GOOGLE_PROJECT, OWNER_EMAIL, Stack, WORKSPACE_BUCKET,
    WORKSPACE_CDR, WORKSPACE_NAMESPACE, env_bindings,
};
