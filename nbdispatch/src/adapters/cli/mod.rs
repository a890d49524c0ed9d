// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

mod args;

pub use args::Cli;

use crate::app::commands::*;
use crate::app::errors::AppResult;
use crate::app::services::parse_parameter;

pub fn command_from_cli(cli: Cli) -> AppResult<Command> {
    let dry_run = cli.dry_run();
    let parameters = cli
        .parameters
        .iter()
        .map(|raw| parse_parameter(raw))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Command::RunNotebook(RunNotebookCommand {
        notebook_to_run: cli.notebook_to_run,
        output_notebook: cli.output_notebook,
        output_path: cli.output_path,
        name: cli.name,
        logging: cli.logging,
        image: cli.image,
        boot_disk_size: cli.boot_disk_size,
        start_timeout: cli.start_timeout,
        parameters,
        parameters_file: cli.parameters_file,
        packages_to_install: cli.packages_to_install,
        passthrough: cli.passthrough,
        dry_run,
        output_bucket_reference: cli.output_bucket_reference,
    }))
}
