// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "nbdispatch",
    version,
    about = "Run a Jupyter notebook as a dsub batch job from a Terra or Researcher Workbench workspace.",
    long_about = None
)]
pub struct Cli {
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Path to a TOML config file. When omitted, nbdispatch uses NBDISPATCH_CONFIG_PATH if set, otherwise the default config file location if available."
    )]
    pub config: Option<PathBuf>,
    #[arg(short, long, help = "Enable debug logging.")]
    pub verbose: bool,
    #[arg(long, help = "Print the result as JSON.")]
    pub json: bool,

    /// Print the dsub command instead of submitting it.
    #[arg(
        long = "dry_run",
        value_name = "BOOL",
        num_args = 0..=1,
        default_value_t = true,
        default_missing_value = "true",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        conflicts_with = "nodry_run"
    )]
    pub dry_run: bool,
    /// Submit the job. Same as --dry_run=false.
    #[arg(long = "nodry_run")]
    pub nodry_run: bool,

    /// Seconds papermill waits for the kernel to start.
    #[arg(long = "start_timeout", value_name = "SECONDS", default_value_t = 300)]
    pub start_timeout: u32,
    /// YAML file with notebook parameters, passed to papermill.
    #[arg(short = 'f', long = "parameters_file", value_name = "PATH")]
    pub parameters_file: Option<String>,
    /// Notebook parameter as "KEY VALUE". Repeatable; order is kept.
    #[arg(short = 'p', long = "parameters", value_name = "KEY VALUE")]
    pub parameters: Vec<String>,
    /// Python package to pip install before running. Repeatable.
    #[arg(short = 'i', long = "packages_to_install", value_name = "PACKAGE")]
    pub packages_to_install: Vec<String>,
    /// Local path or gs:// URL of the notebook to run.
    #[arg(long = "notebook_to_run", value_name = "PATH")]
    pub notebook_to_run: String,
    /// Where to write the executed notebook. Defaults to a timestamped copy
    /// next to the input notebook.
    #[arg(long = "output_notebook", value_name = "PATH")]
    pub output_notebook: Option<String>,
    /// Directory for files the notebook writes. Defaults to a per-run
    /// directory in the workspace bucket.
    #[arg(long = "output_path", value_name = "PATH")]
    pub output_path: Option<String>,
    /// Job name. Defaults to the notebook file name without extension.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
    /// Directory for dsub logs. Defaults to a per-run directory in the
    /// workspace bucket.
    #[arg(long, value_name = "PATH")]
    pub logging: Option<String>,
    /// Container image to run in. Defaults to the workspace's notebook image.
    #[arg(long, value_name = "IMAGE")]
    pub image: Option<String>,
    /// Boot disk size in GB.
    #[arg(long = "boot_disk_size", value_name = "GB", default_value_t = 60)]
    pub boot_disk_size: u32,
    /// Workspace reference naming the results bucket (terra CLI workspaces
    /// only; default: blob_data_autodelete_after_one_week).
    #[arg(long = "output_bucket_reference", value_name = "NAME")]
    pub output_bucket_reference: Option<String>,

    /// Extra arguments passed to dsub unchanged.
    #[arg(last = true, value_name = "DSUB_ARGS")]
    pub passthrough: Vec<String>,
}

impl Cli {
    pub fn dry_run(&self) -> bool {
        self.dry_run && !self.nodry_run
    }
}
