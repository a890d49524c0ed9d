// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::sync::Arc;

use clap::Parser;
use nbdispatch::adapters::cli::{Cli, command_from_cli};
use nbdispatch::adapters::env::capture_process_env;
use nbdispatch::adapters::json::JsonOutput;
use nbdispatch::adapters::process::SystemCommandRunner;
use nbdispatch::adapters::terminal::TerminalOutput;
use nbdispatch::adapters::time::SystemClock;
use nbdispatch::app::AppContext;
use nbdispatch::app::dispatcher::Dispatcher;
use nbdispatch::app::ports::OutputPort;
use nbdispatch::app::services::Stack;
use nbdispatch::config::{self, LoadResult, Overrides};
use nbdispatch::logging::{init_logging, log_config_report};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let LoadResult { config, report } = config::load_with_report(
        cli.config.clone(),
        Overrides {
            verbose: cli.verbose.then_some(true),
        },
    )?;
    init_logging(config.verbose);
    log_config_report(&report);

    let output: Arc<dyn OutputPort> = if cli.json {
        Arc::new(JsonOutput::new())
    } else {
        Arc::new(TerminalOutput::new())
    };
    let command = match command_from_cli(cli) {
        Ok(command) => command,
        Err(err) => {
            output.render_error(&err)?;
            std::process::exit(err.exit_code);
        }
    };

    let env = capture_process_env();
    let stack = Stack::classify(&env);
    log::info!("detected {} stack", stack.as_str());

    let ctx = AppContext {
        stack,
        env,
        settings: config.settings,
        runner: Arc::new(SystemCommandRunner::new()),
        clock: Arc::new(SystemClock::new()),
        output,
    };
    let code = Dispatcher::new(ctx).dispatch(command)?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
