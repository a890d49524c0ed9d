// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::AppContext;
use crate::app::commands::Command;
use crate::app::errors::AppResult;
use crate::app::handlers;

pub struct Dispatcher {
    ctx: AppContext,
}

impl Dispatcher {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    /// Runs one command and returns the process exit code.
    pub fn dispatch(&self, command: Command) -> AppResult<i32> {
        let result = match command {
            Command::RunNotebook(cmd) => handlers::handle_run_notebook(&self.ctx, cmd),
        };

        match result {
            Ok(output) => {
                self.ctx.output.render(&output)?;
                Ok(output.exit_code())
            }
            Err(err) => {
                self.ctx.output.render_error(&err)?;
                Ok(err.exit_code)
            }
        }
    }
}
