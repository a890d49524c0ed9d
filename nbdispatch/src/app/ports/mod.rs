// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use time::OffsetDateTime;

use crate::app::commands::CommandResult;
use crate::app::errors::{AppError, AppResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecCapture {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

impl ExecCapture {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Where a child started by [`CommandRunnerPort::run`] writes its stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildStdout {
    Inherit,
    /// Keeps our own stdout clean for machine-readable output.
    Stderr,
}

/// External program execution boundary. Calls are blocking and strictly
/// sequential; nothing here retries.
pub trait CommandRunnerPort: Send + Sync {
    /// Runs to completion with stdout/stderr captured.
    fn capture(&self, program: &str, args: &[String]) -> AppResult<ExecCapture>;

    /// Runs to completion with inherited stdin/stderr and returns the exit
    /// code.
    fn run(&self, program: &str, args: &[String], stdout: ChildStdout) -> AppResult<i32>;
}

/// Time source boundary, so timestamped names are testable.
pub trait ClockPort: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

pub trait OutputPort: Send + Sync {
    fn render(&self, result: &CommandResult) -> AppResult<()>;
    fn render_error(&self, error: &AppError) -> AppResult<()>;
    fn info(&self, message: &str) -> AppResult<()>;
    fn child_stdout(&self) -> ChildStdout;
}
