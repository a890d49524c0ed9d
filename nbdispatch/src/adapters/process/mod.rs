// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::io;
use std::process::{Command, ExitStatus, Stdio};

use crate::app::errors::{AppError, AppResult, EXIT_CODE_OTHER};
use crate::app::ports::{ChildStdout, CommandRunnerPort, ExecCapture};

#[derive(Clone, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

fn spawn_error(program: &str, err: io::Error) -> AppError {
    match err.kind() {
        io::ErrorKind::NotFound => {
            AppError::local_error(format!("{program} not found; is it installed and on PATH?"))
        }
        _ => AppError::local_error(format!("failed to run {program}: {err}")),
    }
}

/// Signal-terminated children have no code; report them as a generic failure.
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(EXIT_CODE_OTHER)
}

impl CommandRunnerPort for SystemCommandRunner {
    fn capture(&self, program: &str, args: &[String]) -> AppResult<ExecCapture> {
        log::debug!("capturing: {program} {}", args.join(" "));
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| spawn_error(program, err))?;
        let capture = ExecCapture {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: exit_code(output.status),
        };
        log::debug!("{program} exited with {}", capture.exit_code);
        Ok(capture)
    }

    fn run(&self, program: &str, args: &[String], stdout: ChildStdout) -> AppResult<i32> {
        log::debug!("running: {program} {}", args.join(" "));
        let mut command = Command::new(program);
        command.args(args);
        if stdout == ChildStdout::Stderr {
            command.stdout(Stdio::from(io::stderr()));
        }
        let status = command
            .status()
            .map_err(|err| spawn_error(program, err))?;
        let code = exit_code(status);
        log::debug!("{program} exited with {code}");
        Ok(code)
    }
}
