// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::AppContext;
use crate::app::commands::*;
use crate::app::errors::{AppError, AppResult};
use crate::app::services::{
    DsubSpec, IdentityResolver, RunArea, build_dsub_command, build_papermill_command,
    build_pip_command, build_remote_command, default_run_path, env_bindings, is_remote,
    job_name_from_notebook, staged_notebook_location, timestamped_notebook_location,
};
use crate::app::types::Timestamp;

pub fn handle_run_notebook(
    ctx: &AppContext,
    cmd: RunNotebookCommand,
) -> AppResult<CommandResult> {
    let timestamp = Timestamp::from_datetime(ctx.clock.now());

    if cmd.output_bucket_reference.is_some() && !ctx.stack.uses_bucket_reference() {
        log::warn!(
            "--output_bucket_reference is ignored on the {} stack",
            ctx.stack.as_str()
        );
    }
    let resolved = IdentityResolver::new(ctx.runner.as_ref(), &ctx.settings.tools).resolve(
        ctx.stack,
        &ctx.env,
        cmd.output_bucket_reference.as_deref(),
    )?;
    log::debug!(
        "acting as {} via {} in project {}; bucket {}",
        resolved.user,
        resolved.service_account,
        resolved.google_project,
        resolved.bucket
    );

    let job_name = match cmd.name.clone() {
        Some(name) => name,
        None => job_name_from_notebook(&cmd.notebook_to_run)?,
    };
    let output_path = cmd.output_path.clone().unwrap_or_else(|| {
        default_run_path(
            &resolved.bucket,
            RunArea::Results,
            &job_name,
            &resolved.user,
            &timestamp,
        )
    });
    let logging_path = cmd.logging.clone().unwrap_or_else(|| {
        default_run_path(
            &resolved.bucket,
            RunArea::Logs,
            &job_name,
            &resolved.user,
            &timestamp,
        )
    });

    let (notebook_to_run, staged_from) = if is_remote(&cmd.notebook_to_run) {
        (cmd.notebook_to_run.clone(), None)
    } else {
        (
            staged_notebook_location(&output_path, &cmd.notebook_to_run)?,
            Some(cmd.notebook_to_run.clone()),
        )
    };
    let output_notebook = cmd
        .output_notebook
        .clone()
        .unwrap_or_else(|| timestamped_notebook_location(&notebook_to_run, &timestamp));
    let image = cmd
        .image
        .clone()
        .unwrap_or_else(|| ctx.stack.default_image(&ctx.settings.images).to_string());

    let papermill = build_papermill_command(
        cmd.start_timeout,
        &cmd.parameters,
        cmd.parameters_file.is_some(),
    );
    let pip = build_pip_command(&cmd.packages_to_install);
    let remote_command = build_remote_command(pip.as_deref(), &papermill);
    let bindings = env_bindings(ctx.stack, &ctx.env);
    let command = build_dsub_command(&DsubSpec {
        job_name: &job_name,
        provider: &ctx.settings.provider,
        boot_disk_size: cmd.boot_disk_size,
        google_project: &resolved.google_project,
        network: &ctx.settings.network,
        subnetwork: &ctx.settings.subnetwork,
        service_account: &resolved.service_account,
        user: &resolved.user,
        zones: &ctx.settings.zones,
        logging_path: &logging_path,
        image: &image,
        env_bindings: &bindings,
        notebook_to_run: &notebook_to_run,
        parameters_file: cmd.parameters_file.as_deref(),
        output_notebook: &output_notebook,
        output_path: &output_path,
        remote_command: &remote_command,
        passthrough: &cmd.passthrough,
    });

    let plan = DispatchPlan {
        stack: ctx.stack,
        job_name,
        user: resolved.user,
        image,
        output_path,
        logging_path,
        notebook_to_run,
        staged_from,
        output_notebook,
        command,
    };

    if cmd.dry_run {
        return Ok(CommandResult::DryRun { plan });
    }

    if let Some(local) = plan.staged_from.as_deref() {
        stage_notebook(ctx, local, &plan.notebook_to_run)?;
    }

    ctx.output.info(&format!("dsub command: {}", plan.command))?;
    let argv = plan.command.to_argv()?;
    let Some((_, args)) = argv.split_first() else {
        return Err(AppError::internal_error("submission command is empty"));
    };
    let exit_code = ctx
        .runner
        .run(&ctx.settings.tools.dsub, args, ctx.output.child_stdout())?;
    if exit_code != 0 {
        log::warn!("dsub exited with status {exit_code}");
    }
    Ok(CommandResult::Submitted { plan, exit_code })
}

fn stage_notebook(ctx: &AppContext, local: &str, remote: &str) -> AppResult<()> {
    log::info!("staging {local} to {remote}");
    let args = vec!["cp".to_string(), local.to_string(), remote.to_string()];
    let exit_code = ctx
        .runner
        .run(&ctx.settings.tools.gsutil, &args, ctx.output.child_stdout())?;
    if exit_code != 0 {
        return Err(AppError::external(
            format!("failed to copy notebook {local} to {remote}"),
            exit_code,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::errors::ErrorType;
    use crate::app::ports::{ChildStdout, ClockPort, CommandRunnerPort, ExecCapture, OutputPort};
    use crate::app::services::{Stack, WORKSPACE_BUCKET, WORKSPACE_CDR};
    use crate::app::types::{DispatchSettings, EnvSnapshot, ExecutionParameter};
    use std::sync::{Arc, Mutex};
    use time::OffsetDateTime;
    use time::macros::datetime;

    #[derive(Default)]
    struct FakeRunner {
        captures: Vec<(String, ExecCapture)>,
        run_codes: Vec<(String, i32)>,
        captured: Mutex<Vec<String>>,
        ran: Mutex<Vec<(String, Vec<String>, ChildStdout)>>,
    }

    impl FakeRunner {
        fn reply(mut self, line: &str, stdout: &str) -> Self {
            self.captures.push((
                line.to_string(),
                ExecCapture {
                    stdout: stdout.as_bytes().to_vec(),
                    ..ExecCapture::default()
                },
            ));
            self
        }

        fn reply_failure(mut self, line: &str, exit_code: i32) -> Self {
            self.captures.push((
                line.to_string(),
                ExecCapture {
                    exit_code,
                    ..ExecCapture::default()
                },
            ));
            self
        }

        fn run_code(mut self, program: &str, code: i32) -> Self {
            self.run_codes.push((program.to_string(), code));
            self
        }

        fn ran(&self) -> Vec<(String, Vec<String>, ChildStdout)> {
            self.ran.lock().unwrap().clone()
        }
    }

    impl CommandRunnerPort for FakeRunner {
        fn capture(&self, program: &str, args: &[String]) -> AppResult<ExecCapture> {
            let line = format!("{program} {}", args.join(" "));
            self.captured.lock().unwrap().push(line.clone());
            self.captures
                .iter()
                .find(|(cmd, _)| *cmd == line)
                .map(|(_, capture)| capture.clone())
                .ok_or_else(|| AppError::internal_error(format!("unexpected capture: {line}")))
        }

        fn run(&self, program: &str, args: &[String], stdout: ChildStdout) -> AppResult<i32> {
            self.ran
                .lock()
                .unwrap()
                .push((program.to_string(), args.to_vec(), stdout));
            Ok(self
                .run_codes
                .iter()
                .find(|(name, _)| name == program)
                .map(|(_, code)| *code)
                .unwrap_or(0))
        }
    }

    struct FixedClock;

    impl ClockPort for FixedClock {
        fn now(&self) -> OffsetDateTime {
            datetime!(2024-01-02 03:04:05 UTC)
        }
    }

    #[derive(Default)]
    struct RecordingOutput {
        infos: Mutex<Vec<String>>,
        machine_readable: bool,
    }

    impl OutputPort for RecordingOutput {
        fn render(&self, _result: &CommandResult) -> AppResult<()> {
            Ok(())
        }

        fn render_error(&self, _error: &AppError) -> AppResult<()> {
            Ok(())
        }

        fn info(&self, message: &str) -> AppResult<()> {
            self.infos.lock().unwrap().push(message.to_string());
            Ok(())
        }

        fn child_stdout(&self) -> ChildStdout {
            if self.machine_readable {
                ChildStdout::Stderr
            } else {
                ChildStdout::Inherit
            }
        }
    }

    const GCLOUD_ACCOUNTS: &str =
        r#"[{"account":"pet-1@proj.iam.gserviceaccount.com","status":"ACTIVE"}]"#;

    fn classic_env() -> EnvSnapshot {
        EnvSnapshot::from_vars([
            ("OWNER_EMAIL", "alice@example.org"),
            (WORKSPACE_BUCKET, "gs://ws-bucket"),
            ("GOOGLE_PROJECT", "proj"),
            ("WORKSPACE_NAMESPACE", "lab"),
        ])
    }

    fn classic_runner() -> FakeRunner {
        FakeRunner::default().reply("gcloud auth list --format json", GCLOUD_ACCOUNTS)
    }

    fn context(
        env: EnvSnapshot,
        runner: Arc<FakeRunner>,
        output: Arc<RecordingOutput>,
    ) -> AppContext {
        AppContext {
            stack: Stack::classify(&env),
            env,
            settings: DispatchSettings::default(),
            runner,
            clock: Arc::new(FixedClock),
            output,
        }
    }

    fn command(notebook: &str) -> RunNotebookCommand {
        RunNotebookCommand {
            notebook_to_run: notebook.to_string(),
            output_notebook: None,
            output_path: None,
            name: None,
            logging: None,
            image: None,
            boot_disk_size: 60,
            start_timeout: 300,
            parameters: Vec::new(),
            parameters_file: None,
            packages_to_install: Vec::new(),
            passthrough: Vec::new(),
            dry_run: true,
            output_bucket_reference: None,
        }
    }

    #[test]
    fn classic_dry_run_of_remote_notebook_has_no_side_effects() {
        let runner = Arc::new(classic_runner());
        let output = Arc::new(RecordingOutput::default());
        let ctx = context(classic_env(), runner.clone(), output.clone());

        let result = handle_run_notebook(&ctx, command("gs://bucket/n.ipynb")).unwrap();
        let CommandResult::DryRun { plan } = result else {
            panic!("expected a dry run");
        };
        assert_eq!(plan.stack, Stack::TerraClassic);
        assert_eq!(plan.job_name, "n");
        assert_eq!(plan.user, "alice");
        assert_eq!(plan.image, ctx.settings.images.terra_classic);
        assert_eq!(plan.notebook_to_run, "gs://bucket/n.ipynb");
        assert_eq!(plan.staged_from, None);
        assert_eq!(plan.output_notebook, "gs://bucket/n_20240102_030405.ipynb");
        assert_eq!(
            plan.output_path,
            "gs://ws-bucket/dsub/results/n/alice/20240102/030405"
        );
        assert_eq!(
            plan.logging_path,
            "gs://ws-bucket/dsub/logs/n/alice/20240102/030405"
        );
        let text = plan.command.as_str();
        assert!(text.contains(&ctx.settings.images.terra_classic));
        assert!(text.contains("--env WORKSPACE_NAMESPACE=lab"));
        assert!(!text.contains("input_notebook"));
        assert!(runner.ran().is_empty());
        assert!(output.infos.lock().unwrap().is_empty());
    }

    #[test]
    fn unresolved_bucket_reference_never_submits() {
        let runner = Arc::new(
            FakeRunner::default()
                .reply(
                    "terra status --format json",
                    r#"{"workspace":{"googleProjectId":"p"}}"#,
                )
                .reply(
                    "terra auth status --format json",
                    r#"{"userEmail":"bob@x.org","serviceAccountEmail":"sa@p.iam.gserviceaccount.com"}"#,
                )
                .reply_failure("terra resolve --name=missing_ref", 1),
        );
        let output = Arc::new(RecordingOutput::default());
        let ctx = context(EnvSnapshot::default(), runner.clone(), output);

        let mut cmd = command("local.ipynb");
        cmd.dry_run = false;
        cmd.output_bucket_reference = Some("missing_ref".to_string());
        let err = handle_run_notebook(&ctx, cmd).unwrap_err();

        assert_eq!(err.kind, ErrorType::ReferenceResolution);
        assert!(err.message.contains("missing_ref"));
        assert!(runner.ran().is_empty());
    }

    #[test]
    fn local_notebook_is_staged_then_submitted() {
        let runner = Arc::new(classic_runner().run_code("dsub", 3));
        let output = Arc::new(RecordingOutput::default());
        let ctx = context(classic_env(), runner.clone(), output.clone());

        let mut cmd = command("work/My Notebook.ipynb");
        cmd.dry_run = false;
        cmd.parameters = vec![ExecutionParameter::new("alpha", "0.5")];
        let result = handle_run_notebook(&ctx, cmd).unwrap();

        assert_eq!(result.exit_code(), 3);
        let plan = result.plan();
        assert_eq!(plan.job_name, "My_Notebook");
        let staged =
            "gs://ws-bucket/dsub/results/My_Notebook/alice/20240102/030405/input_notebook/My Notebook.ipynb";
        assert_eq!(plan.notebook_to_run, staged);
        assert_eq!(plan.staged_from.as_deref(), Some("work/My Notebook.ipynb"));

        let ran = runner.ran();
        assert_eq!(ran.len(), 2);
        assert_eq!(ran[0].0, "gsutil");
        assert_eq!(
            ran[0].1,
            vec![
                "cp".to_string(),
                "work/My Notebook.ipynb".to_string(),
                staged.to_string()
            ]
        );
        assert_eq!(ran[1].0, "dsub");
        assert_eq!(ran[1].1[0], "--name");
        assert_eq!(ran[1].1[1], "My_Notebook");
        assert!(ran[1].1.contains(&format!("NOTEBOOK_TO_RUN={staged}")));

        assert!(ran.iter().all(|(_, _, stdout)| *stdout == ChildStdout::Inherit));

        let infos = output.infos.lock().unwrap();
        assert_eq!(infos.len(), 1);
        assert!(infos[0].starts_with("dsub command: dsub \\\n"));
    }

    #[test]
    fn machine_readable_output_routes_tool_stdout_to_stderr() {
        let runner = Arc::new(classic_runner());
        let output = Arc::new(RecordingOutput {
            machine_readable: true,
            ..RecordingOutput::default()
        });
        let ctx = context(classic_env(), runner.clone(), output);

        let mut cmd = command("nb.ipynb");
        cmd.dry_run = false;
        let result = handle_run_notebook(&ctx, cmd).unwrap();

        assert_eq!(result.exit_code(), 0);
        let ran = runner.ran();
        let programs: Vec<&str> = ran.iter().map(|(program, _, _)| program.as_str()).collect();
        assert_eq!(programs, vec!["gsutil", "dsub"]);
        assert!(ran.iter().all(|(_, _, stdout)| *stdout == ChildStdout::Stderr));
    }

    #[test]
    fn workbench_dry_run_forwards_data_reference() {
        let runner = Arc::new(classic_runner());
        let output = Arc::new(RecordingOutput::default());
        let env = EnvSnapshot::from_vars([
            ("OWNER_EMAIL", "alice@researchallofus.org"),
            (WORKSPACE_BUCKET, "gs://fc-secure-ws"),
            ("GOOGLE_PROJECT", "aou-proj"),
            (WORKSPACE_CDR, "proj.cdr"),
        ]);
        let ctx = context(env, runner.clone(), output);

        let result = handle_run_notebook(&ctx, command("gs://fc-secure-ws/n.ipynb")).unwrap();
        let CommandResult::DryRun { plan } = result else {
            panic!("expected a dry run");
        };
        assert_eq!(plan.stack, Stack::ResearcherWorkbench);
        assert_eq!(plan.user, "alice");
        assert_eq!(plan.image, ctx.settings.images.researcher_workbench);
        assert_eq!(
            plan.output_path,
            "gs://fc-secure-ws/dsub/results/n/alice/20240102/030405"
        );
        let text = plan.command.as_str();
        assert!(text.contains("--project aou-proj"));
        assert!(text.contains("--env WORKSPACE_CDR=proj.cdr"));
        assert!(runner.ran().is_empty());
    }

    #[test]
    fn failed_staging_stops_before_submission() {
        let runner = Arc::new(classic_runner().run_code("gsutil", 7));
        let output = Arc::new(RecordingOutput::default());
        let ctx = context(classic_env(), runner.clone(), output);

        let mut cmd = command("nb.ipynb");
        cmd.dry_run = false;
        let err = handle_run_notebook(&ctx, cmd).unwrap_err();

        assert_eq!(err.kind, ErrorType::ExternalTool);
        assert_eq!(err.exit_code, 7);
        let ran = runner.ran();
        assert_eq!(ran.len(), 1);
        assert_eq!(ran[0].0, "gsutil");
    }

    #[test]
    fn packages_and_overrides_shape_the_command() {
        let runner = Arc::new(classic_runner());
        let output = Arc::new(RecordingOutput::default());
        let ctx = context(classic_env(), runner, output);

        let mut cmd = command("gs://bucket/n.ipynb");
        cmd.name = Some("nightly".to_string());
        cmd.output_notebook = Some("gs://out/result.ipynb".to_string());
        cmd.image = Some("custom/image:1".to_string());
        cmd.packages_to_install = vec!["seaborn".to_string()];
        cmd.passthrough = vec!["--min-ram".to_string(), "8".to_string()];
        let result = handle_run_notebook(&ctx, cmd).unwrap();
        let plan = result.plan();

        assert_eq!(plan.job_name, "nightly");
        assert_eq!(plan.output_notebook, "gs://out/result.ipynb");
        assert_eq!(plan.image, "custom/image:1");
        let argv = plan.command.to_argv().unwrap();
        let remote = argv
            .windows(2)
            .find(|w| w[0] == "--command")
            .map(|w| w[1].clone())
            .unwrap();
        assert!(remote.starts_with("cd \"${OUTPUT_PATH}\" && pip3 install seaborn && papermill"));
        assert_eq!(&argv[argv.len() - 2..], &["--min-ram", "8"]);
    }

    #[test]
    fn bad_notebook_name_fails_after_resolution() {
        let runner = Arc::new(classic_runner());
        let output = Arc::new(RecordingOutput::default());
        let ctx = context(classic_env(), runner, output);

        let err = handle_run_notebook(&ctx, command("/")).unwrap_err();
        assert_eq!(err.kind, ErrorType::InvalidArgument);
    }
}
