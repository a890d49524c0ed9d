// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::app::errors::{AppError, AppResult, EXIT_CODE_OTHER};
use crate::app::ports::CommandRunnerPort;
use crate::app::services::params::email_local_part;
use crate::app::services::stack::{
    DEFAULT_BUCKET_REFERENCE, GOOGLE_PROJECT, OWNER_EMAIL, Stack, WORKSPACE_BUCKET,
};
use crate::app::types::{EnvSnapshot, ResolvedContext, ToolNames};

/// Read on both env-driven stacks; blank values count as missing.
const ENV_STACK_VARS: [&str; 3] = [OWNER_EMAIL, WORKSPACE_BUCKET, GOOGLE_PROJECT];

#[derive(Debug, Deserialize)]
struct TerraStatus {
    workspace: Option<TerraWorkspace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TerraWorkspace {
    google_project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TerraAuthStatus {
    user_email: Option<String>,
    service_account_email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GcloudAccount {
    account: String,
    #[serde(default)]
    status: Option<String>,
}

/// Works out who is acting and where results go, per stack.
pub struct IdentityResolver<'a> {
    runner: &'a dyn CommandRunnerPort,
    tools: &'a ToolNames,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(runner: &'a dyn CommandRunnerPort, tools: &'a ToolNames) -> Self {
        Self { runner, tools }
    }

    pub fn resolve(
        &self,
        stack: Stack,
        env: &EnvSnapshot,
        bucket_reference: Option<&str>,
    ) -> AppResult<ResolvedContext> {
        log::debug!("resolving identity for stack {}", stack.as_str());
        match stack {
            Stack::TerraCli => {
                self.resolve_from_terra(bucket_reference.unwrap_or(DEFAULT_BUCKET_REFERENCE))
            }
            Stack::ResearcherWorkbench | Stack::TerraClassic => self.resolve_from_env(stack, env),
        }
    }

    fn resolve_from_terra(&self, bucket_reference: &str) -> AppResult<ResolvedContext> {
        let status: TerraStatus = self.capture_json(
            &self.tools.terra,
            &["status", "--format", "json"],
            "workspace status",
        )?;
        let google_project = status
            .workspace
            .and_then(|workspace| workspace.google_project_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                AppError::configuration(
                    "workspace status has no google project; set a workspace with `terra workspace set`",
                )
            })?;

        let auth: TerraAuthStatus = self.capture_json(
            &self.tools.terra,
            &["auth", "status", "--format", "json"],
            "auth status",
        )?;
        let user_email = auth
            .user_email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| {
                AppError::configuration("not logged in; run `terra auth login` first")
            })?;
        let service_account = auth
            .service_account_email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| AppError::configuration("auth status has no service account email"))?;

        let bucket = self.resolve_bucket_reference(bucket_reference)?;

        Ok(ResolvedContext {
            user: email_local_part(&user_email).to_string(),
            bucket,
            service_account,
            google_project,
        })
    }

    fn resolve_bucket_reference(&self, reference: &str) -> AppResult<String> {
        let args = vec!["resolve".to_string(), format!("--name={reference}")];
        let capture = self.runner.capture(&self.tools.terra, &args)?;
        let resolved = capture.stdout_text().trim_end().to_string();
        if !capture.success() || resolved.trim().is_empty() {
            log::debug!(
                "terra resolve exited with {}: {}",
                capture.exit_code,
                capture.stderr_text().trim()
            );
            return Err(AppError::reference_resolution(format!(
                "Reference name \"{reference}\" does not resolve to a bucket in the current workspace. \
Use parameter --output_bucket_reference to pass a valid reference name to a bucket in this workspace."
            )));
        }
        log::debug!("bucket reference {reference} resolved to {resolved}");
        Ok(resolved)
    }

    fn resolve_from_env(&self, stack: Stack, env: &EnvSnapshot) -> AppResult<ResolvedContext> {
        let values = ENV_STACK_VARS.map(|name| env.non_empty(name));
        let [Some(owner_email), Some(bucket), Some(google_project)] = values else {
            let missing: Vec<&str> = ENV_STACK_VARS
                .iter()
                .zip(values)
                .filter(|(_, value)| value.is_none())
                .map(|(name, _)| *name)
                .collect();
            return Err(AppError::configuration(format!(
                "missing required environment variable(s) for the {} stack: {}",
                stack.as_str(),
                missing.join(", ")
            )));
        };
        let service_account = self.active_service_account()?;

        Ok(ResolvedContext {
            user: email_local_part(owner_email).to_string(),
            bucket: bucket.to_string(),
            service_account,
            google_project: google_project.to_string(),
        })
    }

    fn active_service_account(&self) -> AppResult<String> {
        let accounts: Vec<GcloudAccount> = self.capture_json(
            &self.tools.gcloud,
            &["auth", "list", "--format", "json"],
            "account listing",
        )?;
        pick_account(accounts)
    }

    fn capture_json<T: DeserializeOwned>(
        &self,
        program: &str,
        args: &[&str],
        what: &str,
    ) -> AppResult<T> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        let capture = self.runner.capture(program, &args)?;
        if !capture.success() {
            let stderr = capture.stderr_text();
            let detail = stderr.trim();
            let message = if detail.is_empty() {
                format!("{what} query `{program} {}` failed", args.join(" "))
            } else {
                detail.to_string()
            };
            return Err(AppError::external(message, capture.exit_code));
        }
        serde_json::from_slice(&capture.stdout).map_err(|err| {
            AppError::external(
                format!("failed to parse {what} output from {program}: {err}"),
                EXIT_CODE_OTHER,
            )
        })
    }
}

fn pick_account(accounts: Vec<GcloudAccount>) -> AppResult<String> {
    match accounts.len() {
        0 => Err(AppError::configuration(
            "no authenticated accounts found; run `gcloud auth login` first",
        )),
        1 => accounts
            .into_iter()
            .next()
            .map(|account| account.account)
            .filter(|account| !account.trim().is_empty())
            .ok_or_else(|| AppError::configuration("the authenticated account has no name")),
        count => {
            let mut active = accounts.into_iter().filter(|account| {
                account
                    .status
                    .as_deref()
                    .is_some_and(|status| status.eq_ignore_ascii_case("ACTIVE"))
            });
            match (active.next(), active.next()) {
                (Some(account), None) => Ok(account.account),
                _ => Err(AppError::configuration(format!(
                    "found {count} authenticated accounts and could not pick a single active one; \
run `gcloud config set account <ACCOUNT>`"
                ))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::errors::ErrorType;
    use crate::app::ports::{ChildStdout, ExecCapture};
    use crate::app::services::stack::WORKSPACE_CDR;
    use std::sync::Mutex;

    /// Replies by matching on `program args...`; records every call.
    struct ScriptedRunner {
        replies: Vec<(String, ExecCapture)>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(replies: Vec<(&str, ExecCapture)>) -> Self {
            Self {
                replies: replies
                    .into_iter()
                    .map(|(cmd, capture)| (cmd.to_string(), capture))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunnerPort for ScriptedRunner {
        fn capture(&self, program: &str, args: &[String]) -> AppResult<ExecCapture> {
            let line = format!("{program} {}", args.join(" "));
            self.calls.lock().unwrap().push(line.clone());
            self.replies
                .iter()
                .find(|(cmd, _)| *cmd == line)
                .map(|(_, capture)| capture.clone())
                .ok_or_else(|| AppError::internal_error(format!("unexpected command: {line}")))
        }

        fn run(&self, program: &str, args: &[String], _stdout: ChildStdout) -> AppResult<i32> {
            Err(AppError::internal_error(format!(
                "unexpected run: {program} {}",
                args.join(" ")
            )))
        }
    }

    fn ok(stdout: &str) -> ExecCapture {
        ExecCapture {
            stdout: stdout.as_bytes().to_vec(),
            stderr: Vec::new(),
            exit_code: 0,
        }
    }

    fn failed(stderr: &str, exit_code: i32) -> ExecCapture {
        ExecCapture {
            stdout: Vec::new(),
            stderr: stderr.as_bytes().to_vec(),
            exit_code,
        }
    }

    const TERRA_STATUS: &str = r#"{"workspace":{"googleProjectId":"terra-proj","id":"ws"}}"#;
    const TERRA_AUTH: &str =
        r#"{"userEmail":"carol@example.org","serviceAccountEmail":"pet-1@terra-proj.iam.gserviceaccount.com"}"#;

    #[test]
    fn terra_stack_reads_identity_from_cli_and_resolves_reference() {
        let runner = ScriptedRunner::new(vec![
            ("terra status --format json", ok(TERRA_STATUS)),
            ("terra auth status --format json", ok(TERRA_AUTH)),
            (
                "terra resolve --name=blob_data_autodelete_after_one_week",
                ok("gs://autodelete-bucket\n"),
            ),
        ]);
        let tools = ToolNames::default();
        let ctx = IdentityResolver::new(&runner, &tools)
            .resolve(Stack::TerraCli, &EnvSnapshot::default(), None)
            .unwrap();
        assert_eq!(
            ctx,
            ResolvedContext {
                user: "carol".to_string(),
                bucket: "gs://autodelete-bucket".to_string(),
                service_account: "pet-1@terra-proj.iam.gserviceaccount.com".to_string(),
                google_project: "terra-proj".to_string(),
            }
        );
    }

    #[test]
    fn terra_stack_fails_on_unresolved_reference() {
        let runner = ScriptedRunner::new(vec![
            ("terra status --format json", ok(TERRA_STATUS)),
            ("terra auth status --format json", ok(TERRA_AUTH)),
            ("terra resolve --name=scratch", failed("not found", 1)),
        ]);
        let tools = ToolNames::default();
        let err = IdentityResolver::new(&runner, &tools)
            .resolve(Stack::TerraCli, &EnvSnapshot::default(), Some("scratch"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorType::ReferenceResolution);
        assert!(err.message.contains("\"scratch\""));
        assert!(err.message.contains("--output_bucket_reference"));
    }

    #[test]
    fn terra_status_failure_propagates_tool_exit_code() {
        let runner = ScriptedRunner::new(vec![(
            "terra status --format json",
            failed("terra: not logged in", 3),
        )]);
        let tools = ToolNames::default();
        let err = IdentityResolver::new(&runner, &tools)
            .resolve(Stack::TerraCli, &EnvSnapshot::default(), None)
            .unwrap_err();
        assert_eq!(err.kind, ErrorType::ExternalTool);
        assert_eq!(err.exit_code, 3);
        assert_eq!(err.message, "terra: not logged in");
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn env_stack_reads_owner_and_bucket_from_environment() {
        let runner = ScriptedRunner::new(vec![(
            "gcloud auth list --format json",
            ok(r#"[{"account":"pet-9@proj.iam.gserviceaccount.com","status":"ACTIVE"}]"#),
        )]);
        let tools = ToolNames::default();
        let env = EnvSnapshot::from_vars([
            (OWNER_EMAIL, "bob@x.org"),
            (WORKSPACE_BUCKET, "gs://ws-bucket"),
            (GOOGLE_PROJECT, "proj"),
        ]);
        let ctx = IdentityResolver::new(&runner, &tools)
            .resolve(Stack::TerraClassic, &env, None)
            .unwrap();
        assert_eq!(ctx.user, "bob");
        assert_eq!(ctx.bucket, "gs://ws-bucket");
        assert_eq!(ctx.google_project, "proj");
        assert_eq!(ctx.service_account, "pet-9@proj.iam.gserviceaccount.com");
    }

    #[test]
    fn workbench_stack_resolves_with_blank_data_reference() {
        let runner = ScriptedRunner::new(vec![(
            "gcloud auth list --format json",
            ok(r#"[{"account":"pet-2@aou-proj.iam.gserviceaccount.com","status":"ACTIVE"}]"#),
        )]);
        let tools = ToolNames::default();
        let env = EnvSnapshot::from_vars([
            (OWNER_EMAIL, "dana@researchallofus.org"),
            (WORKSPACE_BUCKET, "gs://fc-secure-ws"),
            (GOOGLE_PROJECT, "aou-proj"),
            (WORKSPACE_CDR, ""),
        ]);
        let ctx = IdentityResolver::new(&runner, &tools)
            .resolve(Stack::ResearcherWorkbench, &env, None)
            .unwrap();
        assert_eq!(
            ctx,
            ResolvedContext {
                user: "dana".to_string(),
                bucket: "gs://fc-secure-ws".to_string(),
                service_account: "pet-2@aou-proj.iam.gserviceaccount.com".to_string(),
                google_project: "aou-proj".to_string(),
            }
        );
    }

    #[test]
    fn env_stack_reports_every_missing_variable() {
        let runner = ScriptedRunner::new(Vec::new());
        let tools = ToolNames::default();
        let env = EnvSnapshot::from_vars([
            (WORKSPACE_BUCKET, "gs://b"),
            (GOOGLE_PROJECT, "  "),
            (WORKSPACE_CDR, "proj.cdr"),
        ]);
        let err = IdentityResolver::new(&runner, &tools)
            .resolve(Stack::ResearcherWorkbench, &env, None)
            .unwrap_err();
        assert_eq!(err.kind, ErrorType::Configuration);
        assert_eq!(
            err.message,
            "missing required environment variable(s) for the researcher_workbench stack: \
OWNER_EMAIL, GOOGLE_PROJECT"
        );
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn single_account_with_blank_name_is_rejected() {
        let accounts = vec![GcloudAccount {
            account: " ".to_string(),
            status: Some("ACTIVE".to_string()),
        }];
        let err = pick_account(accounts).unwrap_err();
        assert_eq!(err.kind, ErrorType::Configuration);
    }

    #[test]
    fn zero_accounts_is_a_configuration_error() {
        let err = pick_account(Vec::new()).unwrap_err();
        assert_eq!(err.kind, ErrorType::Configuration);
    }

    #[test]
    fn multiple_accounts_use_the_single_active_one() {
        let accounts = vec![
            GcloudAccount {
                account: "me@example.org".to_string(),
                status: Some(String::new()),
            },
            GcloudAccount {
                account: "pet@proj.iam.gserviceaccount.com".to_string(),
                status: Some("ACTIVE".to_string()),
            },
        ];
        assert_eq!(
            pick_account(accounts).unwrap(),
            "pet@proj.iam.gserviceaccount.com"
        );
    }

    #[test]
    fn multiple_accounts_without_active_marker_are_rejected() {
        let accounts = vec![
            GcloudAccount {
                account: "a@example.org".to_string(),
                status: None,
            },
            GcloudAccount {
                account: "b@example.org".to_string(),
                status: None,
            },
        ];
        let err = pick_account(accounts).unwrap_err();
        assert!(err.message.contains("found 2 authenticated accounts"));
    }
}
