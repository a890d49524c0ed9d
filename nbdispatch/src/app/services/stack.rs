// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use serde::Serialize;

use crate::app::types::{EnvBinding, EnvSnapshot, StackImages};

pub const WORKSPACE_CDR: &str = "WORKSPACE_CDR";
pub const WORKSPACE_BUCKET: &str = "WORKSPACE_BUCKET";
pub const WORKSPACE_NAMESPACE: &str = "WORKSPACE_NAMESPACE";
pub const GOOGLE_PROJECT: &str = "GOOGLE_PROJECT";
pub const OWNER_EMAIL: &str = "OWNER_EMAIL";

/// Variables forwarded into the job container on the env-driven stacks.
const FORWARDED_ENV_VARS: [&str; 4] = [
    GOOGLE_PROJECT,
    WORKSPACE_BUCKET,
    WORKSPACE_CDR,
    WORKSPACE_NAMESPACE,
];

/// Bucket reference used on the CLI-driven stack when none is given.
pub const DEFAULT_BUCKET_REFERENCE: &str = "blob_data_autodelete_after_one_week";

/// Hosting environment the dispatcher runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stack {
    /// All of Us Researcher Workbench; exposes a curated data repository.
    ResearcherWorkbench,
    /// Terra on GCP (app.terra.bio); exposes the workspace bucket.
    TerraClassic,
    /// Multi-cloud Terra, driven through the `terra` CLI.
    TerraCli,
}

impl Stack {
    /// Precedence order matters: the data-reference marker wins over the
    /// bucket marker, and anything else is the CLI-driven stack.
    pub fn classify(env: &EnvSnapshot) -> Stack {
        if env.contains(WORKSPACE_CDR) {
            Stack::ResearcherWorkbench
        } else if env.contains(WORKSPACE_BUCKET) {
            Stack::TerraClassic
        } else {
            Stack::TerraCli
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stack::ResearcherWorkbench => "researcher_workbench",
            Stack::TerraClassic => "terra_classic",
            Stack::TerraCli => "terra_cli",
        }
    }

    pub fn default_image(self, images: &StackImages) -> &str {
        match self {
            Stack::ResearcherWorkbench => &images.researcher_workbench,
            Stack::TerraClassic => &images.terra_classic,
            Stack::TerraCli => &images.terra_cli,
        }
    }

    pub fn uses_bucket_reference(self) -> bool {
        match self {
            Stack::ResearcherWorkbench | Stack::TerraClassic => false,
            Stack::TerraCli => true,
        }
    }
}

/// `--env` bindings passed to the batch job. Unset variables are skipped.
pub fn env_bindings(stack: Stack, env: &EnvSnapshot) -> Vec<EnvBinding> {
    match stack {
        Stack::ResearcherWorkbench | Stack::TerraClassic => FORWARDED_ENV_VARS
            .iter()
            .filter_map(|name| {
                env.get(name).map(|value| EnvBinding {
                    name: (*name).to_string(),
                    value: value.to_string(),
                })
            })
            .collect(),
        Stack::TerraCli => Vec::new(),
    }
}
