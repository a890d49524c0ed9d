// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::collections::BTreeMap;

use time::OffsetDateTime;

/// Read-only copy of the process environment, taken once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Like `get`, but blank values count as absent.
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Single capture point for every time-derived name in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp {
    pub date: String,
    pub time: String,
}

impl Timestamp {
    pub fn new(date: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
        }
    }

    pub fn from_datetime(value: OffsetDateTime) -> Self {
        let date = format!(
            "{:04}{:02}{:02}",
            value.year(),
            u8::from(value.month()),
            value.day()
        );
        let time = format!(
            "{:02}{:02}{:02}",
            value.hour(),
            value.minute(),
            value.second()
        );
        Self { date, time }
    }

    /// `YYYYMMDD_HHMMSS`, used to suffix rendered notebooks.
    pub fn suffix(&self) -> String {
        format!("{}_{}", self.date, self.time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedContext {
    pub user: String,
    pub bucket: String,
    pub service_account: String,
    pub google_project: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionParameter {
    pub key: String,
    pub value: String,
}

impl ExecutionParameter {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvBinding {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackImages {
    pub researcher_workbench: String,
    pub terra_classic: String,
    pub terra_cli: String,
}

impl Default for StackImages {
    fn default() -> Self {
        Self {
            researcher_workbench: "us.gcr.io/broad-dsp-gcr-public/terra-jupyter-aou:2.1.6"
                .to_string(),
            terra_classic: "us.gcr.io/broad-dsp-gcr-public/terra-jupyter-gatk:2.2.7".to_string(),
            terra_cli: "us-central1-docker.pkg.dev/terra-vdevel-potent-beet-7262/my-repo/rcpu-terra"
                .to_string(),
        }
    }
}

/// Program names for the external tools, so a config file can point at
/// wrappers or absolute paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolNames {
    pub dsub: String,
    pub gsutil: String,
    pub gcloud: String,
    pub terra: String,
}

impl Default for ToolNames {
    fn default() -> Self {
        Self {
            dsub: "dsub".to_string(),
            gsutil: "gsutil".to_string(),
            gcloud: "gcloud".to_string(),
            terra: "terra".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub provider: String,
    pub network: String,
    pub subnetwork: String,
    pub zones: String,
    pub images: StackImages,
    pub tools: ToolNames,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            provider: "google-cls-v2".to_string(),
            network: "network".to_string(),
            subnetwork: "subnetwork".to_string(),
            zones: "us-central1-*".to_string(),
            images: StackImages::default(),
            tools: ToolNames::default(),
        }
    }
}
