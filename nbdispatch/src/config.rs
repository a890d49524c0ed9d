// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::app::types::{DispatchSettings, StackImages, ToolNames};

const APP_DIR_NAME: &str = "nbdispatch";
const CONFIG_FILE_NAME: &str = "nbdispatch.toml";
pub const CONFIG_ENV_VAR: &str = "NBDISPATCH_CONFIG_PATH";

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    provider: Option<String>,
    network: Option<String>,
    subnetwork: Option<String>,
    zones: Option<String>,
    verbose: Option<bool>,
    #[serde(default)]
    images: FileImages,
    #[serde(default)]
    tools: FileTools,
}

#[derive(Debug, Default, Deserialize)]
struct FileImages {
    researcher_workbench: Option<String>,
    terra_classic: Option<String>,
    terra_cli: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileTools {
    dsub: Option<String>,
    gsutil: Option<String>,
    gcloud: Option<String>,
    terra: Option<String>,
}

#[derive(Debug)]
pub struct Config {
    pub settings: DispatchSettings,
    pub verbose: bool,
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Override,
    Env,
    ConfigFile,
    Default,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSource::Override => "override",
            ConfigSource::Env => "env",
            ConfigSource::ConfigFile => "config",
            ConfigSource::Default => "default",
        }
    }
}

#[derive(Debug)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

#[derive(Debug)]
pub struct ConfigReport {
    pub config_path: Option<PathBuf>,
    pub config_path_source: Option<ConfigSource>,
    pub config_file_present: bool,
    pub verbose: ConfigValue<bool>,
    /// Dotted key (`images.terra_cli`) with the value that won.
    pub values: Vec<(&'static str, ConfigValue<String>)>,
}

#[derive(Debug)]
pub struct LoadResult {
    pub config: Config,
    pub report: ConfigReport,
}

#[derive(Debug, Default)]
pub struct Overrides {
    pub verbose: Option<bool>,
}

pub fn load(config_path_override: Option<PathBuf>, overrides: Overrides) -> Result<Config> {
    Ok(load_with_report(config_path_override, overrides)?.config)
}

pub fn load_with_report(
    config_path_override: Option<PathBuf>,
    overrides: Overrides,
) -> Result<LoadResult> {
    let (config_path, config_path_source, required) = match config_path_override {
        Some(path) => (Some(expand_path(path)), Some(ConfigSource::Override), true),
        None => match config_path_from_env()? {
            Some(path) => (Some(expand_path(path)), Some(ConfigSource::Env), true),
            None => match default_config_path().ok() {
                Some(path) => (Some(path), Some(ConfigSource::Default), false),
                None => (None, None, false),
            },
        },
    };
    let config_file_present = config_path
        .as_deref()
        .map(|path| path.exists())
        .unwrap_or(false);

    let file_config = match config_path.as_deref() {
        Some(path) => read_config_file(path, required)?,
        None => FileConfig::default(),
    };

    let (verbose, verbose_source) = match overrides.verbose {
        Some(verbose) => (verbose, ConfigSource::Override),
        None => match file_config.verbose {
            Some(verbose) => (verbose, ConfigSource::ConfigFile),
            None => (false, ConfigSource::Default),
        },
    };

    let defaults = DispatchSettings::default();
    let mut values = Vec::new();
    let mut pick = |key: &'static str, raw: Option<String>, default: String| -> Result<String> {
        let entry = match raw {
            Some(value) if value.trim().is_empty() => {
                anyhow::bail!("{key} must not be empty in the config file");
            }
            Some(value) => ConfigValue {
                value,
                source: ConfigSource::ConfigFile,
            },
            None => ConfigValue {
                value: default,
                source: ConfigSource::Default,
            },
        };
        let value = entry.value.clone();
        values.push((key, entry));
        Ok(value)
    };

    let provider = pick("provider", file_config.provider, defaults.provider)?;
    let network = pick("network", file_config.network, defaults.network)?;
    let subnetwork = pick("subnetwork", file_config.subnetwork, defaults.subnetwork)?;
    let zones = pick("zones", file_config.zones, defaults.zones)?;
    let images = StackImages {
        researcher_workbench: pick(
            "images.researcher_workbench",
            file_config.images.researcher_workbench,
            defaults.images.researcher_workbench,
        )?,
        terra_classic: pick(
            "images.terra_classic",
            file_config.images.terra_classic,
            defaults.images.terra_classic,
        )?,
        terra_cli: pick(
            "images.terra_cli",
            file_config.images.terra_cli,
            defaults.images.terra_cli,
        )?,
    };
    let tool = |raw: Option<String>| raw.map(|value| shellexpand::tilde(&value).into_owned());
    let tools = ToolNames {
        dsub: pick("tools.dsub", tool(file_config.tools.dsub), defaults.tools.dsub)?,
        gsutil: pick(
            "tools.gsutil",
            tool(file_config.tools.gsutil),
            defaults.tools.gsutil,
        )?,
        gcloud: pick(
            "tools.gcloud",
            tool(file_config.tools.gcloud),
            defaults.tools.gcloud,
        )?,
        terra: pick(
            "tools.terra",
            tool(file_config.tools.terra),
            defaults.tools.terra,
        )?,
    };

    let config = Config {
        settings: DispatchSettings {
            provider,
            network,
            subnetwork,
            zones,
            images,
            tools,
        },
        verbose,
        config_path: config_path.clone(),
    };

    let report = ConfigReport {
        config_path,
        config_path_source,
        config_file_present,
        verbose: ConfigValue {
            value: verbose,
            source: verbose_source,
        },
        values,
    };

    Ok(LoadResult { config, report })
}

fn read_config_file(path: &Path, required: bool) -> Result<FileConfig> {
    if !path.exists() {
        if required {
            anyhow::bail!("config file not found at {}", path.display());
        }
        return Ok(FileConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn expand_path(path: PathBuf) -> PathBuf {
    let path_string = path.to_string_lossy().to_string();
    let expanded = shellexpand::tilde(&path_string);
    PathBuf::from(expanded.as_ref())
}

fn config_path_from_env() -> Result<Option<PathBuf>> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(value) => {
            if value.is_empty() {
                anyhow::bail!("{CONFIG_ENV_VAR} is set but empty");
            }
            Ok(Some(PathBuf::from(value)))
        }
        None => Ok(None),
    }
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("failed to resolve config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}
