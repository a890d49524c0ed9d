// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use log::LevelFilter;

use crate::config::ConfigReport;

/// Full `env_logger` filter spec; replaces the verbosity-based default.
pub const LOG_ENV_VAR: &str = "NBDISPATCH_LOG";

pub fn init_logging(verbose: bool) {
    let spec = std::env::var(LOG_ENV_VAR).ok();
    build_logger(verbose, spec.as_deref()).init();
}

fn build_logger(verbose: bool, filter_spec: Option<&str>) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();
    builder.format_timestamp_secs();
    match filter_spec {
        Some(spec) => {
            builder.parse_filters(spec);
        }
        None if verbose => {
            builder.filter_level(LevelFilter::Debug);
        }
        None => {
            builder
                .filter_level(LevelFilter::Off)
                .filter_module("nbdispatch", LevelFilter::Info);
        }
    }
    builder
}

pub fn log_config_report(report: &ConfigReport) {
    match (&report.config_path, report.config_path_source) {
        (Some(path), Some(source)) => {
            log::debug!(
                "config path: {} (source={}, present={})",
                path.display(),
                source.as_str(),
                report.config_file_present
            );
        }
        (Some(path), None) => {
            log::debug!(
                "config path: {} (present={})",
                path.display(),
                report.config_file_present
            );
        }
        (None, _) => {
            log::debug!("config path: (none)");
        }
    }
    log::debug!(
        "config verbose: {} (source={})",
        report.verbose.value,
        report.verbose.source.as_str()
    );
    for (key, value) in &report.values {
        log::debug!(
            "config {key}: {} (source={})",
            value.value,
            value.source.as_str()
        );
    }
}
