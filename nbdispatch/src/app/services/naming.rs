// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::Path;

use crate::app::errors::{AppError, AppResult};
use crate::app::types::Timestamp;

pub const REMOTE_STORAGE_PREFIX: &str = "gs://";
const STAGING_DIR: &str = "input_notebook";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunArea {
    Results,
    Logs,
}

impl RunArea {
    fn as_str(self) -> &'static str {
        match self {
            RunArea::Results => "results",
            RunArea::Logs => "logs",
        }
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with(REMOTE_STORAGE_PREFIX)
}

fn join(base: &str, tail: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), tail)
}

/// File stem of the notebook with spaces replaced by underscores.
pub fn job_name_from_notebook(notebook: &str) -> AppResult<String> {
    let stem = Path::new(notebook)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.trim().is_empty())
        .ok_or_else(|| {
            AppError::invalid_argument(format!(
                "cannot derive a job name from notebook '{notebook}'; pass --name"
            ))
        })?;
    Ok(stem.replace(' ', "_"))
}

/// `{bucket}/dsub/{results|logs}/{job}/{user}/{date}/{time}`
pub fn default_run_path(
    bucket: &str,
    area: RunArea,
    job_name: &str,
    user: &str,
    timestamp: &Timestamp,
) -> String {
    join(
        bucket,
        &format!(
            "dsub/{}/{job_name}/{user}/{}/{}",
            area.as_str(),
            timestamp.date,
            timestamp.time
        ),
    )
}

/// Where a local notebook is uploaded before submission.
pub fn staged_notebook_location(output_path: &str, local_notebook: &str) -> AppResult<String> {
    let basename = Path::new(local_notebook)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            AppError::invalid_argument(format!(
                "notebook path '{local_notebook}' does not name a file"
            ))
        })?;
    Ok(join(output_path, &format!("{STAGING_DIR}/{basename}")))
}

/// Inserts `_{date}_{time}` before the extension of the last path segment.
pub fn timestamped_notebook_location(notebook: &str, timestamp: &Timestamp) -> String {
    let suffix = timestamp.suffix();
    let segment_start = notebook.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    let segment = &notebook[segment_start..];
    match segment.rfind('.').filter(|idx| *idx > 0) {
        Some(dot) => {
            let split = segment_start + dot;
            format!("{}_{suffix}{}", &notebook[..split], &notebook[split..])
        }
        None => format!("{notebook}_{suffix}"),
    }
}
