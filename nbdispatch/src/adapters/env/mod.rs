// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::types::EnvSnapshot;

/// Captures the process environment once. Names or values that are not
/// valid UTF-8 are converted lossily.
pub fn capture_process_env() -> EnvSnapshot {
    EnvSnapshot::from_vars(std::env::vars_os().map(|(name, value)| {
        (
            name.to_string_lossy().into_owned(),
            value.to_string_lossy().into_owned(),
        )
    }))
}
