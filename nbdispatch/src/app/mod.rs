// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod commands;
pub mod dispatcher;
pub mod errors;
pub mod handlers;
pub mod ports;
pub mod services;
pub mod types;

use std::sync::Arc;

use ports::{ClockPort, CommandRunnerPort, OutputPort};
use services::Stack;
use types::{DispatchSettings, EnvSnapshot};

/// Per-invocation state built once in `main`; nothing below reads the
/// process environment directly.
#[derive(Clone)]
pub struct AppContext {
    pub stack: Stack,
    pub env: EnvSnapshot,
    pub settings: DispatchSettings,
    pub runner: Arc<dyn CommandRunnerPort>,
    pub clock: Arc<dyn ClockPort>,
    pub output: Arc<dyn OutputPort>,
}
