// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod cli;
pub mod env;
pub mod json;
pub mod process;
pub mod terminal;
pub mod time;
