// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::ports::ClockPort;
use time::OffsetDateTime;

#[derive(Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl ClockPort for SystemClock {
    /// Local wall-clock time; UTC when the local offset cannot be determined.
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|err| {
            log::debug!("local offset unavailable ({err}); using UTC");
            OffsetDateTime::now_utc()
        })
    }
}
