// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::fmt;

use crate::app::services::{ParameterParseError, ShellSplitError};

pub const EXIT_CODE_USAGE: i32 = 2;
pub const EXIT_CODE_OTHER: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    InvalidArgument,
    Configuration,
    ReferenceResolution,
    ExternalTool,
    LocalError,
    InternalError,
}

impl ErrorType {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorType::InvalidArgument => "INVALID_ARGUMENT",
            ErrorType::Configuration => "CONFIGURATION_ERROR",
            ErrorType::ReferenceResolution => "REFERENCE_RESOLUTION_FAILED",
            ErrorType::ExternalTool => "EXTERNAL_TOOL_FAILED",
            ErrorType::LocalError => "LOCAL_ERROR",
            ErrorType::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn default_exit_code(self) -> i32 {
        match self {
            ErrorType::InvalidArgument => EXIT_CODE_USAGE,
            _ => EXIT_CODE_OTHER,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub kind: ErrorType,
    pub message: String,
    pub exit_code: i32,
}

impl AppError {
    pub fn new(kind: ErrorType, message: impl Into<String>) -> Self {
        let message = message.into();
        let exit_code = kind.default_exit_code();
        Self {
            kind,
            message,
            exit_code,
        }
    }

    pub fn with_exit_code(kind: ErrorType, message: impl Into<String>, exit_code: i32) -> Self {
        Self {
            kind,
            message: message.into(),
            exit_code,
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorType::InvalidArgument, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorType::Configuration, message)
    }

    pub fn reference_resolution(message: impl Into<String>) -> Self {
        Self::new(ErrorType::ReferenceResolution, message)
    }

    /// Failure reported by an external tool; the tool's exit code is kept
    /// so the process can exit with it unchanged.
    pub fn external(message: impl Into<String>, exit_code: i32) -> Self {
        let exit_code = if exit_code == 0 { EXIT_CODE_OTHER } else { exit_code };
        Self::with_exit_code(ErrorType::ExternalTool, message, exit_code)
    }

    pub fn local_error(message: impl Into<String>) -> Self {
        Self::new(ErrorType::LocalError, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorType::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<ParameterParseError> for AppError {
    fn from(err: ParameterParseError) -> Self {
        AppError::invalid_argument(err.to_string())
    }
}

impl From<ShellSplitError> for AppError {
    fn from(err: ShellSplitError) -> Self {
        AppError::internal_error(format!("failed to split command line: {err}"))
    }
}

pub type AppResult<T> = Result<T, AppError>;
