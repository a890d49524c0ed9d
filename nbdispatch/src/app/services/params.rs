// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::types::ExecutionParameter;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParameterParseError {
    #[error("parameter is empty; expected \"KEY VALUE\"")]
    Empty,
    #[error("parameter '{0}' has no value; expected \"KEY VALUE\"")]
    MissingValue(String),
}

/// Splits `"KEY VALUE"`: the first whitespace-delimited token is the key and
/// everything after it (inner whitespace kept) is the value.
pub fn parse_parameter(raw: &str) -> Result<ExecutionParameter, ParameterParseError> {
    let trimmed = raw.trim_start();
    if trimmed.is_empty() {
        return Err(ParameterParseError::Empty);
    }
    let (key, rest) = match trimmed.find(char::is_whitespace) {
        Some(idx) => trimmed.split_at(idx),
        None => return Err(ParameterParseError::MissingValue(trimmed.to_string())),
    };
    let value = rest.trim_start();
    if value.is_empty() {
        return Err(ParameterParseError::MissingValue(key.to_string()));
    }
    Ok(ExecutionParameter::new(key, value))
}

/// Text before the first '@'; the whole input when there is none.
pub fn email_local_part(email: &str) -> &str {
    match email.split_once('@') {
        Some((local, _)) => local,
        None => email,
    }
}
