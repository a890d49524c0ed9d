// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ShellSplitError {
    #[error("unterminated single quote")]
    UnterminatedSingleQuote,
    #[error("unterminated double quote")]
    UnterminatedDoubleQuote,
}

/// Wraps `p` in single quotes, escaping embedded single quotes.
pub fn sh_escape(p: &str) -> String {
    let mut out = String::from("'");
    out.push_str(&p.replace('\'', r"'\''"));
    out.push('\'');
    out
}

fn is_safe_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '_' | '-')
}

/// Quotes only when the word would not survive the shell as-is.
pub fn shell_quote(word: &str) -> String {
    if word.is_empty() {
        return "''".to_string();
    }
    if word.chars().all(is_safe_char) {
        return word.to_string();
    }
    sh_escape(word)
}

/// POSIX-style word splitting: no expansion, quotes removed, backslash
/// escapes honoured outside single quotes.
pub fn split_shell_words(input: &str) -> Result<Vec<String>, ShellSplitError> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_word = false;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => buf.push(c),
                        None => return Err(ShellSplitError::UnterminatedSingleQuote),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.peek().copied() {
                            Some(next @ ('"' | '\\' | '$' | '`')) => {
                                buf.push(next);
                                chars.next();
                            }
                            Some('\n') => {
                                chars.next();
                            }
                            _ => buf.push('\\'),
                        },
                        Some(c) => buf.push(c),
                        None => return Err(ShellSplitError::UnterminatedDoubleQuote),
                    }
                }
            }
            '\\' => match chars.next() {
                Some('\n') => {}
                Some(c) => {
                    in_word = true;
                    buf.push(c);
                }
                None => {
                    in_word = true;
                    buf.push('\\');
                }
            },
            c if c.is_whitespace() => {
                if in_word {
                    out.push(std::mem::take(&mut buf));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                buf.push(c);
            }
        }
    }

    if in_word {
        out.push(buf);
    }
    Ok(out)
}

const LINE_CONTINUATION: &str = " \\\n";

/// Fully assembled submission command, one flag group per line. Printed
/// with `\`-newline continuations; split line by line for argv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    lines: Vec<String>,
    text: String,
}

impl CommandLine {
    pub fn from_lines(lines: Vec<String>) -> Self {
        let text = lines.join(LINE_CONTINUATION);
        Self { lines, text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn to_argv(&self) -> Result<Vec<String>, ShellSplitError> {
        let mut argv = Vec::new();
        for line in &self.lines {
            argv.extend(split_shell_words(line)?);
        }
        Ok(argv)
    }
}

impl Serialize for CommandLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
