//! Locating the check enclosing the cursor

use crate::buffer::Buffer;
use crate::common::config::SourceConfig;

/// A check definition found in a buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRef {
    pub name: String,
    /// 1-based line of the defining form
    pub line: u32,
}

/// Strategy for resolving which check the cursor is inside
pub trait CheckIndex {
    fn check_at(&self, buffer: &Buffer, offset: usize) -> Option<CheckRef>;
}

/// Scans backward from the cursor for the nearest line opening a top-level
/// form at column zero. The cursor counts as inside a check only when that
/// form is one of the configured check forms; any other top-level form
/// shadows the checks above it.
#[derive(Debug, Clone)]
pub struct FormScanIndex {
    check_forms: Vec<String>,
}

impl FormScanIndex {
    pub fn new(check_forms: Vec<String>) -> Self {
        Self { check_forms }
    }

    pub fn from_config(source: &SourceConfig) -> Self {
        Self::new(source.check_forms.clone())
    }

    /// Read the head symbol and check name off a form's opening line
    fn parse_head(&self, text: &str, line: u32) -> Option<CheckRef> {
        let mut tokens = text[1..].split_whitespace();
        let head = tokens.next()?;
        if !self.check_forms.iter().any(|f| f == head) {
            return None;
        }
        let name = tokens
            .find(|tok| !tok.starts_with('^'))?
            .trim_end_matches(|c: char| matches!(c, ')' | ']' | '}'));
        if name.is_empty() {
            return None;
        }
        Some(CheckRef {
            name: name.to_string(),
            line,
        })
    }
}

impl CheckIndex for FormScanIndex {
    fn check_at(&self, buffer: &Buffer, offset: usize) -> Option<CheckRef> {
        let mut line = buffer.line_of(offset);
        loop {
            let text = buffer.line_text(line);
            if text.starts_with('(') {
                return self.parse_head(text, line);
            }
            if line == 1 {
                return None;
            }
            line -= 1;
        }
    }
}
