//! In-memory buffer model
//!
//! A buffer holds the text of one source file, the cursor position, and the
//! marker set produced by the last test run. Offsets are byte offsets into
//! the text and always sit on character boundaries; lines are 1-based.

use std::path::{Path, PathBuf};

use crate::annotate::MarkerSet;
use crate::common::{Error, Result};
use crate::sexp::{self, Form};

#[derive(Debug)]
pub struct Buffer {
    name: String,
    path: Option<PathBuf>,
    text: String,
    /// Byte offset of each line start; index 0 is line 1
    line_starts: Vec<usize>,
    dirty: bool,
    point: usize,
    marks: MarkerSet,
}

impl Buffer {
    /// Open a file-backed buffer
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, &e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            line_starts: index_lines(&text),
            text,
            dirty: false,
            point: 0,
            marks: MarkerSet::new(),
        })
    }

    /// Create a buffer with no backing file
    pub fn scratch(name: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            line_starts: index_lines(text),
            text: text.to_string(),
            dirty: false,
            point: 0,
            marks: MarkerSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the buffer text, as an embedding editor would on edit.
    ///
    /// Markers hold byte positions into the old text, so they are dropped.
    pub fn update_text(&mut self, text: String) {
        self.line_starts = index_lines(&text);
        self.text = text;
        self.dirty = true;
        self.marks.clear();
        self.point = self.point.min(self.text.len());
        while !self.text.is_char_boundary(self.point) {
            self.point -= 1;
        }
    }

    /// Write the buffer back to its file if modified
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = &self.path {
            std::fs::write(path, &self.text)?;
            self.dirty = false;
        }
        Ok(())
    }

    pub fn point(&self) -> usize {
        self.point
    }

    pub fn set_point(&mut self, offset: usize) {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        self.point = offset;
    }

    /// Move the point to a 1-based line and 0-based column, clamping both.
    /// Returns the line and column actually landed on.
    pub fn goto(&mut self, line: u32, column: u32) -> (u32, u32) {
        let line = line.clamp(1, self.line_count());
        let (start, end) = self.line_span(line);
        self.point = self.text[start..end]
            .char_indices()
            .nth(column as usize)
            .map(|(i, _)| start + i)
            .unwrap_or(end);
        (line, self.column_of(self.point))
    }

    pub fn line_count(&self) -> u32 {
        self.line_starts.len() as u32
    }

    /// 1-based line containing the offset
    pub fn line_of(&self, offset: usize) -> u32 {
        let offset = offset.min(self.text.len());
        self.line_starts.partition_point(|&start| start <= offset) as u32
    }

    /// 0-based character column of the offset within its line
    pub fn column_of(&self, offset: usize) -> u32 {
        let offset = offset.min(self.text.len());
        let line = self.line_of(offset);
        let start = self.line_starts[(line - 1) as usize];
        self.text[start..offset].chars().count() as u32
    }

    /// Byte span of a line's content, excluding the line terminator.
    /// Out-of-range lines clamp to the nearest real line.
    pub fn line_span(&self, line: u32) -> (usize, usize) {
        let line = line.clamp(1, self.line_count());
        let i = (line - 1) as usize;
        let start = self.line_starts[i];
        let mut end = match self.line_starts.get(i + 1) {
            Some(&next) => next - 1,
            None => self.text.len(),
        };
        if self.text[start..end].ends_with('\r') {
            end -= 1;
        }
        (start, end)
    }

    pub fn line_text(&self, line: u32) -> &str {
        let (start, end) = self.line_span(line);
        &self.text[start..end]
    }

    pub fn marks(&self) -> &MarkerSet {
        &self.marks
    }

    pub fn marks_mut(&mut self) -> &mut MarkerSet {
        &mut self.marks
    }

    /// Namespace declared by the buffer's `(ns ...)` form, if any.
    ///
    /// Falls back to a line scan when the buffer does not parse cleanly,
    /// so a half-edited file still resolves its namespace.
    pub fn namespace(&self) -> Option<String> {
        match sexp::parse_forms(&self.text) {
            Ok(forms) => forms.iter().find_map(ns_form_name),
            Err(_) => self.text.lines().find_map(|line| {
                let rest = line.trim_start().strip_prefix("(ns")?;
                rest.split_whitespace()
                    .find(|tok| !tok.starts_with('^'))
                    .map(|tok| tok.trim_end_matches(')').to_string())
            }),
        }
    }
}

fn ns_form_name(form: &Form) -> Option<String> {
    let items = form.items()?;
    if items.first()?.as_symbol()? != "ns" {
        return None;
    }
    items[1..]
        .iter()
        .filter_map(|f| f.as_symbol())
        .find(|s| !s.starts_with('^'))
        .map(|s| s.to_string())
}

fn index_lines(text: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            starts.push(i + 1);
        }
    }
    starts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Buffer {
        Buffer::scratch(
            "core_test.clj",
            "(ns my.app.core-test)\n\n(deftest adds\n  (is (= 2 (add 1 1))))\n",
        )
    }

    #[test]
    fn test_line_index() {
        let buf = sample();
        assert_eq!(buf.line_count(), 5);
        assert_eq!(buf.line_text(1), "(ns my.app.core-test)");
        assert_eq!(buf.line_text(2), "");
        assert_eq!(buf.line_text(3), "(deftest adds");
        assert_eq!(buf.line_of(0), 1);
        assert_eq!(buf.line_of(22), 2);
        let (start, end) = buf.line_span(3);
        assert_eq!(&buf.text()[start..end], "(deftest adds");
    }

    #[test]
    fn test_goto_clamps() {
        let mut buf = sample();
        assert_eq!(buf.goto(3, 2), (3, 2));
        assert_eq!(buf.line_of(buf.point()), 3);
        assert_eq!(buf.column_of(buf.point()), 2);

        // Past the last line lands on the last line
        assert_eq!(buf.goto(99, 0).0, buf.line_count());
        // Past the end of a line lands at line end
        let (_, col) = buf.goto(1, 999);
        assert_eq!(col, buf.line_text(1).chars().count() as u32);
    }

    #[test]
    fn test_crlf_line_span_excludes_return() {
        let buf = Buffer::scratch("w.clj", "(ns a)\r\n(deftest t)\r\n");
        assert_eq!(buf.line_text(1), "(ns a)");
        assert_eq!(buf.line_text(2), "(deftest t)");
    }

    #[test]
    fn test_namespace_detection() {
        assert_eq!(sample().namespace().as_deref(), Some("my.app.core-test"));

        let with_meta = Buffer::scratch(
            "t.clj",
            "; header\n(ns ^:integration my.app.flow-test\n  (:require [clojure.test :refer :all]))\n",
        );
        assert_eq!(with_meta.namespace().as_deref(), Some("my.app.flow-test"));

        let none = Buffer::scratch("t.clj", "(deftest orphan)\n");
        assert_eq!(none.namespace(), None);

        // Unbalanced text still resolves via the line scan
        let broken = Buffer::scratch("t.clj", "(ns my.app.core-test\n(deftest unclosed\n");
        assert_eq!(broken.namespace().as_deref(), Some("my.app.core-test"));
    }

    #[test]
    fn test_update_text_drops_marks_and_clamps_point() {
        let mut buf = sample();
        buf.set_point(40);
        buf.update_text("(ns my.app.core-test)\n".to_string());
        assert!(buf.is_dirty());
        assert!(buf.marks().is_empty());
        assert!(buf.point() <= buf.text().len());
    }
}
