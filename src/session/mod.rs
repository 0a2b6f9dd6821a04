//! Session state and command dispatch
//!
//! The session owns the open buffers, the channel to the remote runtime
//! and the pluggable check index and source mapper. [`Session::execute`]
//! turns one editor command into [`Feedback`]; every error is converted
//! to a status line at that boundary so callers never unwind.

pub mod run;

use std::collections::VecDeque;
use std::path::Path;

use crate::annotate::inspect::{self, Surface};
use crate::annotate::{navigate, Severity, Summary};
use crate::buffer::Buffer;
use crate::checks::{CheckIndex, FormScanIndex};
use crate::commands::EditorCommand;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::repl::EvalChannel;
use crate::srcmap::{ConventionMapper, SourceMapper};

/// Styling class of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSeverity {
    Plain,
    Success,
    Failure,
    Error,
}

/// One user-visible status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub severity: StatusSeverity,
}

impl StatusLine {
    pub fn new(text: impl Into<String>, severity: StatusSeverity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, StatusSeverity::Plain)
    }

    /// Expected failures like "no marker here" stay plain; everything
    /// else is styled as an error.
    pub fn from_error(error: &Error) -> Self {
        let severity = if error.is_benign() {
            StatusSeverity::Plain
        } else {
            StatusSeverity::Error
        };
        Self::new(error.to_string(), severity)
    }

    pub fn from_summary(summary: &Summary) -> Self {
        let severity = match summary.severity() {
            None => StatusSeverity::Success,
            Some(Severity::Fail) => StatusSeverity::Failure,
            Some(Severity::Error) => StatusSeverity::Error,
        };
        Self::new(summary.message(), severity)
    }
}

/// How multiple surfaces should be arranged when shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceLayout {
    Stacked,
    SideBySide,
}

/// Everything a command wants shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub status: Option<StatusLine>,
    pub surfaces: Vec<Surface>,
    pub layout: SurfaceLayout,
}

impl Feedback {
    pub fn status(line: StatusLine) -> Self {
        Self {
            status: Some(line),
            surfaces: Vec::new(),
            layout: SurfaceLayout::Stacked,
        }
    }

    pub fn surface(surface: Surface) -> Self {
        Self {
            status: None,
            surfaces: vec![surface],
            layout: SurfaceLayout::Stacked,
        }
    }

    pub fn side_by_side(left: Surface, right: Surface) -> Self {
        Self {
            status: None,
            surfaces: vec![left, right],
            layout: SurfaceLayout::SideBySide,
        }
    }
}

/// An editing session against one remote runtime
pub struct Session {
    config: Config,
    channel: Box<dyn EvalChannel>,
    check_index: Box<dyn CheckIndex + Send>,
    source_mapper: Box<dyn SourceMapper + Send>,
    buffers: Vec<Buffer>,
    current: usize,
    run_in_flight: bool,
    last_summary: Option<Summary>,
    remote_output: VecDeque<String>,
}

impl Session {
    /// Create a session over `channel` with `buffer` current. The check
    /// index and source mapper default to the config-driven convention
    /// implementations.
    pub fn new(config: Config, channel: Box<dyn EvalChannel>, buffer: Buffer) -> Self {
        let check_index = Box::new(FormScanIndex::from_config(&config.source));
        let source_mapper = Box::new(ConventionMapper::from_config(&config.source));
        Self {
            config,
            channel,
            check_index,
            source_mapper,
            buffers: vec![buffer],
            current: 0,
            run_in_flight: false,
            last_summary: None,
            remote_output: VecDeque::new(),
        }
    }

    /// Swap the check-resolution strategy
    pub fn with_check_index(mut self, index: Box<dyn CheckIndex + Send>) -> Self {
        self.check_index = index;
        self
    }

    /// Swap the test-to-implementation mapping strategy
    pub fn with_source_mapper(mut self, mapper: Box<dyn SourceMapper + Send>) -> Self {
        self.source_mapper = mapper;
        self
    }

    pub fn current_buffer(&self) -> &Buffer {
        &self.buffers[self.current]
    }

    pub fn current_buffer_mut(&mut self) -> &mut Buffer {
        &mut self.buffers[self.current]
    }

    pub fn last_summary(&self) -> Option<&Summary> {
        self.last_summary.as_ref()
    }

    /// Drain the remote output accumulated since the last call
    pub fn take_remote_output(&mut self) -> Vec<String> {
        self.remote_output.drain(..).collect()
    }

    /// Execute one command, converting failures to a status line
    pub async fn execute(&mut self, command: EditorCommand) -> Feedback {
        match self.dispatch(command).await {
            Ok(feedback) => feedback,
            Err(error) => Feedback::status(StatusLine::from_error(&error)),
        }
    }

    async fn dispatch(&mut self, command: EditorCommand) -> Result<Feedback> {
        match command {
            EditorCommand::RunTests => run::run_all(self).await,
            EditorCommand::RunTest => run::run_single(self).await,
            EditorCommand::ShowResult => self.show_result(),
            EditorCommand::ShowRawResult => self.show_raw_result(),
            EditorCommand::ShowDiff => self.show_diff(),
            EditorCommand::ClearResults => self.clear_results(),
            EditorCommand::NextProblem => self.next_problem(),
            EditorCommand::PreviousProblem => self.previous_problem(),
            EditorCommand::JumpToImplementation => self.jump_to_implementation(),
            EditorCommand::Goto { line, column } => self.goto(line, column),
            EditorCommand::Open { file } => self.open(&file),
            EditorCommand::Status => self.status(),
            // The driver exits on quit before reaching the session
            EditorCommand::Quit => Ok(Feedback::status(StatusLine::plain("Bye"))),
        }
    }

    fn show_result(&self) -> Result<Feedback> {
        let buffer = self.current_buffer();
        let marker = inspect::marker_at(buffer.marks(), buffer.point())?;
        let severity = status_severity(marker.severity);
        Ok(Feedback::status(StatusLine::new(
            marker.short_message.clone(),
            severity,
        )))
    }

    fn show_raw_result(&self) -> Result<Feedback> {
        let buffer = self.current_buffer();
        let surface = inspect::raw_detail_at(buffer.marks(), buffer.point())?;
        Ok(Feedback::surface(surface))
    }

    fn show_diff(&self) -> Result<Feedback> {
        let buffer = self.current_buffer();
        let (expected, actual) = inspect::structural_diff_at(buffer.marks(), buffer.point())?;
        Ok(Feedback::side_by_side(expected, actual))
    }

    fn clear_results(&mut self) -> Result<Feedback> {
        self.current_buffer_mut().marks_mut().clear();
        self.last_summary = None;
        Ok(Feedback::status(StatusLine::plain("Test results cleared")))
    }

    fn next_problem(&mut self) -> Result<Feedback> {
        let found = {
            let buffer = self.current_buffer();
            navigate::next_problem(buffer.marks(), buffer.point())
                .map(|m| (m.start, m.line, m.severity, m.short_message.clone()))
        };
        let Some((start, line, severity, message)) = found else {
            return Ok(Feedback::status(StatusLine::plain("No next problem")));
        };
        let buffer = self.current_buffer_mut();
        buffer.set_point(start);
        Ok(Feedback::status(StatusLine::new(
            format!("{}:{}: {}", buffer.name(), line, message),
            status_severity(severity),
        )))
    }

    fn previous_problem(&mut self) -> Result<Feedback> {
        let found = {
            let buffer = self.current_buffer();
            navigate::previous_problem(buffer.marks(), buffer.point())
                .map(|m| (m.start, m.line, m.severity, m.short_message.clone()))
        };
        let Some((start, line, severity, message)) = found else {
            return Ok(Feedback::status(StatusLine::plain("No previous problem")));
        };
        let buffer = self.current_buffer_mut();
        buffer.set_point(start);
        Ok(Feedback::status(StatusLine::new(
            format!("{}:{}: {}", buffer.name(), line, message),
            status_severity(severity),
        )))
    }

    fn jump_to_implementation(&mut self) -> Result<Feedback> {
        let namespace = self.current_namespace()?;
        let path = self.source_mapper.implementation_path(&namespace);
        self.switch_to(&path)?;
        Ok(Feedback::status(StatusLine::plain(
            path.display().to_string(),
        )))
    }

    fn goto(&mut self, line: u32, column: u32) -> Result<Feedback> {
        let (line, column) = self.current_buffer_mut().goto(line, column);
        let buffer = self.current_buffer();
        Ok(Feedback::status(StatusLine::plain(format!(
            "{}:{}:{} {}",
            buffer.name(),
            line,
            column,
            buffer.line_text(line)
        ))))
    }

    fn open(&mut self, path: &Path) -> Result<Feedback> {
        self.switch_to(path)?;
        let buffer = self.current_buffer();
        Ok(Feedback::status(StatusLine::plain(format!(
            "{} ({} lines)",
            buffer.name(),
            buffer.line_count()
        ))))
    }

    fn status(&self) -> Result<Feedback> {
        let buffer = self.current_buffer();
        let modified = if buffer.is_dirty() { ", modified" } else { "" };
        let mut lines = vec![
            format!(
                "Buffer: {} ({} lines{})",
                buffer.name(),
                buffer.line_count(),
                modified
            ),
            format!(
                "Cursor: {}:{}",
                buffer.line_of(buffer.point()),
                buffer.column_of(buffer.point())
            ),
            format!(
                "Namespace: {}",
                buffer.namespace().unwrap_or_else(|| "?".to_string())
            ),
            format!("Markers: {}", buffer.marks().len()),
        ];
        if let Some(summary) = &self.last_summary {
            lines.push(format!("Last run: {}", summary.message()));
        }
        Ok(Feedback::status(StatusLine::plain(lines.join("\n"))))
    }

    fn current_namespace(&self) -> Result<String> {
        let buffer = self.current_buffer();
        buffer
            .namespace()
            .ok_or_else(|| Error::NoNamespace(buffer.name().to_string()))
    }

    /// Make the buffer for `path` current, opening it if needed
    fn switch_to(&mut self, path: &Path) -> Result<()> {
        if let Some(index) = self.buffers.iter().position(|b| b.path() == Some(path)) {
            self.current = index;
            return Ok(());
        }
        let buffer = Buffer::open(path)?;
        self.buffers.push(buffer);
        self.current = self.buffers.len() - 1;
        Ok(())
    }
}

fn status_severity(severity: Severity) -> StatusSeverity {
    match severity {
        Severity::Fail => StatusSeverity::Failure,
        Severity::Error => StatusSeverity::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::run::FakeChannel;
    use super::*;

    const TEST_SOURCE: &str = "\
(ns my.app.core-test
  (:require [my.app.core :as core]))

(deftest adds
  (is (= 3 (core/add 1 1))))

(deftest divides
  (is (= 2 (core/divide 4 2))))
";

    const RUN_RESPONSE: &str = r#"[["my.app.core-test/adds"
   [:fail "adds" "3" "2" "(not (= 3 2))" 5]]
  ["my.app.core-test/divides"
   [:pass "divides" nil nil nil 8]]]"#;

    fn session_with_markers() -> Session {
        let channel = FakeChannel::scripted(vec![Ok(RUN_RESPONSE.to_string())]);
        let buffer = Buffer::scratch("core_test.clj", TEST_SOURCE);
        let mut session = Session::new(Config::default(), Box::new(channel), buffer);
        let feedback = futures_block(session.execute(EditorCommand::RunTests));
        assert_eq!(
            feedback.status.as_ref().map(|s| s.severity),
            Some(StatusSeverity::Failure)
        );
        session
    }

    /// Single-command executor for tests that never touch the network
    fn futures_block<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_navigation_moves_the_cursor() {
        let mut session = session_with_markers();
        session.current_buffer_mut().set_point(0);

        let feedback = futures_block(session.execute(EditorCommand::NextProblem));
        let status = feedback.status.unwrap();
        assert!(status.text.starts_with("core_test.clj:5:"));
        assert_eq!(status.severity, StatusSeverity::Failure);
        let marker_start = session.current_buffer().point();
        assert!(marker_start > 0);

        // No marker past the only failure
        let feedback = futures_block(session.execute(EditorCommand::NextProblem));
        assert_eq!(feedback.status.unwrap().text, "No next problem");
        assert_eq!(session.current_buffer().point(), marker_start);
    }

    #[test]
    fn test_show_result_at_marker_and_away_from_one() {
        let mut session = session_with_markers();
        futures_block(session.execute(EditorCommand::NextProblem));

        let feedback = futures_block(session.execute(EditorCommand::ShowResult));
        assert_eq!(feedback.status.unwrap().text, "Expected 3, got 2");

        session.current_buffer_mut().set_point(0);
        let feedback = futures_block(session.execute(EditorCommand::ShowResult));
        let status = feedback.status.unwrap();
        assert_eq!(status.text, "No test result at point");
        assert_eq!(status.severity, StatusSeverity::Plain);
    }

    #[test]
    fn test_show_diff_produces_two_surfaces() {
        let mut session = session_with_markers();
        futures_block(session.execute(EditorCommand::NextProblem));

        let feedback = futures_block(session.execute(EditorCommand::ShowDiff));
        assert_eq!(feedback.layout, SurfaceLayout::SideBySide);
        assert_eq!(feedback.surfaces.len(), 2);
        assert_eq!(feedback.surfaces[0].content, "3");
        assert_eq!(feedback.surfaces[1].content, "2");
    }

    #[test]
    fn test_clear_results_removes_markers_and_summary() {
        let mut session = session_with_markers();
        assert!(!session.current_buffer().marks().is_empty());

        let feedback = futures_block(session.execute(EditorCommand::ClearResults));
        assert_eq!(feedback.status.unwrap().text, "Test results cleared");
        assert!(session.current_buffer().marks().is_empty());
        assert!(session.last_summary().is_none());
    }

    #[test]
    fn test_goto_reports_the_landing_position() {
        let channel = FakeChannel::scripted(vec![]);
        let buffer = Buffer::scratch("core_test.clj", TEST_SOURCE);
        let mut session = Session::new(Config::default(), Box::new(channel), buffer);

        let feedback = futures_block(session.execute(EditorCommand::Goto {
            line: 4,
            column: 0,
        }));
        let status = feedback.status.unwrap();
        assert!(status.text.starts_with("core_test.clj:4:0 (deftest adds"));
    }

    #[test]
    fn test_jump_to_implementation_opens_the_mapped_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src/my/app");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("core.clj"), "(ns my.app.core)\n").unwrap();

        let mut config = Config::default();
        config.source.root = dir.path().join("src");
        let channel = FakeChannel::scripted(vec![]);
        let buffer = Buffer::scratch("core_test.clj", TEST_SOURCE);
        let mut session = Session::new(config, Box::new(channel), buffer);

        let feedback = futures_block(session.execute(EditorCommand::JumpToImplementation));
        assert!(feedback.status.unwrap().text.ends_with("core.clj"));
        assert_eq!(session.current_buffer().name(), "core.clj");
        assert_eq!(
            session.current_buffer().namespace().as_deref(),
            Some("my.app.core")
        );
    }

    #[test]
    fn test_status_reports_buffer_and_last_run() {
        let mut session = session_with_markers();
        let feedback = futures_block(session.execute(EditorCommand::Status));
        let text = feedback.status.unwrap().text;
        assert!(text.contains("Buffer: core_test.clj"));
        assert!(text.contains("Namespace: my.app.core-test"));
        assert!(text.contains("Markers: 1"));
        assert!(text.contains("Last run: Ran 2 tests. 1 failures, 0 errors."));
    }
}
