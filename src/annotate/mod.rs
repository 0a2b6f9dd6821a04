//! Annotation engine: markers, run counters and the run summary
//!
//! Each run owns a [`TestRun`] value that clears the buffer's markers,
//! folds decoded outcomes into new markers and counters, and ends with a
//! [`Summary`]. Counters live in the run value and travel with it; there
//! is no process-wide run state.

pub mod inspect;
pub mod navigate;

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use tracing::warn;

use crate::buffer::Buffer;
use crate::outcome::{Outcome, OutcomeKind};

/// Marker severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Fail,
    Error,
}

/// An annotation bound to one line's content span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Half-open byte range start
    pub start: usize,
    /// Half-open byte range end
    pub end: usize,
    /// 1-based line the marker is bound to
    pub line: u32,
    pub severity: Severity,
    /// Inline message for status display
    pub short_message: String,
    /// Pretty-printed payload for detail and diff views
    pub detail: Option<String>,
}

impl Marker {
    /// Whether the marker covers the offset. An empty span still covers its
    /// own start, so markers on blank lines stay inspectable.
    pub fn contains(&self, offset: usize) -> bool {
        (self.start <= offset && offset < self.end) || offset == self.start
    }
}

/// Markers for one buffer, ordered by range start.
///
/// Spans never leave their line, so two markers share a start only when
/// they share a line; inserting at an occupied start replaces, which keeps
/// at most one marker per line.
#[derive(Debug, Default)]
pub struct MarkerSet {
    by_start: BTreeMap<usize, Marker>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.by_start.clear();
    }

    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }

    pub fn insert(&mut self, marker: Marker) {
        self.by_start.insert(marker.start, marker);
    }

    /// Marker covering the offset
    pub fn at(&self, offset: usize) -> Option<&Marker> {
        self.by_start
            .range(..=offset)
            .next_back()
            .map(|(_, m)| m)
            .filter(|m| m.contains(offset))
    }

    /// First marker starting strictly after the offset
    pub fn next_start_after(&self, offset: usize) -> Option<&Marker> {
        self.by_start
            .range((Excluded(offset), Unbounded))
            .next()
            .map(|(_, m)| m)
    }

    /// Last marker starting strictly before the offset
    pub fn last_start_before(&self, offset: usize) -> Option<&Marker> {
        self.by_start.range(..offset).next_back().map(|(_, m)| m)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.by_start.values()
    }
}

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    pub total: u32,
    pub failures: u32,
    pub errors: u32,
}

/// An in-progress run against one buffer.
///
/// Starting the run is the atomic reset: every existing marker is dropped
/// and counters begin at zero before any outcome is applied.
pub struct TestRun<'a> {
    buffer: &'a mut Buffer,
    state: RunState,
}

impl<'a> TestRun<'a> {
    pub fn begin(buffer: &'a mut Buffer) -> Self {
        buffer.marks_mut().clear();
        Self {
            buffer,
            state: RunState::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Fold one decoded outcome into counters and markers.
    ///
    /// Lifecycle outcomes change nothing. Every other kind counts toward
    /// the total; only fail and error produce a marker.
    pub fn apply(&mut self, outcome: &Outcome) {
        if outcome.kind.is_lifecycle() {
            return;
        }
        self.state.total += 1;
        let severity = match outcome.kind {
            OutcomeKind::Fail => {
                self.state.failures += 1;
                Severity::Fail
            }
            OutcomeKind::Error => {
                self.state.errors += 1;
                Severity::Error
            }
            _ => return,
        };
        let short_message = match severity {
            Severity::Fail => format!(
                "Expected {}, got {}",
                outcome.expected.as_deref().unwrap_or("nil"),
                outcome.actual.as_deref().unwrap_or("nil"),
            ),
            Severity::Error => outcome
                .actual
                .clone()
                .unwrap_or_else(|| "nil".to_string()),
        };
        let line = match outcome.line {
            Some(line) => line,
            None => {
                warn!(kind = ?outcome.kind, "outcome carries no line, skipping marker");
                return;
            }
        };
        let clamped = line.clamp(1, self.buffer.line_count());
        if clamped != line {
            warn!(
                line,
                last = self.buffer.line_count(),
                "outcome line out of range, clamping"
            );
        }
        let (start, end) = self.buffer.line_span(clamped);
        self.buffer.marks_mut().insert(Marker {
            start,
            end,
            line: clamped,
            severity,
            short_message,
            detail: outcome.rendered_actual.clone(),
        });
    }

    /// End the run and report its counters
    pub fn finish(self) -> Summary {
        Summary { state: self.state }
    }
}

/// End-of-run report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub state: RunState,
}

impl Summary {
    pub fn message(&self) -> String {
        format!(
            "Ran {} tests. {} failures, {} errors.",
            self.state.total, self.state.failures, self.state.errors
        )
    }

    /// Severity of the report itself: errors outrank failures, and a run
    /// with neither reads as success (`None`).
    pub fn severity(&self) -> Option<Severity> {
        if self.state.errors > 0 {
            Some(Severity::Error)
        } else if self.state.failures > 0 {
            Some(Severity::Fail)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{Outcome, OutcomeKind};

    fn test_buffer() -> Buffer {
        let text = (1..=12).map(|i| format!("line {}\n", i)).collect::<String>();
        Buffer::scratch("core_test.clj", &text)
    }

    fn outcome(kind: OutcomeKind, line: Option<u32>) -> Outcome {
        Outcome {
            kind,
            message: None,
            expected: Some("3".to_string()),
            actual: Some("4".to_string()),
            rendered_actual: Some("(not (= 3 4))".to_string()),
            line,
        }
    }

    #[test]
    fn test_apply_counts_and_places_markers() {
        let mut buf = test_buffer();
        let mut run = TestRun::begin(&mut buf);
        run.apply(&outcome(OutcomeKind::Fail, Some(5)));
        run.apply(&outcome(OutcomeKind::Pass, None));
        run.apply(&outcome(OutcomeKind::Error, Some(9)));
        let summary = run.finish();

        assert_eq!(
            summary.state,
            RunState {
                total: 3,
                failures: 1,
                errors: 1
            }
        );
        assert_eq!(summary.message(), "Ran 3 tests. 1 failures, 1 errors.");
        assert_eq!(summary.severity(), Some(Severity::Error));

        assert_eq!(buf.marks().len(), 2);
        let fail = buf.marks().iter().next().unwrap();
        assert_eq!(fail.line, 5);
        assert_eq!(fail.severity, Severity::Fail);
        assert_eq!(fail.short_message, "Expected 3, got 4");
        let (start, end) = buf.line_span(5);
        assert_eq!((fail.start, fail.end), (start, end));

        let error = buf.marks().iter().nth(1).unwrap();
        assert_eq!(error.line, 9);
        assert_eq!(error.severity, Severity::Error);
        assert_eq!(error.short_message, "4");
    }

    #[test]
    fn test_lifecycle_outcomes_change_nothing() {
        let mut buf = test_buffer();
        let mut run = TestRun::begin(&mut buf);
        for kind in [
            OutcomeKind::BeginNamespace,
            OutcomeKind::BeginCheck,
            OutcomeKind::EndCheck,
            OutcomeKind::EndNamespace,
        ] {
            run.apply(&outcome(kind, Some(3)));
        }
        assert_eq!(run.state(), RunState::default());
        let _ = run.finish();
        assert!(buf.marks().is_empty());
    }

    #[test]
    fn test_begin_is_an_idempotent_reset() {
        let mut buf = test_buffer();
        let mut run = TestRun::begin(&mut buf);
        run.apply(&outcome(OutcomeKind::Fail, Some(2)));
        run.apply(&outcome(OutcomeKind::Fail, Some(4)));
        assert_eq!(run.finish().state.failures, 2);
        assert_eq!(buf.marks().len(), 2);

        let run = TestRun::begin(&mut buf);
        assert_eq!(run.state(), RunState::default());
        assert!(run.buffer.marks().is_empty());
    }

    #[test]
    fn test_later_outcome_on_same_line_overwrites() {
        let mut buf = test_buffer();
        let mut run = TestRun::begin(&mut buf);
        run.apply(&outcome(OutcomeKind::Fail, Some(5)));
        let mut second = outcome(OutcomeKind::Error, Some(5));
        second.actual = Some("boom".to_string());
        run.apply(&second);

        assert_eq!(run.state().total, 2);
        let _ = run.finish();
        assert_eq!(buf.marks().len(), 1);
        let marker = buf.marks().iter().next().unwrap();
        assert_eq!(marker.severity, Severity::Error);
        assert_eq!(marker.short_message, "boom");
    }

    #[test]
    fn test_out_of_range_line_clamps_to_last() {
        let mut buf = Buffer::scratch("t.clj", "one\ntwo\nthree\n");
        let mut run = TestRun::begin(&mut buf);
        run.apply(&outcome(OutcomeKind::Fail, Some(99)));
        let _ = run.finish();
        let marker = buf.marks().iter().next().unwrap();
        assert_eq!(marker.line, buf.line_count());
    }

    #[test]
    fn test_missing_line_counts_without_marker() {
        let mut buf = test_buffer();
        let mut run = TestRun::begin(&mut buf);
        run.apply(&outcome(OutcomeKind::Fail, None));
        assert_eq!(run.state().failures, 1);
        let _ = run.finish();
        assert!(buf.marks().is_empty());
    }

    #[test]
    fn test_summary_severity_priority() {
        let summary = |failures, errors| Summary {
            state: RunState {
                total: failures + errors,
                failures,
                errors,
            },
        };
        assert_eq!(summary(0, 0).severity(), None);
        assert_eq!(summary(2, 0).severity(), Some(Severity::Fail));
        assert_eq!(summary(2, 1).severity(), Some(Severity::Error));
        assert_eq!(
            summary(0, 0).message(),
            "Ran 0 tests. 0 failures, 0 errors."
        );
    }

    #[test]
    fn test_marker_on_blank_line_is_findable() {
        let mut buf = Buffer::scratch("t.clj", "one\n\nthree\n");
        let mut run = TestRun::begin(&mut buf);
        run.apply(&outcome(OutcomeKind::Fail, Some(2)));
        let _ = run.finish();
        let (start, _) = buf.line_span(2);
        let marker = buf.marks().at(start).unwrap();
        assert_eq!(marker.line, 2);
        assert_eq!(marker.start, marker.end);
    }
}
