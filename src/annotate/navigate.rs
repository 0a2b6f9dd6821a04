//! Marker navigation in document order
//!
//! Next/previous walk the sorted marker starts instead of scanning text,
//! so cost follows the boundaries crossed, never the document length.

use super::{Marker, MarkerSet};

/// Next problem site strictly after the offset.
///
/// From inside a marker this skips the rest of that marker's extent and
/// lands on the start of the next distinct one. `None` at the buffer edge;
/// the caller leaves the cursor where it was.
pub fn next_problem(marks: &MarkerSet, offset: usize) -> Option<&Marker> {
    marks.next_start_after(offset)
}

/// Previous problem site before the offset.
///
/// A marker covering the offset does not count as its own predecessor: the
/// walk starts from that marker's start, so the result is the previous
/// distinct marker. `None` at the buffer edge.
pub fn previous_problem(marks: &MarkerSet, offset: usize) -> Option<&Marker> {
    let limit = marks.at(offset).map(|m| m.start).unwrap_or(offset);
    marks.last_start_before(limit)
}
