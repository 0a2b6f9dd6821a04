//! On-demand detail views for the marker at point

use crate::common::{Error, Result};
use crate::sexp::{self, Form};

use super::{Marker, MarkerSet};

/// A scratch surface holding inspection output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub title: String,
    pub content: String,
}

/// Marker covering the offset, or the no-marker condition
pub fn marker_at(marks: &MarkerSet, offset: usize) -> Result<&Marker> {
    marks.at(offset).ok_or(Error::NoMarkerAtPoint)
}

/// Full rendered payload of the marker at the offset, as a scratch surface.
/// Falls back to the inline message when no long rendering was reported.
pub fn raw_detail_at(marks: &MarkerSet, offset: usize) -> Result<Surface> {
    let marker = marker_at(marks, offset)?;
    let content = marker
        .detail
        .clone()
        .unwrap_or_else(|| marker.short_message.clone());
    Ok(Surface {
        title: "*test-result*".to_string(),
        content,
    })
}

/// Split the payload of the marker at the offset into expected and actual
/// surfaces for side-by-side comparison.
///
/// The payload must read as `(not (= expected actual))`. That shape is an
/// assumption about how the harness renders comparison failures, so any
/// other shape is rejected rather than guessed at; the failure is confined
/// to this operation and other views of the same marker keep working.
pub fn structural_diff_at(marks: &MarkerSet, offset: usize) -> Result<(Surface, Surface)> {
    let marker = marker_at(marks, offset)?;
    let payload = marker
        .detail
        .as_deref()
        .ok_or_else(|| Error::DiffShape("result has no rendered form".to_string()))?;
    let (expected, actual) = split_comparison(payload)?;
    Ok((
        Surface {
            title: "*expected*".to_string(),
            content: expected,
        },
        Surface {
            title: "*actual*".to_string(),
            content: actual,
        },
    ))
}

/// Extract the two operands of a negated comparison positionally: strip the
/// outer negation, then take the second and third items of the inner form.
fn split_comparison(payload: &str) -> Result<(String, String)> {
    let form =
        sexp::parse_form(payload.trim()).map_err(|e| Error::DiffShape(e.to_string()))?;
    let operands = match &form {
        Form::List(outer) => match outer.as_slice() {
            [negation, Form::List(inner)] if negation.as_symbol() == Some("not") => {
                match inner.as_slice() {
                    [predicate, expected, actual] if predicate.as_symbol().is_some() => {
                        Some((expected.to_string(), actual.to_string()))
                    }
                    _ => None,
                }
            }
            _ => None,
        },
        _ => None,
    };
    operands.ok_or_else(|| Error::DiffShape(payload.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::Severity;

    fn set_with_detail(detail: Option<&str>) -> MarkerSet {
        let mut set = MarkerSet::new();
        set.insert(Marker {
            start: 10,
            end: 20,
            line: 2,
            severity: Severity::Fail,
            short_message: "Expected 3, got 4".to_string(),
            detail: detail.map(|s| s.to_string()),
        });
        set
    }

    #[test]
    fn test_marker_at_misses_are_reported() {
        let set = MarkerSet::new();
        assert!(matches!(marker_at(&set, 5), Err(Error::NoMarkerAtPoint)));
        let set = set_with_detail(None);
        assert!(matches!(marker_at(&set, 25), Err(Error::NoMarkerAtPoint)));
        assert!(marker_at(&set, 12).is_ok());
    }

    #[test]
    fn test_raw_detail_prefers_payload() {
        let set = set_with_detail(Some("(not (= 3 4))"));
        let surface = raw_detail_at(&set, 15).unwrap();
        assert_eq!(surface.title, "*test-result*");
        assert_eq!(surface.content, "(not (= 3 4))");

        let bare = set_with_detail(None);
        assert_eq!(raw_detail_at(&bare, 15).unwrap().content, "Expected 3, got 4");
    }

    #[test]
    fn test_structural_diff_splits_operands() {
        let set = set_with_detail(Some("(not (= {:a 1} {:a 2}))"));
        let (expected, actual) = structural_diff_at(&set, 10).unwrap();
        assert_eq!(expected.title, "*expected*");
        assert_eq!(expected.content, "{:a 1}");
        assert_eq!(actual.content, "{:a 2}");
    }

    #[test]
    fn test_structural_diff_rejects_other_shapes() {
        for payload in [
            "4",
            "(= 3 4)",
            "(not 42)",
            "(not (= 3))",
            "(not (= 1 2 3))",
            "(huh (= 3 4))",
            "(not (3 4 5))",
            "((",
        ] {
            let set = set_with_detail(Some(payload));
            let err = structural_diff_at(&set, 10).unwrap_err();
            assert!(matches!(err, Error::DiffShape(_)), "payload {:?}", payload);
        }
        let set = set_with_detail(None);
        assert!(matches!(
            structural_diff_at(&set, 10),
            Err(Error::DiffShape(_))
        ));
    }

    #[test]
    fn test_diff_failure_leaves_other_views_working() {
        let set = set_with_detail(Some("just text, not a comparison"));
        assert!(structural_diff_at(&set, 12).is_err());
        assert_eq!(marker_at(&set, 12).unwrap().short_message, "Expected 3, got 4");
        assert!(raw_detail_at(&set, 12).is_ok());
    }
}
