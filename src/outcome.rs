//! Decoding of harness result payloads into per-check outcomes

use crate::common::{Error, Result};
use crate::sexp::{self, Form};

/// Kind of one reported outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Pass,
    Fail,
    Error,
    Summary,
    BeginNamespace,
    EndNamespace,
    BeginCheck,
    EndCheck,
}

impl OutcomeKind {
    /// Map a wire kind name to a kind
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "pass" => Some(Self::Pass),
            "fail" => Some(Self::Fail),
            "error" => Some(Self::Error),
            "summary" => Some(Self::Summary),
            "begin-test-ns" => Some(Self::BeginNamespace),
            "end-test-ns" => Some(Self::EndNamespace),
            "begin-test-var" => Some(Self::BeginCheck),
            "end-test-var" => Some(Self::EndCheck),
            _ => None,
        }
    }

    /// Lifecycle kinds bracket structural events and carry no diagnostics
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::BeginNamespace | Self::EndNamespace | Self::BeginCheck | Self::EndCheck
        )
    }
}

/// One reported check result
#[derive(Debug, Clone)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub message: Option<String>,
    pub expected: Option<String>,
    pub actual: Option<String>,
    /// Pretty-printed long form of `actual`, used for detail views
    pub rendered_actual: Option<String>,
    /// 1-based source line, supplied by the remote side
    pub line: Option<u32>,
}

/// Decode a whole-namespace run response.
///
/// The payload is a sequence of per-var records, each `(varName tuple...)`.
/// Records are flattened into one outcome sequence preserving source order,
/// with lifecycle tuples dropped.
pub fn decode_run(raw: &str) -> Result<Vec<Outcome>> {
    let form = parse(raw)?;
    let records = form.items().ok_or_else(|| {
        Error::decode(format!("expected a sequence of var records, got {}", form))
    })?;
    let mut outcomes = Vec::new();
    for record in records {
        for tuple in record_tuples(record)? {
            if let Some(outcome) = decode_tuple(tuple)? {
                outcomes.push(outcome);
            }
        }
    }
    Ok(outcomes)
}

/// Decode a single-check response: one var record, unwrapped.
///
/// A `nil` response or a record with no outcome tuples means the cursor did
/// not resolve to any check on the remote side, which is reported distinctly
/// rather than as an empty sequence.
pub fn decode_check(raw: &str) -> Result<Vec<Outcome>> {
    let form = parse(raw)?;
    if form.is_nil() {
        return Err(Error::NotInCheck);
    }
    let tuples = record_tuples(&form)?;
    if tuples.is_empty() {
        return Err(Error::NotInCheck);
    }
    let mut outcomes = Vec::new();
    for tuple in tuples {
        if let Some(outcome) = decode_tuple(tuple)? {
            outcomes.push(outcome);
        }
    }
    Ok(outcomes)
}

fn parse(raw: &str) -> Result<Form> {
    sexp::parse_form(raw.trim()).map_err(|e| Error::decode(e.to_string()))
}

/// Split a var record into its outcome tuples, validating the name head
fn record_tuples(record: &Form) -> Result<&[Form]> {
    let items = record
        .items()
        .ok_or_else(|| Error::decode(format!("expected a var record, got {}", record)))?;
    match items.first() {
        None => Ok(&[]),
        Some(Form::Str(_)) | Some(Form::Symbol(_)) => Ok(&items[1..]),
        Some(other) => Err(Error::decode(format!(
            "var record does not start with a name: {}",
            other
        ))),
    }
}

fn decode_tuple(tuple: &Form) -> Result<Option<Outcome>> {
    let fields = tuple
        .items()
        .ok_or_else(|| Error::decode(format!("outcome tuple is not a sequence: {}", tuple)))?;
    let kind_name = fields
        .first()
        .and_then(|f| f.as_keyword().or_else(|| f.as_symbol()))
        .ok_or_else(|| Error::decode(format!("outcome tuple has no kind: {}", tuple)))?;
    let kind = OutcomeKind::from_wire(kind_name)
        .ok_or_else(|| Error::decode(format!("unknown outcome kind '{}'", kind_name)))?;
    // Lifecycle tuples are dropped before any arity check; the remote side
    // brackets them with whatever fields it likes.
    if kind.is_lifecycle() {
        return Ok(None);
    }
    if fields.len() != 6 {
        return Err(Error::decode(format!(
            "outcome tuple has {} fields, expected 6: {}",
            fields.len(),
            tuple
        )));
    }
    Ok(Some(Outcome {
        kind,
        message: text_field(&fields[1]),
        expected: text_field(&fields[2]),
        actual: text_field(&fields[3]),
        rendered_actual: text_field(&fields[4]),
        line: line_field(&fields[5])?,
    }))
}

/// Wire values arrive pre-rendered as strings; anything else is printed back
fn text_field(form: &Form) -> Option<String> {
    match form {
        Form::Nil => None,
        Form::Str(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn line_field(form: &Form) -> Result<Option<u32>> {
    match form {
        Form::Nil => Ok(None),
        Form::Int(n) => u32::try_from(*n)
            .map(Some)
            .map_err(|_| Error::decode(format!("line {} out of range", n))),
        other => Err(Error::decode(format!("line is not an integer: {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUN_RESPONSE: &str = r##"
        [["my.app.core-test/adds"
          [:begin-test-var nil nil nil nil nil]
          [:pass nil "(= 2 (add 1 1))" "true" "true" nil]
          [:fail "borderline" "3" "4" "(not (= 3 4))" 7]
          [:end-test-var nil nil nil nil nil]]
         ["my.app.core-test/divides"
          [:error nil "2" "Divide by zero" "#error {:cause \"Divide by zero\"}" 12]]]
    "##;

    #[test]
    fn test_decode_run_flattens_and_drops_lifecycle() {
        let outcomes = decode_run(RUN_RESPONSE).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].kind, OutcomeKind::Pass);
        assert_eq!(outcomes[1].kind, OutcomeKind::Fail);
        assert_eq!(outcomes[2].kind, OutcomeKind::Error);

        let fail = &outcomes[1];
        assert_eq!(fail.message.as_deref(), Some("borderline"));
        assert_eq!(fail.expected.as_deref(), Some("3"));
        assert_eq!(fail.actual.as_deref(), Some("4"));
        assert_eq!(fail.rendered_actual.as_deref(), Some("(not (= 3 4))"));
        assert_eq!(fail.line, Some(7));

        let error = &outcomes[2];
        assert_eq!(error.line, Some(12));
        assert_eq!(error.message, None);
    }

    #[test]
    fn test_decode_run_accepts_short_lifecycle_tuples() {
        let raw = r#"[["my.app/t" [:begin-test-ns "my.app.core-test"] [:end-test-ns]]]"#;
        let outcomes = decode_run(raw).unwrap();
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_decode_run_empty_sequence() {
        assert!(decode_run("[]").unwrap().is_empty());
        assert!(decode_run("()").unwrap().is_empty());
    }

    #[test]
    fn test_decode_run_rejects_malformed_payloads() {
        assert!(decode_run("nil").is_err());
        assert!(decode_run("42").is_err());
        assert!(decode_run("[[42]]").is_err());
        assert!(decode_run(r#"[["v" 42]]"#).is_err());
        assert!(decode_run(r#"[["v" [:boom nil nil nil nil nil]]]"#).is_err());
        assert!(decode_run(r#"[["v" [:fail "m" "3" "4"]]]"#).is_err());
        assert!(decode_run(r#"[["v" [:fail "m" "3" "4" "(not (= 3 4))" :seven]]]"#).is_err());
        assert!(decode_run("[[").is_err());
    }

    #[test]
    fn test_decode_check_single_record() {
        let raw = r#"["my.app.core-test/adds" [:fail nil "3" "4" "(not (= 3 4))" 7]]"#;
        let outcomes = decode_check(raw).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].kind, OutcomeKind::Fail);
    }

    #[test]
    fn test_decode_check_reports_missing_check() {
        assert!(matches!(decode_check("nil"), Err(Error::NotInCheck)));
        assert!(matches!(decode_check(r#"["my.app/t"]"#), Err(Error::NotInCheck)));
        assert!(matches!(decode_check("[]"), Err(Error::NotInCheck)));
    }

    #[test]
    fn test_decode_check_lifecycle_only_is_empty_not_missing() {
        let raw = r#"["my.app/t" [:begin-test-var] [:end-test-var]]"#;
        let outcomes = decode_check(raw).unwrap();
        assert!(outcomes.is_empty());
    }

    #[test]
    fn test_negative_line_is_rejected() {
        let raw = r#"[["v" [:fail "m" "3" "4" "(not (= 3 4))" -2]]]"#;
        assert!(decode_run(raw).is_err());
    }
}
