//! Eval envelope types and harness request rendering

use serde::{Deserialize, Serialize};

use crate::common::config::HarnessConfig;

/// An eval request envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalRequest {
    pub id: u64,
    pub op: String,
    /// Code for the remote runtime to evaluate
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

impl EvalRequest {
    pub fn eval(id: u64, code: &str, session: Option<&str>) -> Self {
        Self {
            id,
            op: "eval".to_string(),
            code: code.to_string(),
            session: session.map(|s| s.to_string()),
        }
    }
}

/// An event answering an eval request.
///
/// `output` may arrive any number of times before the terminal `value`
/// or `error` event for the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EvalEvent {
    Output { id: u64, text: String },
    Value { id: u64, text: String },
    Error { id: u64, text: String },
}

impl EvalEvent {
    pub fn id(&self) -> u64 {
        match self {
            Self::Output { id, .. } | Self::Value { id, .. } | Self::Error { id, .. } => *id,
        }
    }
}

fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in substitutions {
        out = out.replace(&format!("{{{}}}", name), value);
    }
    out
}

/// Code that runs every check in a namespace
pub fn run_all_request(harness: &HarnessConfig, namespace: &str) -> String {
    render(&harness.run_all, &[("namespace", namespace)])
}

/// Code that runs one named check
pub fn run_check_request(harness: &HarnessConfig, namespace: &str, check: &str) -> String {
    render(
        &harness.run_check,
        &[("namespace", namespace), ("check", check)],
    )
}

/// Code that loads a source file; the path is escaped as a string literal
pub fn load_file_request(harness: &HarnessConfig, path: &str) -> String {
    let escaped = path.replace('\\', "\\\\").replace('"', "\\\"");
    render(&harness.load_file, &[("path", &escaped)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope_shape() {
        let request = EvalRequest::eval(7, "(+ 1 2)", None);
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"id":7,"op":"eval","code":"(+ 1 2)"}"#);

        let with_session = EvalRequest::eval(8, "(+ 1 2)", Some("s1"));
        let json = serde_json::to_string(&with_session).unwrap();
        assert!(json.contains(r#""session":"s1""#));
    }

    #[test]
    fn test_event_tagged_decoding() {
        let value: EvalEvent =
            serde_json::from_str(r#"{"type":"value","id":3,"text":"[]"}"#).unwrap();
        assert_eq!(
            value,
            EvalEvent::Value {
                id: 3,
                text: "[]".to_string()
            }
        );
        assert_eq!(value.id(), 3);

        let error: EvalEvent =
            serde_json::from_str(r#"{"type":"error","id":3,"text":"boom"}"#).unwrap();
        assert!(matches!(error, EvalEvent::Error { .. }));
    }

    #[test]
    fn test_default_templates_render() {
        let harness = HarnessConfig::default();
        assert_eq!(
            run_all_request(&harness, "my.app.core-test"),
            "(replmark.harness/run-suite 'my.app.core-test)"
        );
        assert_eq!(
            run_check_request(&harness, "my.app.core-test", "adds"),
            "(replmark.harness/run-check 'my.app.core-test 'adds)"
        );
        assert_eq!(
            load_file_request(&harness, "test/my/app/core_test.clj"),
            "(load-file \"test/my/app/core_test.clj\")"
        );
    }

    #[test]
    fn test_load_file_path_is_escaped() {
        let harness = HarnessConfig::default();
        assert_eq!(
            load_file_request(&harness, r#"C:\code\a"b.clj"#),
            r#"(load-file "C:\\code\\a\"b.clj")"#
        );
    }

    #[test]
    fn test_custom_template() {
        let harness = HarnessConfig {
            run_check: "(run '{namespace}/{check})".to_string(),
            ..HarnessConfig::default()
        };
        assert_eq!(
            run_check_request(&harness, "a.b-test", "t"),
            "(run 'a.b-test/t)"
        );
    }
}
