//! Mock remote runtime binary for integration testing
//!
//! Implements a minimal eval server over the framed JSON protocol so the
//! driver can be exercised without a real language runtime. Requests that
//! mention the harness run functions get canned result payloads; anything
//! else evaluates to nil.

use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};

fn main() {
    let port: u16 = std::env::args()
        .nth(1)
        .and_then(|p| p.parse().ok())
        .unwrap_or(7888);

    let listener = TcpListener::bind(("127.0.0.1", port)).expect("bind mock runtime");
    eprintln!("mock runtime listening on 127.0.0.1:{}", port);

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => handle_connection(stream),
            Err(e) => eprintln!("accept failed: {}", e),
        }
    }
}

fn handle_connection(stream: TcpStream) {
    let mut writer = match stream.try_clone() {
        Ok(writer) => writer,
        Err(_) => return,
    };
    let mut reader = BufReader::new(stream);

    loop {
        let request = match read_message(&mut reader) {
            Some(request) => request,
            None => break,
        };
        let id = request.get("id").and_then(|v| v.as_u64()).unwrap_or(0);
        let code = request.get("code").and_then(|v| v.as_str()).unwrap_or("");

        for event in respond(id, code) {
            send_message(&mut writer, &event);
        }
    }
}

fn read_message<R: BufRead>(reader: &mut R) -> Option<Value> {
    let mut content_length: Option<usize> = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            return None;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some(value) = line.strip_prefix("Content-Length:") {
            content_length = value.trim().parse().ok();
        }
    }

    let mut body = vec![0u8; content_length?];
    reader.read_exact(&mut body).ok()?;
    serde_json::from_slice(&body).ok()
}

fn send_message<W: Write>(writer: &mut W, message: &Value) {
    let body = serde_json::to_string(message).unwrap();
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).ok();
    writer.write_all(body.as_bytes()).ok();
    writer.flush().ok();
}

/// Canned events for one evaluation
fn respond(id: u64, code: &str) -> Vec<Value> {
    if code.starts_with("(load-file") {
        return vec![json!({ "type": "value", "id": id, "text": "nil" })];
    }

    if code.contains("run-check") {
        let record = r#"["my.app.core-test/adds" [:fail "adds" "3" "4" "(not (= 3 4))" 7]]"#;
        return vec![
            json!({ "type": "output", "id": id, "text": "Testing my.app.core-test\n" }),
            json!({ "type": "value", "id": id, "text": record }),
        ];
    }

    if code.contains("run-suite") {
        let records = r##"[["my.app.core-test/adds"
  [:begin-test-var "adds"]
  [:fail "adds" "3" "4" "(not (= 3 4))" 7]
  [:end-test-var "adds"]]
 ["my.app.core-test/divides"
  [:error "divides" "2" "Divide by zero" "#error {:cause \"Divide by zero\"}" 11]]]"##;
        return vec![
            json!({ "type": "output", "id": id, "text": "Testing my.app.core-test\n" }),
            json!({ "type": "value", "id": id, "text": records }),
        ];
    }

    vec![json!({ "type": "value", "id": id, "text": "nil" })]
}
