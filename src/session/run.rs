//! Run orchestration
//!
//! A run saves dirty source buffers, loads the current buffer into the
//! runtime, resets the annotation state and only then sends the harness
//! request. The response is decoded completely before any outcome is
//! applied, so a malformed payload never leaves partial markers behind.

use std::collections::VecDeque;

use tracing::{debug, info};

use crate::annotate::TestRun;
use crate::common::{Error, Result};
use crate::outcome::{self, Outcome};
use crate::repl::protocol;
use crate::repl::EvalSink;

use super::{Feedback, Session, StatusLine};

/// Run every check in the current buffer's namespace
pub async fn run_all(session: &mut Session) -> Result<Feedback> {
    let namespace = session.current_namespace()?;
    info!(%namespace, "running all checks");
    let request = protocol::run_all_request(&session.config.harness, &namespace);
    execute_run(session, request, outcome::decode_run).await
}

/// Run only the check enclosing the cursor.
///
/// The check is resolved locally before anything is sent, so a cursor
/// outside any check form never reaches the runtime.
pub async fn run_single(session: &mut Session) -> Result<Feedback> {
    let namespace = session.current_namespace()?;
    let check = {
        let buffer = session.current_buffer();
        session
            .check_index
            .check_at(buffer, buffer.point())
            .ok_or(Error::NotInCheck)?
    };
    info!(%namespace, check = %check.name, "running single check");
    let request = protocol::run_check_request(&session.config.harness, &namespace, &check.name);
    execute_run(session, request, outcome::decode_check).await
}

async fn execute_run(
    session: &mut Session,
    request: String,
    decode: fn(&str) -> Result<Vec<Outcome>>,
) -> Result<Feedback> {
    if session.run_in_flight {
        return Err(Error::RunInFlight);
    }
    session.run_in_flight = true;
    let result = run_steps(session, request, decode).await;
    session.run_in_flight = false;
    result
}

async fn run_steps(
    session: &mut Session,
    request: String,
    decode: fn(&str) -> Result<Vec<Outcome>>,
) -> Result<Feedback> {
    save_source_buffers(session)?;
    load_current_buffer(session).await?;

    let Session {
        buffers,
        current,
        channel,
        remote_output,
        config,
        ..
    } = &mut *session;
    let buffer = &mut buffers[*current];

    // Starting the run drops every old marker, so failures below leave
    // the buffer clean rather than showing a stale picture.
    let mut run = TestRun::begin(buffer);
    let mut sink = RunSink::new(remote_output, config.output.max_lines);
    channel.eval(&request, &mut sink).await?;
    let response = sink.into_response()?;

    let outcomes = decode(&response)?;
    for outcome in &outcomes {
        run.apply(outcome);
    }
    let summary = run.finish();
    session.last_summary = Some(summary);
    Ok(Feedback::status(StatusLine::from_summary(&summary)))
}

/// Write out modified buffers that belong to the source set
fn save_source_buffers(session: &mut Session) -> Result<()> {
    let extension = session.config.source.extension.clone();
    for buffer in &mut session.buffers {
        let is_source = buffer
            .path()
            .and_then(|p| p.extension())
            .map(|e| e.to_string_lossy() == extension)
            .unwrap_or(false);
        if is_source && buffer.is_dirty() {
            debug!(buffer = buffer.name(), "saving before run");
            buffer.save()?;
        }
    }
    Ok(())
}

/// Ensure the runtime has the current buffer's latest code
async fn load_current_buffer(session: &mut Session) -> Result<()> {
    let path = match session.current_buffer().path() {
        Some(path) => path.to_string_lossy().into_owned(),
        // Scratch buffers have no file for the runtime to load
        None => return Ok(()),
    };
    let request = protocol::load_file_request(&session.config.harness, &path);
    debug!(%path, "loading buffer into runtime");
    session.channel.eval_value(&request).await?;
    Ok(())
}

/// Sink that keeps the terminal event and streams intermediate output
/// into the session's capped output ring
struct RunSink<'a> {
    output: &'a mut VecDeque<String>,
    max_lines: usize,
    value: Option<String>,
    error: Option<String>,
}

impl<'a> RunSink<'a> {
    fn new(output: &'a mut VecDeque<String>, max_lines: usize) -> Self {
        Self {
            output,
            max_lines,
            value: None,
            error: None,
        }
    }

    fn into_response(self) -> Result<String> {
        if let Some(error) = self.error {
            return Err(Error::Channel(error));
        }
        self.value
            .ok_or_else(|| Error::Protocol("run ended without a response".to_string()))
    }
}

impl EvalSink for RunSink<'_> {
    fn on_output(&mut self, text: &str) {
        for line in text.lines() {
            if self.output.len() == self.max_lines {
                self.output.pop_front();
            }
            self.output.push_back(line.to_string());
        }
    }

    fn on_value(&mut self, text: &str) {
        self.value = Some(text.to_string());
    }

    fn on_error(&mut self, text: &str) {
        self.error = Some(text.to_string());
    }
}

/// Scripted channel for tests: each eval pops the next response and the
/// request log is shared so tests can inspect traffic after the channel
/// moves into a session.
#[cfg(test)]
pub(crate) struct FakeChannel {
    responses: VecDeque<Result<String>>,
    output: Vec<String>,
    log: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

#[cfg(test)]
impl FakeChannel {
    pub(crate) fn scripted(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            output: Vec::new(),
            log: Default::default(),
        }
    }

    /// Lines emitted as remote output before every terminal event
    pub(crate) fn with_output(mut self, lines: &[&str]) -> Self {
        self.output = lines.iter().map(|s| s.to_string()).collect();
        self
    }

    pub(crate) fn log_handle(&self) -> std::sync::Arc<std::sync::Mutex<Vec<String>>> {
        self.log.clone()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl crate::repl::EvalChannel for FakeChannel {
    async fn eval(&mut self, code: &str, sink: &mut dyn EvalSink) -> Result<()> {
        self.log.lock().unwrap().push(code.to_string());
        for line in &self.output {
            sink.on_output(line);
        }
        match self.responses.pop_front() {
            Some(Ok(value)) => {
                sink.on_value(&value);
                Ok(())
            }
            Some(Err(Error::Channel(raw))) => {
                sink.on_error(&raw);
                Ok(())
            }
            Some(Err(error)) => Err(error),
            None => Err(Error::Internal("no scripted response left".to_string())),
        }
    }

    async fn eval_value(&mut self, code: &str) -> Result<String> {
        let mut sink = crate::repl::client::CollectSink::default();
        self.eval(code, &mut sink).await?;
        sink.into_value()
    }
}
