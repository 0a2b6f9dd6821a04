//! Client side of the remote evaluation channel
//!
//! One connection carries one outstanding evaluation at a time. Events
//! answering anything other than the outstanding request are logged and
//! skipped rather than buffered.

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;

use crate::common::{Error, Result};

use super::codec;
use super::protocol::{EvalEvent, EvalRequest};

/// Callbacks receiving the stages of one evaluation
pub trait EvalSink: Send {
    /// Intermediate output printed by the remote runtime
    fn on_output(&mut self, text: &str);
    /// Terminal printed value
    fn on_value(&mut self, text: &str);
    /// Terminal remote error, raw and unparsed
    fn on_error(&mut self, text: &str);
}

/// A channel that evaluates code remotely
#[async_trait]
pub trait EvalChannel: Send {
    /// Evaluate code, delivering stages to the sink. Returns once a
    /// terminal event for this evaluation has arrived.
    async fn eval(&mut self, code: &str, sink: &mut dyn EvalSink) -> Result<()>;

    /// Evaluate code and return the printed value. A remote error becomes
    /// a channel error carrying the raw remote output.
    async fn eval_value(&mut self, code: &str) -> Result<String>;
}

/// TCP client for a remote eval server
pub struct ReplClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    /// Sequence number for request ids
    seq: u64,
    /// Session forwarded with every request, if configured
    session: Option<String>,
    eval_timeout: Duration,
}

impl ReplClient {
    /// Connect to the runtime at `addr` (`host:port`)
    pub async fn connect(
        addr: &str,
        session: Option<String>,
        connect_timeout: Duration,
        eval_timeout: Duration,
    ) -> Result<Self> {
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| Error::ConnectTimeout {
                addr: addr.to_string(),
                seconds: connect_timeout.as_secs(),
            })?
            .map_err(|e| Error::connect_failed(addr, e))?;

        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            seq: 1,
            session,
            eval_timeout,
        })
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    async fn send_request(&mut self, code: &str) -> Result<u64> {
        let request = EvalRequest::eval(self.next_seq(), code, self.session.as_deref());
        let json = serde_json::to_string(&request)?;
        tracing::debug!("repl >>> {}", json);
        codec::write_message(&mut self.writer, &json).await?;
        Ok(request.id)
    }

    async fn read_event(&mut self) -> Result<EvalEvent> {
        let json = codec::read_message(&mut self.reader).await?;
        tracing::debug!("repl <<< {}", json);
        serde_json::from_str(&json).map_err(|e| Error::Protocol(format!("Invalid event: {}", e)))
    }

    /// One exchange: send the request, deliver events until terminal
    async fn exchange(&mut self, code: &str, sink: &mut dyn EvalSink) -> Result<()> {
        let id = self.send_request(code).await?;
        loop {
            let event = self.read_event().await?;
            if event.id() != id {
                tracing::warn!(
                    got = event.id(),
                    expected = id,
                    "event for stale request, skipping"
                );
                continue;
            }
            match event {
                EvalEvent::Output { text, .. } => sink.on_output(&text),
                EvalEvent::Value { text, .. } => {
                    sink.on_value(&text);
                    return Ok(());
                }
                EvalEvent::Error { text, .. } => {
                    sink.on_error(&text);
                    return Ok(());
                }
            }
        }
    }
}

#[async_trait]
impl EvalChannel for ReplClient {
    async fn eval(&mut self, code: &str, sink: &mut dyn EvalSink) -> Result<()> {
        let seconds = self.eval_timeout.as_secs();
        tokio::time::timeout(self.eval_timeout, self.exchange(code, sink))
            .await
            .map_err(|_| Error::EvalTimeout(seconds))?
    }

    async fn eval_value(&mut self, code: &str) -> Result<String> {
        let mut sink = CollectSink::default();
        self.eval(code, &mut sink).await?;
        sink.into_value()
    }
}

/// Sink that keeps the terminal value and drops intermediate output
#[derive(Default)]
pub(crate) struct CollectSink {
    value: Option<String>,
    error: Option<String>,
}

impl EvalSink for CollectSink {
    fn on_output(&mut self, _text: &str) {}

    fn on_value(&mut self, text: &str) {
        self.value = Some(text.to_string());
    }

    fn on_error(&mut self, text: &str) {
        self.error = Some(text.to_string());
    }
}

impl CollectSink {
    pub(crate) fn into_value(self) -> Result<String> {
        if let Some(error) = self.error {
            return Err(Error::Channel(error));
        }
        self.value
            .ok_or_else(|| Error::Protocol("evaluation ended without a value".to_string()))
    }
}
