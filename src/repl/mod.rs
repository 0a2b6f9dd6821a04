//! Remote evaluation channel: framing, envelopes and the TCP client

pub mod client;
pub mod codec;
pub mod protocol;

pub use client::{EvalChannel, EvalSink, ReplClient};
pub use protocol::{EvalEvent, EvalRequest};
