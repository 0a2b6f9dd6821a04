//! Error types for replmark
//!
//! Error messages are designed to read well as a single editor status line,
//! with hints on how to resolve common issues.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for replmark
#[derive(Error, Debug)]
pub enum Error {
    // === Connection Errors ===
    #[error("Failed to connect to {addr}: {source}")]
    ConnectFailed { addr: String, source: io::Error },

    #[error("Timed out connecting to {addr} after {seconds} seconds")]
    ConnectTimeout { addr: String, seconds: u64 },

    #[error("Remote runtime closed the connection")]
    ChannelClosed,

    // === Remote Evaluation Errors ===
    #[error("Remote evaluation failed: {0}")]
    Channel(String),

    #[error("Evaluation timed out after {0} seconds. The remote runtime may still be working")]
    EvalTimeout(u64),

    // === Protocol Errors ===
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Malformed result payload: {0}")]
    Decode(String),

    // === Cursor/Result Errors ===
    #[error("No test result at point")]
    NoMarkerAtPoint,

    #[error("Not inside a check form. Move the cursor into one and retry")]
    NotInCheck,

    #[error("Result is not a negated comparison of two operands: {0}")]
    DiffShape(String),

    #[error("A test run is already in progress")]
    RunInFlight,

    #[error("No namespace declaration found in '{0}'")]
    NoNamespace(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Scenario Errors ===
    #[error("Scenario assertion failed: {0}")]
    ScenarioAssertion(String),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a connection failure error for an address
    pub fn connect_failed(addr: &str, source: io::Error) -> Self {
        Self::ConnectFailed {
            addr: addr.to_string(),
            source,
        }
    }

    /// Create a decode error for a malformed result payload
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a file read error
    pub fn file_read(path: &std::path::Path, error: &io::Error) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Whether this error is an expected no-op condition rather than a failure.
    ///
    /// These surface as a plain status line instead of an error-styled one.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NoMarkerAtPoint | Self::NotInCheck)
    }
}
