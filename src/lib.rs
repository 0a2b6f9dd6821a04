//! replmark - inline test results for remote-runtime editors
//!
//! This library drives a remote language runtime's test harness over a
//! framed JSON protocol and reflects results as markers bound to buffer
//! positions, with navigation and inspection built on top.

pub mod annotate;
pub mod buffer;
pub mod checks;
pub mod commands;
pub mod common;
pub mod driver;
pub mod outcome;
pub mod repl;
pub mod script;
pub mod session;
pub mod sexp;
pub mod srcmap;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use session::{Feedback, Session, StatusLine, StatusSeverity};
