//! Reader for printed s-expression data
//!
//! The remote harness answers with printed forms, not JSON. This module
//! parses that text into a small form tree that result decoding and diff
//! extraction walk.

pub mod form;
pub mod parse;

pub use form::Form;
pub use parse::{parse_form, parse_forms, ParseError};
