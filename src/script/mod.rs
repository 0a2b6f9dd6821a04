//! Scenario runner
//!
//! Reads YAML editor scenarios and drives a session against a live
//! runtime, asserting on the structured feedback rather than parsing
//! terminal output.

mod config;
mod runner;

pub use config::*;
pub use runner::{run_scenario, ScenarioResult};
