//! Scenario configuration types
//!
//! Defines the data structures for deserializing YAML scenarios.

use serde::Deserialize;
use std::path::PathBuf;

/// A complete scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct Scenario {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// File opened as the starting buffer, relative to the scenario file
    pub file: PathBuf,
    /// The sequence of steps to execute
    pub steps: Vec<ScenarioStep>,
}

/// One command line plus expectations on its feedback
#[derive(Deserialize, Debug)]
pub struct ScenarioStep {
    /// Command line exactly as typed at the prompt
    pub command: String,
    /// Substring the status line must contain
    pub expect_status: Option<String>,
    /// Expected status styling
    pub expect_severity: Option<ExpectedSeverity>,
    /// Substring some surface's content must contain
    pub expect_surface: Option<String>,
    /// Expected marker count after the step
    pub expect_markers: Option<usize>,
}

/// Status styling a step may assert on
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedSeverity {
    Plain,
    Success,
    Failure,
    Error,
}
