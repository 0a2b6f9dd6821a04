//! Scenario runner implementation
//!
//! Executes scenario steps through a real session and checks each
//! step's expectations against the structured feedback.

use std::path::Path;

use colored::Colorize;

use crate::buffer::Buffer;
use crate::commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::repl::EvalChannel;
use crate::session::{Feedback, Session, StatusSeverity};

use super::config::{ExpectedSeverity, Scenario, ScenarioStep};

/// Result of a scenario run
#[derive(Debug)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    pub error: Option<String>,
}

/// Run a scenario from a YAML file
pub async fn run_scenario(
    path: &Path,
    config: Config,
    channel: Box<dyn EvalChannel>,
) -> Result<ScenarioResult> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read scenario '{}': {}",
            path.display(),
            e
        ))
    })?;

    let scenario: Scenario = serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse scenario: {}", e)))?;

    let steps_total = scenario.steps.len();

    println!(
        "\n{} {}",
        "Running Scenario:".blue().bold(),
        scenario.name.white().bold()
    );
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    // The starting buffer resolves relative to the scenario file
    let scenario_dir = path.parent().unwrap_or(Path::new("."));
    let file = if scenario.file.is_relative() {
        scenario_dir.join(&scenario.file)
    } else {
        scenario.file.clone()
    };
    let buffer = Buffer::open(&file)?;
    let mut session = Session::new(config, channel, buffer);

    println!("\n{}", "Steps:".cyan());
    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;
        match execute_step(&mut session, step).await {
            Ok(()) => {
                println!(
                    "  {} Step {}: {}",
                    "✓".green(),
                    step_num,
                    step.command.dimmed()
                );
            }
            Err(e) => {
                println!("  {} Step {}: {}", "✗".red(), step_num, e);
                return Ok(ScenarioResult {
                    name: scenario.name.clone(),
                    passed: false,
                    steps_run: step_num,
                    steps_total,
                    error: Some(e.to_string()),
                });
            }
        }
    }

    println!(
        "\n{} {}\n",
        "✓".green().bold(),
        "Scenario Passed".green().bold()
    );

    Ok(ScenarioResult {
        name: scenario.name,
        passed: true,
        steps_run: steps_total,
        steps_total,
        error: None,
    })
}

async fn execute_step(session: &mut Session, step: &ScenarioStep) -> Result<()> {
    let command = commands::parse_line(&step.command)
        .map_err(|e| Error::Config(format!("Bad command '{}': {}", step.command, e)))?
        .ok_or_else(|| Error::Config("Blank command in scenario".to_string()))?;

    let feedback = session.execute(command).await;
    session.take_remote_output();

    check_expectations(session, step, &feedback)
}

fn check_expectations(session: &Session, step: &ScenarioStep, feedback: &Feedback) -> Result<()> {
    if let Some(expected) = &step.expect_status {
        let actual = feedback
            .status
            .as_ref()
            .map(|s| s.text.as_str())
            .unwrap_or("");
        if !actual.contains(expected.as_str()) {
            return Err(Error::ScenarioAssertion(format!(
                "status '{}' does not contain '{}'",
                actual, expected
            )));
        }
    }

    if let Some(expected) = step.expect_severity {
        let actual = feedback.status.as_ref().map(|s| s.severity);
        if actual != Some(severity(expected)) {
            return Err(Error::ScenarioAssertion(format!(
                "expected {:?} status, got {:?}",
                expected, actual
            )));
        }
    }

    if let Some(expected) = &step.expect_surface {
        if !feedback
            .surfaces
            .iter()
            .any(|s| s.content.contains(expected.as_str()))
        {
            return Err(Error::ScenarioAssertion(format!(
                "no surface contains '{}'",
                expected
            )));
        }
    }

    if let Some(expected) = step.expect_markers {
        let actual = session.current_buffer().marks().len();
        if actual != expected {
            return Err(Error::ScenarioAssertion(format!(
                "expected {} markers, found {}",
                expected, actual
            )));
        }
    }

    Ok(())
}

fn severity(expected: ExpectedSeverity) -> StatusSeverity {
    match expected {
        ExpectedSeverity::Plain => StatusSeverity::Plain,
        ExpectedSeverity::Success => StatusSeverity::Success,
        ExpectedSeverity::Failure => StatusSeverity::Failure,
        ExpectedSeverity::Error => StatusSeverity::Error,
    }
}
