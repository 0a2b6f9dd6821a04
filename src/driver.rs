//! Interactive and batch drivers
//!
//! Both feed command lines through one session. The interactive driver
//! adds a prompt and reads stdin until quit or end of input; batch mode
//! executes a fixed list of lines and exits.

use std::io::Write;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::annotate::inspect::Surface;
use crate::commands::{self, EditorCommand};
use crate::common::Result;
use crate::session::{Feedback, Session, StatusSeverity, SurfaceLayout};

/// Read commands from stdin until quit or end of input
pub async fn interactive(session: &mut Session) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    print_prompt();
    while let Some(line) = lines.next_line().await? {
        if !handle_line(session, &line).await {
            return Ok(());
        }
        print_prompt();
    }
    println!();
    Ok(())
}

/// Execute a fixed list of command lines, stopping at the first quit
pub async fn batch(session: &mut Session, lines: &[String]) -> Result<()> {
    for line in lines {
        if !handle_line(session, line).await {
            break;
        }
    }
    Ok(())
}

/// Returns false once the driver should exit
async fn handle_line(session: &mut Session, line: &str) -> bool {
    let command = match commands::parse_line(line) {
        Ok(Some(command)) => command,
        Ok(None) => return true,
        // Renders usage errors and `help` output alike
        Err(error) => {
            print!("{}", error.render());
            return true;
        }
    };
    if matches!(command, EditorCommand::Quit) {
        return false;
    }
    let feedback = session.execute(command).await;
    for output in session.take_remote_output() {
        println!("{}", output.dimmed());
    }
    print_feedback(&feedback);
    true
}

fn print_prompt() {
    print!("replmark> ");
    let _ = std::io::stdout().flush();
}

/// Render feedback the way the session classified it
pub fn print_feedback(feedback: &Feedback) {
    if let Some(status) = &feedback.status {
        let text = match status.severity {
            StatusSeverity::Plain => status.text.normal(),
            StatusSeverity::Success => status.text.green(),
            StatusSeverity::Failure => status.text.red(),
            StatusSeverity::Error => status.text.bright_red().bold(),
        };
        println!("{}", text);
    }
    match feedback.layout {
        SurfaceLayout::SideBySide if feedback.surfaces.len() == 2 => {
            for row in side_by_side(&feedback.surfaces[0], &feedback.surfaces[1]) {
                println!("{}", row);
            }
        }
        _ => {
            for surface in &feedback.surfaces {
                println!("{}", format!("--- {} ---", surface.title).cyan());
                println!("{}", surface.content);
            }
        }
    }
}

/// Lay two surfaces out in columns, the left one padded to its widest line
fn side_by_side(left: &Surface, right: &Surface) -> Vec<String> {
    let left_lines: Vec<&str> = left.content.lines().collect();
    let right_lines: Vec<&str> = right.content.lines().collect();
    let width = left_lines
        .iter()
        .map(|l| l.chars().count())
        .chain([left.title.chars().count()])
        .max()
        .unwrap_or(0);

    let mut rows = Vec::with_capacity(1 + left_lines.len().max(right_lines.len()));
    rows.push(
        format!("{:<width$} | {}", left.title, right.title)
            .cyan()
            .to_string(),
    );
    for i in 0..left_lines.len().max(right_lines.len()) {
        let l = left_lines.get(i).copied().unwrap_or("");
        let r = right_lines.get(i).copied().unwrap_or("");
        rows.push(format!("{:<width$} | {}", l, r));
    }
    rows
}
