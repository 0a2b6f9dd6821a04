//! Editor command definitions
//!
//! The driver prompt, batch mode and scenario scripts all parse command
//! lines through the same clap surface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wrapper so a tokenized prompt line parses as a bare subcommand
#[derive(Parser)]
#[command(name = "replmark", no_binary_name = true, disable_version_flag = true)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: EditorCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum EditorCommand {
    /// Run every check in the buffer's namespace
    #[command(alias = "run")]
    RunTests,

    /// Run only the check enclosing the cursor
    #[command(alias = "run-one")]
    RunTest,

    /// Show the message of the result at the cursor
    #[command(alias = "result")]
    ShowResult,

    /// Show the full rendered result at the cursor
    #[command(alias = "raw")]
    ShowRawResult,

    /// Split the result at the cursor into expected and actual views
    #[command(alias = "diff")]
    ShowDiff,

    /// Remove all result markers from the buffer
    #[command(alias = "clear")]
    ClearResults,

    /// Move the cursor to the next problem marker
    #[command(alias = "next")]
    NextProblem,

    /// Move the cursor to the previous problem marker
    #[command(alias = "prev")]
    PreviousProblem,

    /// Open the implementation source for this test namespace
    #[command(alias = "jump")]
    JumpToImplementation,

    /// Move the cursor to a line and optional column
    #[command(alias = "g")]
    Goto {
        /// 1-based line
        line: u32,

        /// 0-based column
        #[arg(default_value = "0")]
        column: u32,
    },

    /// Open a source file and make it current
    Open {
        /// File to open
        file: PathBuf,
    },

    /// Show buffer, cursor and last-run state
    Status,

    /// Leave the driver
    #[command(aliases = ["exit", "q"])]
    Quit,
}

/// Parse one prompt line. Blank lines parse to `None`; anything clap
/// rejects (including `help`) comes back as the clap error to render.
pub fn parse_line(line: &str) -> Result<Option<EditorCommand>, clap::Error> {
    let tokens = tokenize(line);
    if tokens.is_empty() {
        return Ok(None);
    }
    CommandLine::try_parse_from(tokens).map(|cli| Some(cli.command))
}

/// Split a prompt line into tokens, honoring double quotes
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
