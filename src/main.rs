//! replmark - inline test results for remote-runtime editors
//!
//! Connects to a remote language runtime, runs its test harness against
//! the current buffer and renders results as inline markers at the prompt.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use replmark::buffer::Buffer;
use replmark::common::config::Config;
use replmark::common::{logging, parse_address};
use replmark::repl::ReplClient;
use replmark::{driver, script, Result, Session};

#[derive(Parser)]
#[command(name = "replmark", about = "Inline test results for remote-runtime editors")]
#[command(version, long_about = None)]
struct Cli {
    /// File to open as the starting buffer
    file: Option<PathBuf>,

    /// Address of the remote runtime, overriding configuration
    #[arg(long, value_name = "HOST:PORT")]
    connect: Option<String>,

    /// Session id for runtimes that multiplex evaluation sessions
    #[arg(long)]
    session: Option<String>,

    /// Execute these command lines instead of reading the prompt
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    commands: Vec<String>,

    /// Run a YAML scenario and exit nonzero when it fails
    #[arg(long, value_name = "FILE", conflicts_with = "commands")]
    script: Option<PathBuf>,

    /// Append logs to this file instead of the default location
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Interactive runs log to a file so the prompt stays clean; batch and
    // scenario runs log to stderr. The guard flushes the file on drop.
    let interactive = cli.commands.is_empty() && cli.script.is_none();
    let _guard = if interactive || cli.log_file.is_some() {
        logging::init_file(cli.log_file.as_deref())
    } else {
        logging::init_stderr();
        None
    };

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(address) = &cli.connect {
        let (host, port) = parse_address(address)?;
        config.connection.host = host;
        config.connection.port = port;
    }
    if let Some(session_id) = cli.session {
        config.connection.session = Some(session_id);
    }

    let channel = ReplClient::connect(
        &config.address(),
        config.connection.session.clone(),
        Duration::from_secs(config.timeouts.connect_secs),
        Duration::from_secs(config.timeouts.eval_secs),
    )
    .await?;

    if let Some(path) = &cli.script {
        let result = script::run_scenario(path, config, Box::new(channel)).await?;
        if !result.passed {
            std::process::exit(1);
        }
        return Ok(());
    }

    let buffer = match &cli.file {
        Some(path) => Buffer::open(path)?,
        None => Buffer::scratch("*scratch*", ""),
    };
    let mut session = Session::new(config, Box::new(channel), buffer);

    if cli.commands.is_empty() {
        driver::interactive(&mut session).await
    } else {
        driver::batch(&mut session, &cli.commands).await
    }
}
