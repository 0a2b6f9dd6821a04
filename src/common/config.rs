//! Configuration file handling

use serde::Deserialize;
use std::path::PathBuf;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Remote runtime connection settings
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Harness request templates
    #[serde(default)]
    pub harness: HarnessConfig,

    /// Source tree layout settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Remote output buffer settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Remote runtime connection settings
#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionConfig {
    /// Host the runtime listens on
    #[serde(default = "default_host")]
    pub host: String,

    /// Port the runtime listens on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Session to evaluate in, for runtimes that multiplex sessions
    #[serde(default)]
    pub session: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            session: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    7888
}

/// Templates for the code sent to the remote test harness
///
/// Placeholders: `{namespace}`, `{check}`, `{path}`
#[derive(Debug, Deserialize, Clone)]
pub struct HarnessConfig {
    /// Template for running every check in a namespace
    #[serde(default = "default_run_all")]
    pub run_all: String,

    /// Template for running a single check
    #[serde(default = "default_run_check")]
    pub run_check: String,

    /// Template for loading a source file into the runtime
    #[serde(default = "default_load_file")]
    pub load_file: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            run_all: default_run_all(),
            run_check: default_run_check(),
            load_file: default_load_file(),
        }
    }
}

fn default_run_all() -> String {
    "(replmark.harness/run-suite '{namespace})".to_string()
}
fn default_run_check() -> String {
    "(replmark.harness/run-check '{namespace} '{check})".to_string()
}
fn default_load_file() -> String {
    "(load-file \"{path}\")".to_string()
}

/// Source tree layout settings
#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    /// Root directory for implementation sources
    #[serde(default = "default_source_root")]
    pub root: PathBuf,

    /// File extension of source files
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Namespace suffix that marks a test namespace
    #[serde(default = "default_test_suffix")]
    pub test_suffix: String,

    /// Top-level forms that define checks
    #[serde(default = "default_check_forms")]
    pub check_forms: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            root: default_source_root(),
            extension: default_extension(),
            test_suffix: default_test_suffix(),
            check_forms: default_check_forms(),
        }
    }
}

fn default_source_root() -> PathBuf {
    PathBuf::from("src")
}
fn default_extension() -> String {
    "clj".to_string()
}
fn default_test_suffix() -> String {
    "-test".to_string()
}
fn default_check_forms() -> Vec<String> {
    vec!["deftest".to_string()]
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize, Clone)]
pub struct Timeouts {
    /// Timeout for connecting to the runtime
    #[serde(default = "default_connect")]
    pub connect_secs: u64,

    /// Timeout for a single evaluation round trip
    #[serde(default = "default_eval")]
    pub eval_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect_secs: default_connect(),
            eval_secs: default_eval(),
        }
    }
}

fn default_connect() -> u64 {
    10
}
fn default_eval() -> u64 {
    60
}

/// Remote output buffer configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    /// Maximum number of remote output lines retained between commands
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
        }
    }
}

fn default_max_lines() -> usize {
    500
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    super::Error::FileRead {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    }
                })?;
                return toml::from_str(&content)
                    .map_err(|e| super::Error::ConfigParse(e.to_string()));
            }
        }
        Ok(Self::default())
    }

    /// Address of the remote runtime as `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.connection.host, self.connection.port)
    }
}
