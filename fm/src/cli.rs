//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// fm - run the FMAP multi-agent planner
#[derive(Parser)]
#[command(
    name = "fm",
    about = "Run the FMAP distributed multi-agent planner on staged PDDL files",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Solve a problem manifest with FMAP
    Solve {
        /// Problem manifest (YAML: name, agents, objects, kind)
        problem: PathBuf,

        /// Directory holding <agent>_domain.pddl and <agent>_problem.pddl
        #[arg(short, long, value_name = "DIR")]
        pddl_dir: PathBuf,

        /// Search algorithm passed to FMAP as -s
        #[arg(short, long)]
        search_algorithm: Option<String>,

        /// Heuristic passed to FMAP as -h
        #[arg(short = 'H', long)]
        heuristic: Option<String>,

        /// Timeout in milliseconds
        #[arg(short, long)]
        timeout_ms: Option<u64>,

        /// Stream solver output while it runs
        #[arg(long)]
        stream: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the FMAP command line for a problem without running it
    Command {
        /// Problem manifest
        problem: PathBuf,

        /// Search algorithm passed to FMAP as -s
        #[arg(short, long)]
        search_algorithm: Option<String>,

        /// Heuristic passed to FMAP as -h
        #[arg(short = 'H', long)]
        heuristic: Option<String>,
    },

    /// Check whether FMAP supports a problem's features
    Supports {
        /// Problem manifest
        problem: PathBuf,
    },

    /// Show FMAP credits
    Credits,
}

/// Result of checking a required tool
pub struct ToolCheck {
    pub name: String,
    pub available: bool,
    pub version: Option<String>,
}

impl ToolCheck {
    /// Check if a tool is available and get its version
    pub fn check(name: &str, version_args: &[&str]) -> Self {
        debug!(name, ?version_args, "ToolCheck::check: called");
        let result = std::process::Command::new(name).args(version_args).output();

        match result {
            Ok(output) if output.status.success() => {
                debug!(name, "ToolCheck::check: tool available");
                // java prints its version on stderr
                let version_str = format!(
                    "{} {}",
                    String::from_utf8_lossy(&output.stdout),
                    String::from_utf8_lossy(&output.stderr)
                );
                let version = parse_version(&version_str);
                Self {
                    name: name.to_string(),
                    available: true,
                    version: Some(version),
                }
            }
            _ => {
                debug!(name, "ToolCheck::check: tool not available");
                Self {
                    name: name.to_string(),
                    available: false,
                    version: None,
                }
            }
        }
    }
}

/// Parse version from command output (extracts first version-like string)
fn parse_version(output: &str) -> String {
    debug!(%output, "parse_version: called");
    // Look for patterns like "17.0.2", "v1.2.3" or "\"1.8.0_392\""
    for word in output.split_whitespace() {
        let word = word.trim_matches('"').trim_start_matches('v');
        if word.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            // Take until non-version character
            let version: String = word.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
            if !version.is_empty() {
                debug!(%version, "parse_version: found version");
                return version;
            }
        }
    }
    debug!("parse_version: no version found, returning unknown");
    "unknown".to_string()
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fmap")
        .join("logs")
        .join("fmap.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Generate the after_help text with the java check and log location
pub fn generate_after_help(java: &str) -> String {
    debug!(%java, "generate_after_help: called");
    let tool = ToolCheck::check(java, &["-version"]);
    let log_path = get_log_path();

    let mut help = String::new();

    help.push_str("Required Tools:\n");
    let icon = if tool.available {
        debug!(name = %tool.name, "generate_after_help: tool available");
        "\u{2705}"
    } else {
        debug!(name = %tool.name, "generate_after_help: tool not available");
        "\u{274C}"
    };
    let version = tool.version.as_deref().unwrap_or("not found");
    help.push_str(&format!("  {} {:<10} {}\n", icon, tool.name, version));

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", log_path.display()));

    debug!("generate_after_help: returning help text");
    help
}

/// Output format for results
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text or json", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
