//! Solver command-line construction

use std::fmt;
use std::path::PathBuf;
use tracing::debug;

use super::layout::ScratchLayout;
use crate::model::MultiAgentProblem;

/// How to invoke the FMAP jar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launcher {
    /// Java executable
    pub java: String,

    /// Path to FMAP.jar
    pub jar: PathBuf,
}

impl Launcher {
    pub fn new(java: impl Into<String>, jar: impl Into<PathBuf>) -> Self {
        Self {
            java: java.into(),
            jar: jar.into(),
        }
    }
}

/// Program plus ordered arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append `flag value` only when `value` is present and non-empty
    pub fn flag(mut self, flag: &str, value: Option<&str>) -> Self {
        if let Some(v) = value.filter(|v| !v.is_empty()) {
            self.args.push(flag.to_string());
            self.args.push(v.to_string());
        }
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Build the FMAP invocation
///
/// `java -jar <jar> [<agent>_type <domain> <problem>]... [-s <alg>] [-h <heur>]`
pub fn build_command(
    launcher: &Launcher,
    problem: &MultiAgentProblem,
    layout: &ScratchLayout,
    search_algorithm: Option<&str>,
    heuristic: Option<&str>,
) -> CommandLine {
    debug!(
        problem = %problem.name,
        agents = problem.agents().len(),
        ?search_algorithm,
        ?heuristic,
        "build_command: called"
    );
    let mut cmd = CommandLine::new(&launcher.java)
        .arg("-jar")
        .arg(launcher.jar.to_string_lossy());

    for agent in problem.agents() {
        cmd = cmd
            .arg(format!("{}_type", agent.name))
            .arg(layout.domain_path(&agent.name).to_string_lossy())
            .arg(layout.problem_path(&agent.name).to_string_lossy());
    }

    cmd.flag("-s", search_algorithm).flag("-h", heuristic)
}
