//! fm - FMAP multi-agent planner runner
//!
//! CLI entry point for solving staged multi-agent problems with FMAP.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use fmap_engine::cli::{Cli, Command, OutputFormat, generate_after_help, get_log_path};
use fmap_engine::config::Config;
use fmap_engine::engine::{FmapSolver, PlanGenerationResult, ScratchLayout};
use fmap_engine::model::MultiAgentProblem;
use fmap_engine::writer::StagedWriter;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Only probe java when help will actually be shown
    let pre_args: Vec<String> = std::env::args().collect();
    let mut cmd = Cli::command();
    if pre_args.iter().any(|a| a == "-h" || a == "--help" || a == "help") {
        let help_java = Config::load(config_arg(&pre_args).as_ref())
            .map(|c| c.solver.java)
            .unwrap_or_else(|_| "java".to_string());
        cmd = cmd.after_help(generate_after_help(&help_java));
    }
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(java = %config.solver.java, jar = %config.solver.jar.display(), "fm loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Solve {
            problem,
            pddl_dir,
            search_algorithm,
            heuristic,
            timeout_ms,
            stream,
            format,
        } => {
            debug!(?problem, ?pddl_dir, "main: matched Solve command");
            let solved = cmd_solve(
                &config,
                &problem,
                &pddl_dir,
                search_algorithm,
                heuristic,
                timeout_ms,
                stream,
                format,
            )
            .await?;
            if !solved {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Command {
            problem,
            search_algorithm,
            heuristic,
        } => {
            debug!(?problem, "main: matched Command command");
            cmd_command(&config, &problem, search_algorithm, heuristic)
        }
        Command::Supports { problem } => {
            debug!(?problem, "main: matched Supports command");
            let supported = cmd_supports(&problem)?;
            if !supported {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Credits => {
            debug!("main: matched Credits command");
            println!("{}", FmapSolver::credits());
            Ok(())
        }
    }
}

/// Find `-c`/`--config` before clap runs
fn config_arg(args: &[String]) -> Option<PathBuf> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "-c" || arg == "--config" {
            return iter.next().map(PathBuf::from);
        }
        if let Some(value) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(value));
        }
    }
    None
}

/// Solver from config, with CLI flags overriding config defaults when given
fn build_solver(
    config: &Config,
    pddl_dir: &Path,
    search_algorithm: Option<String>,
    heuristic: Option<String>,
) -> FmapSolver {
    let mut solver = FmapSolver::from_config(&config.solver, Arc::new(StagedWriter::new(pddl_dir)));
    if search_algorithm.is_some() {
        solver = solver.with_search_algorithm(search_algorithm);
    }
    if heuristic.is_some() {
        solver = solver.with_heuristic(heuristic);
    }
    solver
}

fn load_problem(path: &Path) -> Result<MultiAgentProblem> {
    MultiAgentProblem::load(path).context(format!("Failed to load problem {}", path.display()))
}

#[allow(clippy::too_many_arguments)]
async fn cmd_solve(
    config: &Config,
    problem_path: &Path,
    pddl_dir: &Path,
    search_algorithm: Option<String>,
    heuristic: Option<String>,
    timeout_ms: Option<u64>,
    stream: bool,
    format: OutputFormat,
) -> Result<bool> {
    config.validate()?;
    let problem = load_problem(problem_path)?;

    if !FmapSolver::supports(problem.kind()) {
        let missing = problem.kind().missing_from(&FmapSolver::supported_kind());
        eyre::bail!(
            "FMAP does not support problem {}: {}",
            problem.name,
            missing.iter().map(|f| f.to_string()).collect::<Vec<_>>().join(", ")
        );
    }

    let solver = build_solver(config, pddl_dir, search_algorithm, heuristic);
    let timeout = timeout_ms.map(Duration::from_millis).or_else(|| config.solver.timeout());

    let mut stderr = io::stderr();
    let sink: Option<&mut (dyn io::Write + Send)> = if stream { Some(&mut stderr) } else { None };
    let result = solver
        .solve(&problem, timeout, sink)
        .await
        .context("FMAP run failed")?;

    print_result(&result, &format)?;
    Ok(result.status.is_solved())
}

fn print_result(result: &PlanGenerationResult, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Text => {
            let status = result.status.to_string();
            let status = if result.status.is_solved() {
                status.green()
            } else {
                status.red()
            };
            println!("{}: {}", result.engine_name.bold(), status);
            if let Some(plan) = &result.plan {
                for step in &plan.steps {
                    println!("  {:>3}: [{}] ({} {})", step.index, step.agent, step.action, step.parameters.join(" "));
                }
            }
        }
    }
    Ok(())
}

fn cmd_command(
    config: &Config,
    problem_path: &Path,
    search_algorithm: Option<String>,
    heuristic: Option<String>,
) -> Result<()> {
    let problem = load_problem(problem_path)?;
    let solver = build_solver(config, Path::new("."), search_algorithm, heuristic);

    let layout = ScratchLayout::new("<scratch>");
    println!("{}", solver.command_line(&problem, &layout));
    Ok(())
}

fn cmd_supports(problem_path: &Path) -> Result<bool> {
    let problem = load_problem(problem_path)?;
    let missing = problem.kind().missing_from(&FmapSolver::supported_kind());

    if missing.is_empty() {
        println!("{} {} is supported by FMAP", "\u{2705}".green(), problem.name);
        return Ok(true);
    }

    println!("{} {} is not supported by FMAP", "\u{274C}".red(), problem.name);
    for feature in missing {
        println!("  unsupported: {}", feature);
    }
    Ok(false)
}
