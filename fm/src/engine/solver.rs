//! The FMAP planning adapter

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::command::{CommandLine, Launcher, build_command};
use super::credits::{Credits, FMAP_CREDITS};
use super::layout::ScratchLayout;
use super::result::{LogLevel, LogMessage, PlanGenerationResult, PlanGenerationStatus};
use super::runner::{OutputSink, ProcessRunner, TokioRunner};
use crate::config::SolverConfig;
use crate::error::FmapError;
use crate::model::{Feature, MultiAgentPlan, MultiAgentProblem, ProblemKind};
use crate::writer::MaPddlWriter;

/// Runs FMAP on multi-agent problems
///
/// Every call to `solve` is independent: it gets its own scratch directory
/// and subprocess, and nothing is remembered between calls, so one solver can
/// be shared across tasks.
#[derive(Clone)]
pub struct FmapSolver {
    launcher: Launcher,
    search_algorithm: Option<String>,
    heuristic: Option<String>,
    scratch_root: Option<PathBuf>,
    writer: Arc<dyn MaPddlWriter>,
    runner: Arc<dyn ProcessRunner>,
}

impl FmapSolver {
    pub const NAME: &'static str = "FMAP";

    pub fn new(launcher: Launcher, writer: Arc<dyn MaPddlWriter>) -> Self {
        debug!(?launcher, "FmapSolver::new: called");
        Self {
            launcher,
            search_algorithm: None,
            heuristic: None,
            scratch_root: None,
            writer,
            runner: Arc::new(TokioRunner::default()),
        }
    }

    /// Build a solver from configuration, using the tokio runner
    pub fn from_config(config: &SolverConfig, writer: Arc<dyn MaPddlWriter>) -> Self {
        debug!(?config, "FmapSolver::from_config: called");
        Self {
            launcher: Launcher::new(config.java.clone(), config.jar.clone()),
            search_algorithm: config.search_algorithm.clone(),
            heuristic: config.heuristic.clone(),
            scratch_root: config.scratch_dir.clone(),
            writer,
            runner: Arc::new(TokioRunner::new(config.kill_on_timeout, config.kill_grace())),
        }
    }

    pub fn with_search_algorithm(mut self, search_algorithm: Option<String>) -> Self {
        self.search_algorithm = search_algorithm;
        self
    }

    pub fn with_heuristic(mut self, heuristic: Option<String>) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Create scratch directories under `root` instead of the system temp dir
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }

    pub fn credits() -> &'static Credits {
        &FMAP_CREDITS
    }

    /// Features FMAP can handle
    pub fn supported_kind() -> ProblemKind {
        [
            Feature::ActionBasedMultiAgent,
            Feature::FlatTyping,
            Feature::NegativeConditions,
            Feature::DisjunctiveConditions,
            Feature::Equality,
            Feature::ExistentialConditions,
            Feature::UniversalConditions,
            Feature::ConditionalEffects,
            Feature::NumericFluents,
            Feature::ObjectFluents,
        ]
        .into_iter()
        .collect()
    }

    pub fn supports(kind: &ProblemKind) -> bool {
        kind.is_subset_of(&Self::supported_kind())
    }

    /// The command `solve` would run with files laid out under `layout`
    pub fn command_line(&self, problem: &MultiAgentProblem, layout: &ScratchLayout) -> CommandLine {
        build_command(
            &self.launcher,
            problem,
            layout,
            self.search_algorithm.as_deref(),
            self.heuristic.as_deref(),
        )
    }

    fn scratch_dir(&self) -> Result<tempfile::TempDir, FmapError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("fmap-");
        let dir = match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(FmapError::Scratch)
    }

    /// Run FMAP once and classify the result
    ///
    /// `output`, when given, receives solver stdout/stderr as it is produced.
    /// The scratch directory is removed before this returns, on every path.
    pub async fn solve(
        &self,
        problem: &MultiAgentProblem,
        timeout: Option<Duration>,
        output: Option<OutputSink<'_>>,
    ) -> Result<PlanGenerationResult, FmapError> {
        debug!(problem = %problem.name, ?timeout, streaming = output.is_some(), "FmapSolver::solve: called");
        let scratch = self.scratch_dir()?;
        let layout = ScratchLayout::new(scratch.path());

        self.writer.write_ma_domain(problem, &layout)?;
        self.writer.write_ma_problem(problem, &layout)?;

        let command = self.command_line(problem, &layout);
        info!(problem = %problem.name, %command, "Launching FMAP");
        let outcome = self.runner.run(&command, layout.root(), timeout, output).await?;

        let log_messages = vec![
            LogMessage::new(LogLevel::Info, outcome.stdout.clone()),
            LogMessage::new(LogLevel::Error, outcome.stderr.clone()),
        ];

        let plan_path = layout.plan_path();
        let plan = if plan_path.is_file() {
            debug!(path = %plan_path.display(), "FmapSolver::solve: plan file found");
            match MultiAgentPlan::from_file(&plan_path, problem, |name| self.writer.item_named(problem, name)) {
                Ok(plan) => Some(plan),
                // A failed run may leave a truncated plan behind
                Err(e) if !outcome.succeeded() => {
                    warn!(error = %e, "Ignoring unreadable plan from failed run");
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            debug!("FmapSolver::solve: no plan file");
            None
        };

        let status = PlanGenerationStatus::classify(&outcome, plan.is_some());
        info!(problem = %problem.name, %status, steps = ?plan.as_ref().map(|p| p.len()), "FMAP finished");

        if let Err(e) = scratch.close() {
            warn!(error = %e, "Failed to remove scratch directory");
        }

        Ok(PlanGenerationResult {
            status,
            plan,
            engine_name: self.name().to_string(),
            log_messages,
        })
    }

    /// Blocking form of `solve` for callers without a runtime
    ///
    /// Must not be called from inside a tokio runtime.
    pub fn solve_blocking(
        &self,
        problem: &MultiAgentProblem,
        timeout: Option<Duration>,
        output: Option<OutputSink<'_>>,
    ) -> Result<PlanGenerationResult, FmapError> {
        debug!("FmapSolver::solve_blocking: called");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(FmapError::Runtime)?;
        runtime.block_on(self.solve(problem, timeout, output))
    }
}
