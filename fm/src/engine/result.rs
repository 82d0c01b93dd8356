//! Planning results returned to the host

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::runner::ExecOutcome;
use crate::model::MultiAgentPlan;

/// Final classification of one solve call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanGenerationStatus {
    SolvedSatisficing,
    UnsolvableProven,
    InternalError,
    Timeout,
}

impl PlanGenerationStatus {
    /// Classify a finished (or abandoned) solver run
    ///
    /// Order matters: timeout with a nonzero (or unknown) exit code first, then
    /// any nonzero exit, then plan presence. A run that hit the deadline but
    /// still reported exit code 0 is classified by its plan file.
    pub fn classify(outcome: &ExecOutcome, plan_present: bool) -> Self {
        debug!(
            timed_out = outcome.timed_out,
            exit_code = ?outcome.exit_code,
            plan_present,
            "PlanGenerationStatus::classify: called"
        );
        if outcome.timed_out && !outcome.succeeded() {
            Self::Timeout
        } else if !outcome.succeeded() {
            Self::InternalError
        } else if !plan_present {
            Self::UnsolvableProven
        } else {
            Self::SolvedSatisficing
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, Self::SolvedSatisficing)
    }
}

impl fmt::Display for PlanGenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SolvedSatisficing => "SOLVED_SATISFICING",
            Self::UnsolvableProven => "UNSOLVABLE_PROVEN",
            Self::InternalError => "INTERNAL_ERROR",
            Self::Timeout => "TIMEOUT",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: LogLevel,
    pub message: String,
}

impl LogMessage {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Outcome of `FmapSolver::solve`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanGenerationResult {
    pub status: PlanGenerationStatus,

    /// Present only when the solver left a plan file behind
    pub plan: Option<MultiAgentPlan>,

    pub engine_name: String,

    /// Solver stdout (info) followed by solver stderr (error)
    pub log_messages: Vec<LogMessage>,
}

impl PlanGenerationResult {
    pub fn log(&self, level: LogLevel) -> impl Iterator<Item = &LogMessage> {
        self.log_messages.iter().filter(move |m| m.level == level)
    }
}
