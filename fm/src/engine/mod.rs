//! FMAP subprocess adapter
//!
//! One `solve` call: stage per-agent PDDL files in a scratch directory, run
//! the FMAP jar over them, read back `plan.txt` if the solver produced one,
//! and classify the run.

mod command;
mod credits;
mod layout;
mod result;
mod runner;
mod solver;

pub use command::{CommandLine, Launcher, build_command};
pub use credits::{Credits, FMAP_CREDITS};
pub use layout::{FILE_PREFIX, PLAN_FILE, ScratchLayout};
pub use result::{LogLevel, LogMessage, PlanGenerationResult, PlanGenerationStatus};
pub use runner::{ExecOutcome, OutputSink, ProcessRunner, TokioRunner};
pub use solver::FmapSolver;
