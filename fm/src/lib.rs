//! FMAP Engine - run the FMAP multi-agent planner from Rust
//!
//! FMAP is a distributed multi-agent planner shipped as a Java jar. This crate
//! does no planning itself: it stages per-agent PDDL files, runs the jar as a
//! subprocess, and turns what the process leaves behind into a typed result.
//!
//! # Core Concepts
//!
//! - **One Call, One Process**: every `solve` gets its own scratch directory and child process
//! - **Files Decide**: a plan exists only if the solver wrote `plan.txt`
//! - **Seams for Tests**: the writer and the process runner are traits
//!
//! # Modules
//!
//! - [`model`] - Multi-agent problems, problem kinds and plans
//! - [`writer`] - PDDL writer trait and a staging implementation
//! - [`engine`] - Command line, process runner, classification, the solver
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod writer;

// Re-export commonly used types
pub use config::{Config, SolverConfig};
pub use engine::{
    CommandLine, ExecOutcome, FmapSolver, Launcher, LogLevel, LogMessage, OutputSink, PlanGenerationResult,
    PlanGenerationStatus, ProcessRunner, ScratchLayout, TokioRunner,
};
pub use error::{FmapError, PlanParseError};
pub use model::{ActionSchema, Agent, Feature, Item, MultiAgentPlan, MultiAgentProblem, PlanStep, ProblemKind};
pub use writer::{MaPddlWriter, StagedWriter};
