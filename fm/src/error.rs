//! Error types for the FMAP adapter

use std::path::PathBuf;
use thiserror::Error;

/// Errors that escape `FmapSolver::solve`
///
/// Solver outcomes (nonzero exit, timeout, no plan) are not errors; they are
/// reported through `PlanGenerationResult::status`. These variants cover
/// faults the adapter cannot classify.
#[derive(Debug, Error)]
pub enum FmapError {
    #[error("Failed to create scratch directory: {0}")]
    Scratch(#[source] std::io::Error),

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Writer failed for agent {agent}: {message}")]
    Writer { agent: String, message: String },

    #[error("Failed to parse plan {path}: {source}")]
    PlanParse {
        path: PathBuf,
        #[source]
        source: PlanParseError,
    },

    #[error("Failed to build async runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Line-level plan parsing failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanParseError {
    #[error("line {line}: expected '(action args...)', got '{text}'")]
    Malformed { line: usize, text: String },

    #[error("line {line}: unknown action '{name}'")]
    UnknownAction { line: usize, name: String },

    #[error("line {line}: unknown object '{name}'")]
    UnknownObject { line: usize, name: String },

    #[error("line {line}: action '{name}' takes {expected} arguments, got {got}")]
    Arity {
        line: usize,
        name: String,
        expected: usize,
        got: usize,
    },
}
