//! PDDL writer seam
//!
//! Serialising a problem into FMAP's per-agent domain/problem files belongs to
//! the host framework. The adapter only needs the two write operations and a
//! way to map solver names back onto model entities.

use std::fs;
use std::path::PathBuf;
use tracing::debug;

use crate::engine::ScratchLayout;
use crate::error::FmapError;
use crate::model::{Item, MultiAgentProblem};

/// Writes FMAP's per-agent input files
pub trait MaPddlWriter: Send + Sync {
    /// Write one domain file per agent at `layout.domain_path(agent)`
    fn write_ma_domain(&self, problem: &MultiAgentProblem, layout: &ScratchLayout) -> Result<(), FmapError>;

    /// Write one problem file per agent at `layout.problem_path(agent)`
    fn write_ma_problem(&self, problem: &MultiAgentProblem, layout: &ScratchLayout) -> Result<(), FmapError>;

    /// Map a name as written by this writer back to a model entity
    fn item_named(&self, problem: &MultiAgentProblem, name: &str) -> Option<Item> {
        problem.item_named(name)
    }
}

/// Writer that stages pre-authored PDDL files
///
/// Expects `<agent>_domain.pddl` and `<agent>_problem.pddl` for every agent
/// in `source`.
#[derive(Debug, Clone)]
pub struct StagedWriter {
    source: PathBuf,
}

impl StagedWriter {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self { source: source.into() }
    }

    fn stage(&self, agent: &str, suffix: &str, dest: PathBuf) -> Result<(), FmapError> {
        let src = self.source.join(format!("{}_{}.pddl", agent, suffix));
        debug!(src = %src.display(), dest = %dest.display(), "StagedWriter::stage: copying");
        fs::copy(&src, &dest).map_err(|e| FmapError::Writer {
            agent: agent.to_string(),
            message: format!("cannot stage {}: {}", src.display(), e),
        })?;
        Ok(())
    }
}

impl MaPddlWriter for StagedWriter {
    fn write_ma_domain(&self, problem: &MultiAgentProblem, layout: &ScratchLayout) -> Result<(), FmapError> {
        debug!(problem = %problem.name, "StagedWriter::write_ma_domain: called");
        for agent in problem.agents() {
            self.stage(&agent.name, "domain", layout.domain_path(&agent.name))?;
        }
        Ok(())
    }

    fn write_ma_problem(&self, problem: &MultiAgentProblem, layout: &ScratchLayout) -> Result<(), FmapError> {
        debug!(problem = %problem.name, "StagedWriter::write_ma_problem: called");
        for agent in problem.agents() {
            self.stage(&agent.name, "problem", layout.problem_path(&agent.name))?;
        }
        Ok(())
    }
}
