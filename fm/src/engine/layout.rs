//! File layout inside a solve call's scratch directory

use std::path::{Path, PathBuf};

/// Prefix shared by every per-agent PDDL file
pub const FILE_PREFIX: &str = "ma_pddl_";

/// Where the solver leaves its plan, relative to its working directory
pub const PLAN_FILE: &str = "plan.txt";

/// Paths of the files exchanged with the solver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScratchLayout {
    root: PathBuf,
}

impl ScratchLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `ma_pddl_<agent>_domain.pddl`
    pub fn domain_path(&self, agent: &str) -> PathBuf {
        self.root.join(format!("{}{}_domain.pddl", FILE_PREFIX, agent))
    }

    /// `ma_pddl_<agent>_problem.pddl`
    pub fn problem_path(&self, agent: &str) -> PathBuf {
        self.root.join(format!("{}{}_problem.pddl", FILE_PREFIX, agent))
    }

    pub fn plan_path(&self) -> PathBuf {
        self.root.join(PLAN_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let layout = ScratchLayout::new("/tmp/fmap-x");

        assert_eq!(layout.domain_path("truck1"), PathBuf::from("/tmp/fmap-x/ma_pddl_truck1_domain.pddl"));
        assert_eq!(layout.problem_path("truck1"), PathBuf::from("/tmp/fmap-x/ma_pddl_truck1_problem.pddl"));
        assert_eq!(layout.plan_path(), PathBuf::from("/tmp/fmap-x/plan.txt"));
    }
}
