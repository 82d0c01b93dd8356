//! Multi-agent planning problem

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::kind::{Feature, ProblemKind};

/// Lifted action owned by an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSchema {
    pub name: String,

    /// Parameter names; plan steps must supply one argument per name
    #[serde(default)]
    pub parameters: Vec<String>,
}

impl ActionSchema {
    pub fn new(name: impl Into<String>, parameters: &[&str]) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

/// A named planning agent with its own action set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,

    #[serde(default)]
    pub actions: Vec<ActionSchema>,
}

impl Agent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            actions: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: ActionSchema) -> Self {
        self.actions.push(action);
        self
    }

    pub fn action(&self, name: &str) -> Option<&ActionSchema> {
        self.actions.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }
}

/// A model entity a solver-side name resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Agent(String),
    Action { agent: String, name: String },
    Object(String),
}

/// Multi-agent planning problem
///
/// Agent order is significant: it fixes the order of per-agent files on the
/// solver command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiAgentProblem {
    pub name: String,

    #[serde(default)]
    agents: Vec<Agent>,

    #[serde(default)]
    objects: Vec<String>,

    #[serde(default)]
    kind: ProblemKind,
}

impl MultiAgentProblem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agents: Vec::new(),
            objects: Vec::new(),
            kind: ProblemKind::new().with(Feature::ActionBasedMultiAgent),
        }
    }

    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.objects.push(object.into());
        self
    }

    pub fn with_kind(mut self, kind: ProblemKind) -> Self {
        self.kind = kind;
        self
    }

    /// Agents in declaration order
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn objects(&self) -> &[String] {
        &self.objects
    }

    pub fn kind(&self) -> &ProblemKind {
        &self.kind
    }

    pub fn agent(&self, name: &str) -> Option<&Agent> {
        self.agents.iter().find(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a solver-side name to a model entity
    ///
    /// Names are matched case-insensitively since PDDL is case-insensitive.
    /// Agents shadow objects; for actions the first agent declaring the name
    /// wins (see `actions_named` for the ambiguous case).
    pub fn item_named(&self, name: &str) -> Option<Item> {
        debug!(%name, "MultiAgentProblem::item_named: called");
        if let Some(agent) = self.agent(name) {
            return Some(Item::Agent(agent.name.clone()));
        }
        if let Some(item) = self.actions_named(name).into_iter().next() {
            return Some(item);
        }
        self.objects
            .iter()
            .find(|o| o.eq_ignore_ascii_case(name))
            .map(|o| Item::Object(o.clone()))
    }

    /// Every agent-owned action with the given name, in agent order
    pub fn actions_named(&self, name: &str) -> Vec<Item> {
        self.agents
            .iter()
            .filter_map(|agent| {
                agent.action(name).map(|action| Item::Action {
                    agent: agent.name.clone(),
                    name: action.name.clone(),
                })
            })
            .collect()
    }

    /// Load a problem manifest from YAML
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "MultiAgentProblem::load: called");
        let content = fs::read_to_string(path).context(format!("Failed to read problem {}", path.display()))?;
        let mut problem: Self = serde_yaml::from_str(&content).context("Failed to parse problem manifest")?;
        // A manifest is multi-agent by construction
        problem.kind.insert(Feature::ActionBasedMultiAgent);
        Ok(problem)
    }
}
