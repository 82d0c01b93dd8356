//! Multi-agent plans and the plan-file reader

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use super::problem::{Item, MultiAgentProblem};
use crate::error::{FmapError, PlanParseError};

/// One grounded action in a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Time step reported by the solver, or line order when absent
    pub index: usize,

    /// Agent executing the action
    pub agent: String,

    pub action: String,

    pub parameters: Vec<String>,
}

/// A plan reconstructed from solver output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiAgentPlan {
    pub steps: Vec<PlanStep>,
}

impl MultiAgentPlan {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps executed by one agent, in plan order
    pub fn steps_for<'a>(&'a self, agent: &'a str) -> impl Iterator<Item = &'a PlanStep> + 'a {
        self.steps.iter().filter(move |s| s.agent == agent)
    }

    /// Parse plan text, mapping solver names back to model entities
    ///
    /// Accepted line shape: `[<n>:] (<action> <arg>...) [[<duration>]]`.
    /// Blank lines and `;` comments are skipped. Each step is checked against
    /// `problem`: the executing agent must declare the action and the argument
    /// count must match the action's parameters.
    pub fn parse<F>(text: &str, problem: &MultiAgentProblem, resolve: F) -> Result<Self, PlanParseError>
    where
        F: Fn(&str) -> Option<Item>,
    {
        debug!(len = text.len(), "MultiAgentPlan::parse: called");
        let mut steps = Vec::new();

        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let (index, body) = split_step_prefix(line).unwrap_or((steps.len(), line));
            let body = strip_duration(body);
            let inner = body
                .strip_prefix('(')
                .and_then(|b| b.strip_suffix(')'))
                .ok_or_else(|| PlanParseError::Malformed {
                    line: line_no,
                    text: line.to_string(),
                })?;

            let mut tokens = inner.split_whitespace();
            let action_name = tokens.next().ok_or_else(|| PlanParseError::Malformed {
                line: line_no,
                text: line.to_string(),
            })?;

            let (owner, action) = match resolve(action_name) {
                Some(Item::Action { agent, name }) => (agent, name),
                _ => {
                    debug!(%action_name, "MultiAgentPlan::parse: action did not resolve");
                    return Err(PlanParseError::UnknownAction {
                        line: line_no,
                        name: action_name.to_string(),
                    });
                }
            };

            let mut parameters = Vec::new();
            let mut leading_agent = None;
            for (pos, token) in tokens.enumerate() {
                match resolve(token) {
                    Some(Item::Agent(name)) => {
                        if pos == 0 {
                            leading_agent = Some(name.clone());
                        }
                        parameters.push(name);
                    }
                    Some(Item::Object(name)) => parameters.push(name),
                    _ => {
                        return Err(PlanParseError::UnknownObject {
                            line: line_no,
                            name: token.to_string(),
                        });
                    }
                }
            }

            // Shared action names are disambiguated by the executing agent
            // passed as the first argument, if that agent declares the action
            let agent = leading_agent
                .filter(|name| declares(problem, name, &action))
                .unwrap_or(owner);

            let schema = problem.agent(&agent).and_then(|a| a.action(&action));
            if let Some(schema) = schema.filter(|s| s.arity() != parameters.len()) {
                return Err(PlanParseError::Arity {
                    line: line_no,
                    name: action,
                    expected: schema.arity(),
                    got: parameters.len(),
                });
            }

            steps.push(PlanStep {
                index,
                agent,
                action,
                parameters,
            });
        }

        debug!(steps = steps.len(), "MultiAgentPlan::parse: done");
        Ok(Self { steps })
    }

    /// Read and parse a plan file
    pub fn from_file<F>(path: &Path, problem: &MultiAgentProblem, resolve: F) -> Result<Self, FmapError>
    where
        F: Fn(&str) -> Option<Item>,
    {
        debug!(path = %path.display(), "MultiAgentPlan::from_file: called");
        let text = fs::read_to_string(path)?;
        Self::parse(&text, problem, resolve).map_err(|source| FmapError::PlanParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn declares(problem: &MultiAgentProblem, agent: &str, action: &str) -> bool {
    problem.agent(agent).is_some_and(|a| a.action(action).is_some())
}

fn split_step_prefix(line: &str) -> Option<(usize, &str)> {
    let (prefix, rest) = line.split_once(':')?;
    let prefix = prefix.trim();
    // Timed plans write "0.000:"; keep the integer part
    let whole = prefix.split('.').next().unwrap_or(prefix);
    let index = whole.parse::<usize>().ok()?;
    Some((index, rest.trim()))
}

fn strip_duration(body: &str) -> &str {
    match body.rfind('[') {
        Some(pos) if body.ends_with(']') => body[..pos].trim_end(),
        _ => body,
    }
}
