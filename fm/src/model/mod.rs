//! Planning model types shared by the adapter and its collaborators

mod kind;
mod plan;
mod problem;

pub use kind::{Feature, ProblemKind};
pub use plan::{MultiAgentPlan, PlanStep};
pub use problem::{ActionSchema, Agent, Item, MultiAgentProblem};
