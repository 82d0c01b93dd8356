//! Problem-kind taxonomy
//!
//! A `ProblemKind` is the set of modelling features a problem uses. An engine
//! supports a problem when the problem's kind is a subset of the engine's
//! supported kind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// A single modelling feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feature {
    // Problem class
    ActionBased,
    ActionBasedMultiAgent,
    Hierarchical,

    // Typing
    FlatTyping,
    HierarchicalTyping,

    // Conditions
    NegativeConditions,
    DisjunctiveConditions,
    Equality,
    ExistentialConditions,
    UniversalConditions,

    // Effects
    ConditionalEffects,
    IncreaseEffects,
    DecreaseEffects,

    // Fluents
    NumericFluents,
    ObjectFluents,

    // Time
    ContinuousTime,
    DiscreteTime,
    DurationInequalities,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Reuse the serde spelling so manifests and messages agree
        let name = serde_json::to_value(self)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("{:?}", self));
        write!(f, "{}", name)
    }
}

/// Set of features used by a problem (or supported by an engine)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemKind {
    features: BTreeSet<Feature>,
}

impl ProblemKind {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, feature: Feature) -> Self {
        self.features.insert(feature);
        self
    }

    pub fn insert(&mut self, feature: Feature) {
        self.features.insert(feature);
    }

    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        self.features.iter().copied()
    }

    /// True when every feature of `self` is also in `other`
    pub fn is_subset_of(&self, other: &ProblemKind) -> bool {
        debug!(len = self.features.len(), other_len = other.features.len(), "ProblemKind::is_subset_of: called");
        self.features.is_subset(&other.features)
    }

    /// Features of `self` missing from `other`, in stable order
    pub fn missing_from(&self, other: &ProblemKind) -> Vec<Feature> {
        self.features.difference(&other.features).copied().collect()
    }
}

impl FromIterator<Feature> for ProblemKind {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}
