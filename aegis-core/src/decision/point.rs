//! Decision point type definitions

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a decision point
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionId(String);

impl DecisionId {
    pub fn generate() -> Self {
        Self(format!("decision_{}", Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DecisionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DecisionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Strategic,
    Tactical,
    Emergency,
}

impl std::fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Strategic => "strategic",
            Self::Tactical => "tactical",
            Self::Emergency => "emergency",
        })
    }
}

/// A candidate outcome of a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    pub description: String,
    /// Expected effect, in `[-100, 100]`
    pub impact: f64,
    /// Certainty of the estimate, in `[0, 100]`
    pub confidence: f64,
    #[serde(default)]
    pub required_resources: BTreeSet<String>,
}

impl DecisionOption {
    /// Create an option, clamping `impact` and `confidence` into range
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        impact: f64,
        confidence: f64,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            impact: impact.clamp(-100.0, 100.0),
            confidence: confidence.clamp(0.0, 100.0),
            required_resources: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_resources = resources.into_iter().map(Into::into).collect();
        self
    }

    /// Rule-based desirability: `(confidence/100) * (100 + impact)/100`
    ///
    /// Monotonic in both confidence and impact.
    pub fn fallback_score(&self) -> f64 {
        (self.confidence / 100.0) * (100.0 + self.impact) / 100.0
    }
}

/// A choice that must be resolved once, before its deadline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPoint {
    pub id: DecisionId,
    pub kind: DecisionKind,
    pub description: String,
    pub options: Vec<DecisionOption>,
    pub deadline: DateTime<Utc>,
    /// Chosen option id; set at most once
    pub decision: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
    pub rationale: Option<String>,
    /// Deadline passed while unresolved
    #[serde(default)]
    pub expired: bool,
}

impl DecisionPoint {
    pub fn new(
        kind: DecisionKind,
        description: impl Into<String>,
        options: Vec<DecisionOption>,
        deadline: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DecisionId::generate(),
            kind,
            description: description.into(),
            options,
            deadline,
            decision: None,
            decided_at: None,
            rationale: None,
            expired: false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.decision.is_some()
    }

    /// Unresolved, not abandoned and still before the deadline
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        !self.is_resolved() && !self.expired && now < self.deadline
    }

    pub fn option(&self, id: &str) -> Option<&DecisionOption> {
        self.options.iter().find(|o| o.id == id)
    }

    /// Highest fallback score; ties go to the earliest option
    pub fn fallback_choice(&self) -> Option<&DecisionOption> {
        self.options.iter().fold(None, |best, current| match best {
            Some(b) if current.fallback_score() <= b.fallback_score() => Some(b),
            _ => Some(current),
        })
    }

    /// Record the outcome, returning `false` if already resolved
    pub(crate) fn resolve(
        &mut self,
        option_id: String,
        rationale: String,
        at: DateTime<Utc>,
    ) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.decision = Some(option_id);
        self.rationale = Some(rationale);
        self.decided_at = Some(at);
        true
    }
}
