//! Task system types

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::directory::AgentId;
use crate::priority::Priority;

/// Opaque parameter bag interpreted by the task-type handler
pub type TaskParameters = Map<String, Value>;

/// Unique identifier for a task
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Generate a fresh task ID scoped to its owning agent
    pub fn generate(agent: &AgentId) -> Self {
        Self(format!("task_{}_{}", agent, Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Kind of work; selects the handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Analysis,
    Monitoring,
    Execution,
    Communication,
    Compliance,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analysis => "analysis",
            Self::Monitoring => "monitoring",
            Self::Execution => "execution",
            Self::Communication => "communication",
            Self::Compliance => "compliance",
        }
    }

    /// Typical run time of this kind of task
    pub fn estimated_duration(&self) -> Duration {
        match self {
            Self::Analysis => Duration::from_millis(3000),
            Self::Monitoring => Duration::from_millis(1000),
            Self::Execution => Duration::from_millis(5000),
            Self::Communication => Duration::from_millis(500),
            Self::Compliance => Duration::from_millis(2000),
        }
    }
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle
///
/// `Pending -> Running -> {Completed | Failed}`. `Paused` is reachable from
/// `Pending` or `Running` and only leads back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Paused,
}

impl TaskStatus {
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Running, Completed)
                | (Running, Failed)
                | (Pending, Paused)
                | (Running, Paused)
                | (Paused, Pending)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A unit of work owned by one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub task_type: TaskType,
    pub description: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub assigned_agent: AgentId,
    /// Tasks that must be `Completed` before this one may run
    pub dependencies: BTreeSet<TaskId>,
    pub parameters: TaskParameters,
    /// Handler output on success, error description on failure
    pub result: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(with = "humantime_serde")]
    pub estimated_duration: Duration,
}

/// Request to enqueue a task
///
/// ```
/// use aegis_core::scheduler::{TaskSpec, TaskType};
/// use aegis_core::Priority;
///
/// let spec = TaskSpec::new(TaskType::Analysis, "Daily portfolio risk assessment")
///     .priority(Priority::High)
///     .param("analysis_type", "risk");
/// assert_eq!(spec.priority, Priority::High);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSpec {
    pub task_type: TaskType,
    pub description: String,
    pub priority: Priority,
    pub parameters: TaskParameters,
    pub dependencies: BTreeSet<TaskId>,
}

impl TaskSpec {
    pub fn new(task_type: TaskType, description: impl Into<String>) -> Self {
        Self {
            task_type,
            description: description.into(),
            priority: Priority::Medium,
            parameters: TaskParameters::new(),
            dependencies: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn depends_on(mut self, task: &TaskId) -> Self {
        self.dependencies.insert(task.clone());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_legal_transitions() {
        use TaskStatus::*;
        assert!(Pending.can_transition_to(Running));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Failed));
        assert!(Running.can_transition_to(Paused));
        assert!(Paused.can_transition_to(Pending));

        assert!(!Completed.can_transition_to(Running));
        assert!(!Failed.can_transition_to(Pending));
        assert!(!Paused.can_transition_to(Running));
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn task_ids_are_scoped_to_agent() {
        let agent = AgentId::from("aegis_financial_analyst");
        let id = TaskId::generate(&agent);
        assert!(id.as_str().starts_with("task_aegis_financial_analyst_"));
        assert_ne!(id, TaskId::generate(&agent));
    }

    #[test]
    fn estimated_durations_per_type() {
        assert_eq!(
            TaskType::Execution.estimated_duration(),
            Duration::from_secs(5)
        );
        assert_eq!(
            TaskType::Communication.estimated_duration(),
            Duration::from_millis(500)
        );
    }

    #[test]
    fn spec_builder_collects_dependencies() {
        let t1 = TaskId::from("t1");
        let spec = TaskSpec::new(TaskType::Execution, "rebalance")
            .priority(Priority::Critical)
            .depends_on(&t1)
            .param("amount", 100);
        assert!(spec.dependencies.contains(&t1));
        assert_eq!(spec.parameters["amount"], 100);
    }
}
