//! Event type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::comms::{ChannelId, ChannelKind, MessageId, MessageKind, Recipient};
use crate::decision::DecisionId;
use crate::directory::{AgentId, AgentStatus, AgentType};
use crate::priority::Priority;
use crate::scheduler::{TaskId, TaskType};

/// Notifications carried on the event bus
///
/// Every state transition in the directory, communication service, task
/// scheduler and decision engine is published as one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A new agent joined the directory
    AgentRegistered {
        agent_id: AgentId,
        name: String,
        agent_type: AgentType,
    },

    /// An agent's status was set (self-reported or scheduler-driven)
    AgentStatusUpdated {
        agent_id: AgentId,
        status: AgentStatus,
    },

    /// The liveness sweep marked a silent agent offline
    AgentOffline {
        agent_id: AgentId,
        last_seen: DateTime<Utc>,
    },

    /// An agent runtime began its processing loop
    AgentStarted {
        agent_id: AgentId,
        agent_type: AgentType,
    },

    /// An agent runtime stopped its processing loop
    AgentStopped { agent_id: AgentId },

    /// Start-up service discovery finished (possibly with nothing)
    ServicesDiscovered {
        agent_id: AgentId,
        services: Vec<String>,
    },

    /// A message was accepted for transit
    MessageSending {
        message_id: MessageId,
        from: AgentId,
        to: Recipient,
        kind: MessageKind,
        priority: Priority,
    },

    /// A message reached its recipient
    MessageDelivered {
        message_id: MessageId,
        from: AgentId,
        to: Recipient,
        kind: MessageKind,
    },

    /// A message could not be delivered
    MessageFailed {
        message_id: MessageId,
        reason: String,
    },

    /// The recipient acknowledged a delivered message
    MessageRead {
        message_id: MessageId,
        reader: AgentId,
    },

    /// A broadcast fan-out began
    BroadcastStart {
        from: AgentId,
        kind: MessageKind,
        target_count: usize,
    },

    /// A broadcast fan-out finished
    BroadcastComplete {
        from: AgentId,
        message_ids: Vec<MessageId>,
    },

    /// A multi-party channel was opened
    ChannelCreated {
        channel_id: ChannelId,
        participants: Vec<AgentId>,
        kind: ChannelKind,
    },

    /// A task was enqueued on an agent
    TaskAssigned {
        agent_id: AgentId,
        task_id: TaskId,
        task_type: TaskType,
        priority: Priority,
        description: String,
    },

    /// A pending task was skipped this cycle because of unmet dependencies
    TaskWaiting {
        agent_id: AgentId,
        task_id: TaskId,
        unmet_dependencies: Vec<TaskId>,
    },

    TaskStarted { agent_id: AgentId, task_id: TaskId },

    TaskCompleted { agent_id: AgentId, task_id: TaskId },

    TaskFailed {
        agent_id: AgentId,
        task_id: TaskId,
        error: String,
    },

    /// Decision evaluation began
    DecisionStart {
        agent_id: AgentId,
        decision_id: DecisionId,
        description: String,
    },

    /// The analysis collaborator's choice was accepted
    DecisionMade {
        agent_id: AgentId,
        decision_id: DecisionId,
        option_id: String,
        rationale: String,
    },

    /// The rule-based fallback chose the option
    DecisionFallback {
        agent_id: AgentId,
        decision_id: DecisionId,
        option_id: String,
        reason: String,
    },

    /// A decision passed its deadline unresolved and was abandoned
    DecisionExpired {
        agent_id: AgentId,
        decision_id: DecisionId,
        deadline: DateTime<Utc>,
    },
}

impl AgentEvent {
    /// Event type name as it appears in the `type` tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgentRegistered { .. } => "agent_registered",
            Self::AgentStatusUpdated { .. } => "agent_status_updated",
            Self::AgentOffline { .. } => "agent_offline",
            Self::AgentStarted { .. } => "agent_started",
            Self::AgentStopped { .. } => "agent_stopped",
            Self::ServicesDiscovered { .. } => "services_discovered",
            Self::MessageSending { .. } => "message_sending",
            Self::MessageDelivered { .. } => "message_delivered",
            Self::MessageFailed { .. } => "message_failed",
            Self::MessageRead { .. } => "message_read",
            Self::BroadcastStart { .. } => "broadcast_start",
            Self::BroadcastComplete { .. } => "broadcast_complete",
            Self::ChannelCreated { .. } => "channel_created",
            Self::TaskAssigned { .. } => "task_assigned",
            Self::TaskWaiting { .. } => "task_waiting",
            Self::TaskStarted { .. } => "task_started",
            Self::TaskCompleted { .. } => "task_completed",
            Self::TaskFailed { .. } => "task_failed",
            Self::DecisionStart { .. } => "decision_start",
            Self::DecisionMade { .. } => "decision_made",
            Self::DecisionFallback { .. } => "decision_fallback",
            Self::DecisionExpired { .. } => "decision_expired",
        }
    }

    /// The agent this event is primarily about, if any
    ///
    /// Message events are attributed to the sender.
    pub fn agent_id(&self) -> Option<&AgentId> {
        match self {
            Self::AgentRegistered { agent_id, .. }
            | Self::AgentStatusUpdated { agent_id, .. }
            | Self::AgentOffline { agent_id, .. }
            | Self::AgentStarted { agent_id, .. }
            | Self::AgentStopped { agent_id }
            | Self::ServicesDiscovered { agent_id, .. }
            | Self::TaskAssigned { agent_id, .. }
            | Self::TaskWaiting { agent_id, .. }
            | Self::TaskStarted { agent_id, .. }
            | Self::TaskCompleted { agent_id, .. }
            | Self::TaskFailed { agent_id, .. }
            | Self::DecisionStart { agent_id, .. }
            | Self::DecisionMade { agent_id, .. }
            | Self::DecisionFallback { agent_id, .. }
            | Self::DecisionExpired { agent_id, .. } => Some(agent_id),
            Self::MessageSending { from, .. }
            | Self::MessageDelivered { from, .. }
            | Self::BroadcastStart { from, .. }
            | Self::BroadcastComplete { from, .. } => Some(from),
            Self::MessageRead { reader, .. } => Some(reader),
            Self::MessageFailed { .. } | Self::ChannelCreated { .. } => None,
        }
    }
}

impl std::fmt::Display for AgentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AgentRegistered { name, .. } => write!(f, "Agent registered: {name}"),
            Self::AgentStatusUpdated { agent_id, status } => {
                write!(f, "Agent {agent_id} status: {status}")
            }
            Self::AgentOffline { agent_id, .. } => write!(f, "Agent {agent_id} went offline"),
            Self::AgentStarted { agent_id, .. } => write!(f, "Agent {agent_id} started"),
            Self::AgentStopped { agent_id } => write!(f, "Agent {agent_id} stopped"),
            Self::ServicesDiscovered { agent_id, services } => {
                write!(f, "Agent {agent_id} discovered {} services", services.len())
            }
            Self::MessageSending { from, to, kind, .. } => {
                write!(f, "{from} sending {kind} to {to}")
            }
            Self::MessageDelivered { message_id, to, .. } => {
                write!(f, "Message {message_id} delivered to {to}")
            }
            Self::MessageFailed { message_id, reason } => {
                write!(f, "Message {message_id} failed: {reason}")
            }
            Self::MessageRead { message_id, reader } => {
                write!(f, "Message {message_id} read by {reader}")
            }
            Self::BroadcastStart {
                from, target_count, ..
            } => write!(f, "{from} broadcasting to {target_count} agents"),
            Self::BroadcastComplete { message_ids, .. } => {
                write!(f, "Broadcast completed: {} messages sent", message_ids.len())
            }
            Self::ChannelCreated { participants, .. } => write!(
                f,
                "Communication channel created with {} participants",
                participants.len()
            ),
            Self::TaskAssigned {
                agent_id,
                description,
                ..
            } => write!(f, "Task assigned to {agent_id}: {description}"),
            Self::TaskWaiting {
                task_id,
                unmet_dependencies,
                ..
            } => write!(
                f,
                "Task {task_id} waiting for {} dependencies",
                unmet_dependencies.len()
            ),
            Self::TaskStarted { agent_id, task_id } => {
                write!(f, "{agent_id} started task {task_id}")
            }
            Self::TaskCompleted { agent_id, task_id } => {
                write!(f, "{agent_id} completed task {task_id}")
            }
            Self::TaskFailed {
                agent_id,
                task_id,
                error,
            } => write!(f, "{agent_id} failed task {task_id}: {error}"),
            Self::DecisionStart {
                agent_id,
                description,
                ..
            } => write!(f, "{agent_id} evaluating decision: {description}"),
            Self::DecisionMade {
                agent_id,
                option_id,
                ..
            } => write!(f, "{agent_id} decided: {option_id}"),
            Self::DecisionFallback {
                agent_id,
                option_id,
                ..
            } => write!(f, "{agent_id} made fallback decision: {option_id}"),
            Self::DecisionExpired {
                agent_id,
                decision_id,
                ..
            } => write!(f, "{agent_id} let decision {decision_id} expire"),
        }
    }
}
