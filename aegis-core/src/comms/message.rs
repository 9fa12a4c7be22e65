//! Message type definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::channel::ChannelId;
use crate::directory::AgentId;
use crate::priority::Priority;

/// Unique identifier for a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generate a fresh, time-ordered message ID
    pub fn generate() -> Self {
        Self(format!("msg_{}", Uuid::now_v7().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// What a message is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Request,
    Response,
    #[default]
    Notification,
    Alert,
    DataShare,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::Notification => "notification",
            Self::Alert => "alert",
            Self::DataShare => "data_share",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery lifecycle of a message
///
/// `Pending -> Delivered -> Read`, or `Pending -> Failed`. No other
/// transition is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Delivered,
    Read,
    Failed,
}

impl DeliveryStatus {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: DeliveryStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Delivered)
                | (Self::Pending, Self::Failed)
                | (Self::Delivered, Self::Read)
        )
    }
}

/// Addressee of a message
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    /// A single registered agent
    Agent(AgentId),
    /// Everyone in scope (all participants of a channel)
    Broadcast,
}

impl Recipient {
    pub fn agent(&self) -> Option<&AgentId> {
        match self {
            Self::Agent(id) => Some(id),
            Self::Broadcast => None,
        }
    }

    pub fn is_agent(&self, id: &AgentId) -> bool {
        self.agent() == Some(id)
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Agent(id) => write!(f, "{id}"),
            Self::Broadcast => f.write_str("*"),
        }
    }
}

/// A message between agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: AgentId,
    pub to: Recipient,
    pub kind: MessageKind,
    /// Plain text, or the placeholder-encoded form when `encrypted`
    pub content: String,
    pub encrypted: bool,
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
    pub delivery_status: DeliveryStatus,
    /// Channel log this message belongs to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
    /// Request this message answers, for synthesized responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<MessageId>,
}

impl Message {
    /// Whether `agent` sent or is addressed by this message
    pub fn involves(&self, agent: &AgentId) -> bool {
        &self.from == agent || self.to.is_agent(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_ids_are_unique_and_prefixed() {
        let a = MessageId::generate();
        let b = MessageId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("msg_"));
    }

    #[test]
    fn delivery_status_only_moves_forward() {
        use DeliveryStatus::*;
        assert!(Pending.can_transition_to(Delivered));
        assert!(Pending.can_transition_to(Failed));
        assert!(Delivered.can_transition_to(Read));

        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Delivered));
        assert!(!Read.can_transition_to(Delivered));
        assert!(!Failed.can_transition_to(Delivered));
        assert!(!Pending.can_transition_to(Read));
    }

    #[test]
    fn message_kind_json_format() {
        assert_eq!(
            serde_json::to_string(&MessageKind::DataShare).unwrap(),
            "\"data_share\""
        );
    }

    #[test]
    fn recipient_display() {
        assert_eq!(Recipient::Broadcast.to_string(), "*");
        assert_eq!(Recipient::Agent(AgentId::from("b")).to_string(), "b");
    }
}
