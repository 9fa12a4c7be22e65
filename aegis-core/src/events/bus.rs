//! EventBus trait definition
//!
//! Delivery to subscribers is fire-and-forget: a slow subscriber lags and
//! loses events, it never blocks the publisher.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::AgentEvent;
use crate::directory::AgentId;

/// Sequence number for events (monotonically increasing)
pub type EventSeq = u64;

/// Event bus for publishing and subscribing to AgentEvents
///
/// Implementations must support:
/// - Publishing events with sequence numbers
/// - Live subscriptions via broadcast channel
/// - Historical replay for late joiners
/// - Agent-scoped event retrieval
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event, returns its sequence number
    async fn publish(&self, event: AgentEvent) -> EventSeq;

    /// Subscribe to all events from now (live stream)
    fn subscribe(&self) -> broadcast::Receiver<(EventSeq, AgentEvent)>;

    /// Get retained events starting from a sequence number (for replay)
    async fn events_from(&self, seq: EventSeq) -> Vec<(EventSeq, AgentEvent)>;

    /// Get retained events about a specific agent
    async fn agent_events(&self, agent_id: &AgentId) -> Vec<(EventSeq, AgentEvent)>;

    /// Current sequence number (high water mark)
    fn current_seq(&self) -> EventSeq;
}
