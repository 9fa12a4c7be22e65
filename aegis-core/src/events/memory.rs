//! In-memory EventBus implementation
//!
//! MemoryEventBus keeps a bounded replay window in a VecDeque and uses a
//! broadcast channel for live subscribers.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::trace;

use super::AgentEvent;
use super::bus::{EventBus, EventSeq};
use crate::config::BusConfig;
use crate::directory::AgentId;

/// In-memory implementation of EventBus
///
/// Thread-safe via RwLock and atomics. Once `history_limit` events are
/// retained, the oldest are dropped from replay; live subscribers are
/// unaffected.
pub struct MemoryEventBus {
    /// Retained events with sequence numbers
    events: RwLock<VecDeque<(EventSeq, AgentEvent)>>,
    /// Maximum number of retained events
    history_limit: usize,
    /// Next sequence number to assign
    next_seq: AtomicU64,
    /// Broadcast channel for live subscribers
    tx: broadcast::Sender<(EventSeq, AgentEvent)>,
}

impl MemoryEventBus {
    /// Create a new MemoryEventBus with the given broadcast channel capacity
    pub fn new(capacity: usize) -> Self {
        Self::with_history_limit(capacity, BusConfig::default().history_limit)
    }

    /// Create a bus with an explicit replay window
    pub fn with_history_limit(capacity: usize, history_limit: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            events: RwLock::new(VecDeque::new()),
            history_limit,
            next_seq: AtomicU64::new(0),
            tx,
        }
    }

    pub fn from_config(config: &BusConfig) -> Self {
        Self::with_history_limit(config.capacity, config.history_limit)
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, event: AgentEvent) -> EventSeq {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        trace!(seq, kind = event.kind(), "publish");

        {
            let mut events = self.events.write().await;
            events.push_back((seq, event.clone()));
            while events.len() > self.history_limit {
                events.pop_front();
            }
        }

        // Broadcast to live subscribers (ignore if no receivers)
        let _ = self.tx.send((seq, event));

        seq
    }

    fn subscribe(&self) -> broadcast::Receiver<(EventSeq, AgentEvent)> {
        self.tx.subscribe()
    }

    async fn events_from(&self, seq: EventSeq) -> Vec<(EventSeq, AgentEvent)> {
        self.events
            .read()
            .await
            .iter()
            .filter(|(s, _)| *s >= seq)
            .cloned()
            .collect()
    }

    async fn agent_events(&self, agent_id: &AgentId) -> Vec<(EventSeq, AgentEvent)> {
        self.events
            .read()
            .await
            .iter()
            .filter(|(_, event)| event.agent_id() == Some(agent_id))
            .cloned()
            .collect()
    }

    fn current_seq(&self) -> EventSeq {
        self.next_seq.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::comms::{ChannelId, ChannelKind};

    fn stopped(id: &str) -> AgentEvent {
        AgentEvent::AgentStopped {
            agent_id: AgentId::from(id),
        }
    }

    // ==================== Publish Tests ====================

    #[tokio::test]
    async fn publish_increments_sequence_number() {
        let bus = MemoryEventBus::new(100);

        assert_eq!(bus.publish(stopped("a")).await, 0);
        assert_eq!(bus.publish(stopped("b")).await, 1);
        assert_eq!(bus.publish(stopped("c")).await, 2);
        assert_eq!(bus.current_seq(), 3);
    }

    #[tokio::test]
    async fn publish_without_subscribers_does_not_fail() {
        let bus = MemoryEventBus::new(1);
        for i in 0..10 {
            bus.publish(stopped(&format!("a{i}"))).await;
        }
        assert_eq!(bus.current_seq(), 10);
    }

    // ==================== Subscribe Tests ====================

    #[tokio::test]
    async fn subscribe_receives_events_in_publish_order() {
        let bus = MemoryEventBus::new(100);
        let mut rx = bus.subscribe();

        bus.publish(stopped("a")).await;
        bus.publish(stopped("b")).await;

        let (seq1, e1) = rx.recv().await.unwrap();
        let (seq2, _) = rx.recv().await.unwrap();
        assert_eq!((seq1, seq2), (0, 1));
        assert_eq!(e1, stopped("a"));
    }

    #[tokio::test]
    async fn slow_subscriber_lags_without_blocking_publisher() {
        let bus = MemoryEventBus::new(2);
        let mut rx = bus.subscribe();

        for i in 0..5 {
            bus.publish(stopped(&format!("a{i}"))).await;
        }

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        assert_eq!(bus.current_seq(), 5);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_events() {
        let bus = MemoryEventBus::new(100);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(stopped("a")).await;

        assert_eq!(rx1.recv().await.unwrap().0, 0);
        assert_eq!(rx2.recv().await.unwrap().0, 0);
    }

    // ==================== Replay Tests ====================

    #[tokio::test]
    async fn events_from_returns_events_starting_at_seq() {
        let bus = MemoryEventBus::new(100);
        bus.publish(stopped("a")).await;
        bus.publish(stopped("b")).await;
        bus.publish(stopped("c")).await;

        let events = bus.events_from(1).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, 1);
        assert!(bus.events_from(100).await.is_empty());
    }

    #[tokio::test]
    async fn history_limit_drops_oldest() {
        let bus = MemoryEventBus::with_history_limit(100, 2);
        bus.publish(stopped("a")).await;
        bus.publish(stopped("b")).await;
        bus.publish(stopped("c")).await;

        let events = bus.events_from(0).await;
        let seqs: Vec<_> = events.iter().map(|(s, _)| *s).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[tokio::test]
    async fn agent_events_filters_by_agent() {
        let bus = MemoryEventBus::new(100);
        bus.publish(stopped("a")).await;
        bus.publish(stopped("b")).await;
        bus.publish(AgentEvent::ChannelCreated {
            channel_id: ChannelId::from("ch"),
            participants: vec![AgentId::from("a"), AgentId::from("b")],
            kind: ChannelKind::Direct,
        })
        .await;

        assert_eq!(bus.agent_events(&AgentId::from("a")).await.len(), 1);
        assert!(bus.agent_events(&AgentId::from("zzz")).await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_publish_maintains_sequence_integrity() {
        let bus = Arc::new(MemoryEventBus::new(1000));
        let mut handles = vec![];

        for i in 0..10 {
            let bus = Arc::clone(&bus);
            handles.push(tokio::spawn(async move {
                for j in 0..10 {
                    bus.publish(stopped(&format!("a{i}-{j}"))).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(bus.current_seq(), 100);
        let seqs: Vec<_> = bus.events_from(0).await.iter().map(|(s, _)| *s).collect();
        for i in 0..100u64 {
            assert!(seqs.contains(&i), "Missing sequence {}", i);
        }
    }
}
