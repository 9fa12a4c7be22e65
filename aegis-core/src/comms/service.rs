//! Communication channel service
//!
//! Point-to-point and broadcast messaging between registered agents:
//! - `send` returns immediately with a `Pending` message; delivery happens
//!   after a simulated transit delay and is observable on the event bus or
//!   by polling the message
//! - a delivered `Request` triggers a synthesized `Response` from the
//!   recipient after a second delay, worded by the recipient's role
//! - channels are fixed-membership logs shared by two or more agents

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::channel::{Channel, ChannelId, ChannelKind};
use super::encoding::{ContentCodec, PlaceholderCodec};
use super::message::{DeliveryStatus, Message, MessageId, MessageKind, Recipient};
use super::transit::{DelayedQueue, ExpiryHandler, TransitDelay};
use crate::clock::Clock;
use crate::directory::{AgentDirectory, AgentId, AgentType};
use crate::error::CommsError;
use crate::events::{AgentEvent, EventBus};
use crate::priority::Priority;

/// Default page size for history queries
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Scheduled transit step
#[derive(Debug, Clone, PartialEq, Eq)]
enum Transit {
    Deliver(MessageId),
    Respond(MessageId),
}

/// Append-only message log with id lookup
#[derive(Default)]
struct MessageLog {
    messages: Vec<Message>,
    index: HashMap<MessageId, usize>,
}

impl MessageLog {
    fn push(&mut self, message: Message) {
        self.index.insert(message.id.clone(), self.messages.len());
        self.messages.push(message);
    }

    fn get(&self, id: &MessageId) -> Option<&Message> {
        self.index.get(id).map(|&i| &self.messages[i])
    }

    fn get_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.index.get(id).map(|&i| &mut self.messages[i])
    }

    /// Most recent first: timestamp descending, later posts first on ties
    fn recent<'a>(
        &'a self,
        filter: impl Fn(&Message) -> bool,
        limit: usize,
    ) -> Vec<Message> {
        let mut matching: Vec<&'a Message> =
            self.messages.iter().rev().filter(|m| filter(*m)).collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching.into_iter().take(limit).cloned().collect()
    }
}

struct Inner {
    directory: Arc<AgentDirectory>,
    event_bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
    codec: Arc<dyn ContentCodec>,
    delays: Arc<dyn TransitDelay>,
    log: RwLock<MessageLog>,
    channels: RwLock<HashMap<ChannelId, Channel>>,
    transit: DelayedQueue<Transit>,
}

/// Messaging between agents registered in an [`AgentDirectory`]
///
/// Cheap to clone; clones share the same log and transit queue.
#[derive(Clone)]
pub struct CommunicationService {
    inner: Arc<Inner>,
}

impl CommunicationService {
    /// Create a service using the placeholder content codec
    ///
    /// Spawns the transit timer task, so this must be called within a
    /// tokio runtime. Cancelling `shutdown` stops all in-flight transit.
    pub fn new(
        directory: Arc<AgentDirectory>,
        event_bus: Arc<dyn EventBus>,
        delays: Arc<dyn TransitDelay>,
        shutdown: CancellationToken,
    ) -> Self {
        Self::with_codec(
            directory,
            event_bus,
            delays,
            Arc::new(PlaceholderCodec),
            shutdown,
        )
    }

    /// Create a service with a custom content codec
    pub fn with_codec(
        directory: Arc<AgentDirectory>,
        event_bus: Arc<dyn EventBus>,
        delays: Arc<dyn TransitDelay>,
        codec: Arc<dyn ContentCodec>,
        shutdown: CancellationToken,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            let handler: ExpiryHandler<Transit> = Arc::new(move |step| {
                let weak = weak.clone();
                Box::pin(async move {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_transit(step).await;
                    }
                })
            });

            Inner {
                clock: directory.clock().clone(),
                directory,
                event_bus,
                codec,
                delays,
                log: RwLock::new(MessageLog::default()),
                channels: RwLock::new(HashMap::new()),
                transit: DelayedQueue::spawn(handler, shutdown),
            }
        });

        Self { inner }
    }

    pub fn directory(&self) -> &Arc<AgentDirectory> {
        &self.inner.directory
    }

    /// Send a message from one registered agent to another
    ///
    /// Returns at once with `delivery_status = Pending`.
    pub async fn send(
        &self,
        from: &AgentId,
        to: &AgentId,
        kind: MessageKind,
        content: &str,
        priority: Priority,
        encrypted: bool,
    ) -> Result<Message, CommsError> {
        self.inner
            .send(from, to, kind, content, priority, encrypted, None)
            .await
    }

    /// Send to every registered agent except the sender
    ///
    /// Optionally restricted to the given roles. Broadcast content is
    /// never encoded, since it is not addressed to a single key.
    ///
    /// A target whose send fails is skipped; `broadcast_complete` lists the
    /// messages that went out. Fails only if there were targets and none
    /// of them could be sent to.
    pub async fn broadcast(
        &self,
        from: &AgentId,
        kind: MessageKind,
        content: &str,
        priority: Priority,
        target_types: Option<&[AgentType]>,
    ) -> Result<Vec<Message>, CommsError> {
        self.inner.directory.require(from).await?;

        let targets: Vec<AgentId> = self
            .inner
            .directory
            .list()
            .await
            .into_iter()
            .filter(|agent| &agent.agent_id != from)
            .filter(|agent| target_types.is_none_or(|types| types.contains(&agent.agent_type)))
            .map(|agent| agent.agent_id)
            .collect();

        info!(%from, %kind, targets = targets.len(), "Broadcast starting");
        self.inner
            .event_bus
            .publish(AgentEvent::BroadcastStart {
                from: from.clone(),
                kind,
                target_count: targets.len(),
            })
            .await;

        let mut sent = Vec::with_capacity(targets.len());
        let mut first_error = None;
        for target in &targets {
            match self.send(from, target, kind, content, priority, false).await {
                Ok(message) => sent.push(message),
                Err(e) => {
                    warn!(%from, to = %target, error = %e, "Broadcast send failed, skipping target");
                    first_error.get_or_insert(e);
                }
            }
        }

        self.inner
            .event_bus
            .publish(AgentEvent::BroadcastComplete {
                from: from.clone(),
                message_ids: sent.iter().map(|m| m.id.clone()).collect(),
            })
            .await;

        match first_error {
            Some(e) if sent.is_empty() => Err(e),
            _ => Ok(sent),
        }
    }

    /// Open a fixed-membership channel
    ///
    /// Requires at least two distinct registered participants.
    pub async fn open_channel(
        &self,
        participants: impl IntoIterator<Item = AgentId>,
        kind: ChannelKind,
        encrypted: bool,
    ) -> Result<Channel, CommsError> {
        let participants: BTreeSet<AgentId> = participants.into_iter().collect();
        if participants.len() < 2 {
            return Err(CommsError::InvalidChannel(format!(
                "need at least 2 distinct participants, got {}",
                participants.len()
            )));
        }
        for agent in &participants {
            if !self.inner.directory.contains(agent).await {
                return Err(CommsError::InvalidChannel(format!(
                    "participant {agent} is not registered"
                )));
            }
        }

        let id = ChannelId::generate();
        let now = self.inner.clock.now();
        let channel = Channel {
            key: format!("ck_{}", id),
            id,
            participants,
            kind,
            encrypted,
            created_at: now,
            last_activity: now,
            messages: Vec::new(),
        };

        self.inner
            .channels
            .write()
            .await
            .insert(channel.id.clone(), channel.clone());

        info!(channel_id = %channel.id, participants = channel.participants.len(), "Channel created");
        self.inner
            .event_bus
            .publish(AgentEvent::ChannelCreated {
                channel_id: channel.id.clone(),
                participants: channel.participants.iter().cloned().collect(),
                kind,
            })
            .await;

        Ok(channel)
    }

    /// Post a message to every participant of a channel
    ///
    /// The message is addressed to [`Recipient::Broadcast`] and appended
    /// to the channel log; it goes through transit like any other.
    pub async fn post(
        &self,
        channel_id: &ChannelId,
        from: &AgentId,
        kind: MessageKind,
        content: &str,
        priority: Priority,
    ) -> Result<Message, CommsError> {
        let message = {
            let mut channels = self.inner.channels.write().await;
            let channel = channels
                .get_mut(channel_id)
                .ok_or_else(|| CommsError::UnknownChannel(channel_id.to_string()))?;
            if !channel.has_participant(from) {
                return Err(CommsError::NotParticipant {
                    agent: from.to_string(),
                    channel: channel_id.to_string(),
                });
            }

            let now = self.inner.clock.now();
            let content = if channel.encrypted {
                self.inner.codec.encode(content, &channel.key)
            } else {
                content.to_string()
            };
            let message = Message {
                id: MessageId::generate(),
                from: from.clone(),
                to: Recipient::Broadcast,
                kind,
                content,
                encrypted: channel.encrypted,
                priority,
                timestamp: now,
                delivery_status: DeliveryStatus::Pending,
                channel_id: Some(channel_id.clone()),
                in_reply_to: None,
            };
            channel.messages.push(message.id.clone());
            channel.last_activity = now;
            message
        };

        self.inner.dispatch(message).await
    }

    /// Most recent messages sent by or addressed to `agent`
    pub async fn history(
        &self,
        agent: &AgentId,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, CommsError> {
        let limit = validate_limit(limit)?;
        Ok(self
            .inner
            .log
            .read()
            .await
            .recent(|m| m.involves(agent), limit))
    }

    /// Most recent messages in a channel's log
    pub async fn channel_history(
        &self,
        channel_id: &ChannelId,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, CommsError> {
        let limit = validate_limit(limit)?;
        if !self.inner.channels.read().await.contains_key(channel_id) {
            return Err(CommsError::UnknownChannel(channel_id.to_string()));
        }
        Ok(self
            .inner
            .log
            .read()
            .await
            .recent(|m| m.channel_id.as_ref() == Some(channel_id), limit))
    }

    pub async fn message(&self, id: &MessageId) -> Option<Message> {
        self.inner.log.read().await.get(id).cloned()
    }

    pub async fn channel(&self, id: &ChannelId) -> Option<Channel> {
        self.inner.channels.read().await.get(id).cloned()
    }

    /// Acknowledge a delivered message as read by its recipient
    pub async fn mark_read(
        &self,
        id: &MessageId,
        reader: &AgentId,
    ) -> Result<Message, CommsError> {
        let message = {
            let mut log = self.inner.log.write().await;
            let message = log
                .get_mut(id)
                .ok_or_else(|| CommsError::UnknownMessage(id.to_string()))?;
            if !message.to.is_agent(reader) {
                return Err(CommsError::WrongRecipient {
                    message: id.to_string(),
                    recipient: message.to.to_string(),
                    reader: reader.to_string(),
                });
            }
            if !message.delivery_status.can_transition_to(DeliveryStatus::Read) {
                return Err(CommsError::NotDelivered(id.to_string()));
            }
            message.delivery_status = DeliveryStatus::Read;
            message.clone()
        };

        self.inner
            .event_bus
            .publish(AgentEvent::MessageRead {
                message_id: id.clone(),
                reader: reader.clone(),
            })
            .await;

        Ok(message)
    }

    /// Recover the plain content of a message
    ///
    /// Returns `None` if the encoded content does not match the key of its
    /// addressee (or channel).
    pub async fn plaintext(&self, message: &Message) -> Option<String> {
        if !message.encrypted {
            return Some(message.content.clone());
        }
        let key = match (&message.channel_id, &message.to) {
            (Some(channel_id), _) => self.inner.channels.read().await.get(channel_id)?.key.clone(),
            (None, Recipient::Agent(to)) => self.inner.directory.get(to).await?.public_key,
            (None, Recipient::Broadcast) => return None,
        };
        self.inner.codec.decode(&message.content, &key)
    }
}

fn validate_limit(limit: Option<usize>) -> Result<usize, CommsError> {
    match limit.unwrap_or(DEFAULT_HISTORY_LIMIT) {
        0 => Err(CommsError::InvalidLimit),
        n => Ok(n),
    }
}

impl Inner {
    #[allow(clippy::too_many_arguments)]
    async fn send(
        &self,
        from: &AgentId,
        to: &AgentId,
        kind: MessageKind,
        content: &str,
        priority: Priority,
        encrypted: bool,
        in_reply_to: Option<MessageId>,
    ) -> Result<Message, CommsError> {
        self.directory.require(from).await?;
        let recipient = self.directory.require(to).await?;

        let content = if encrypted {
            self.codec.encode(content, &recipient.public_key)
        } else {
            content.to_string()
        };

        let message = Message {
            id: MessageId::generate(),
            from: from.clone(),
            to: Recipient::Agent(to.clone()),
            kind,
            content,
            encrypted,
            priority,
            timestamp: self.clock.now(),
            delivery_status: DeliveryStatus::Pending,
            channel_id: None,
            in_reply_to,
        };

        self.dispatch(message).await
    }

    /// Log a pending message, announce it, and schedule its delivery
    async fn dispatch(&self, message: Message) -> Result<Message, CommsError> {
        self.log.write().await.push(message.clone());

        debug!(message_id = %message.id, from = %message.from, to = %message.to, kind = %message.kind, "Message sending");
        self.event_bus
            .publish(AgentEvent::MessageSending {
                message_id: message.id.clone(),
                from: message.from.clone(),
                to: message.to.clone(),
                kind: message.kind,
                priority: message.priority,
            })
            .await;

        let delay = self.delays.delivery_delay();
        if self
            .transit
            .schedule(Transit::Deliver(message.id.clone()), delay)
            .is_err()
        {
            self.fail(&message.id, "transit queue closed").await;
            return Err(CommsError::TransitClosed);
        }

        Ok(message)
    }

    async fn on_transit(&self, step: Transit) {
        match step {
            Transit::Deliver(id) => self.deliver(&id).await,
            Transit::Respond(id) => self.respond(&id).await,
        }
    }

    async fn deliver(&self, id: &MessageId) {
        let Some(pending) = self.log.read().await.get(id).cloned() else {
            return;
        };

        if let Recipient::Agent(to) = &pending.to {
            if !self.directory.contains(to).await {
                self.fail(id, &format!("recipient {to} is not registered"))
                    .await;
                return;
            }
        }

        let delivered = {
            let mut log = self.log.write().await;
            match log.get_mut(id) {
                Some(message)
                    if message
                        .delivery_status
                        .can_transition_to(DeliveryStatus::Delivered) =>
                {
                    message.delivery_status = DeliveryStatus::Delivered;
                    message.clone()
                }
                _ => return,
            }
        };

        debug!(message_id = %id, to = %delivered.to, "Message delivered");
        self.event_bus
            .publish(AgentEvent::MessageDelivered {
                message_id: id.clone(),
                from: delivered.from.clone(),
                to: delivered.to.clone(),
                kind: delivered.kind,
            })
            .await;

        if delivered.kind == MessageKind::Request && delivered.to.agent().is_some() {
            let delay = self.delays.response_delay();
            if self
                .transit
                .schedule(Transit::Respond(id.clone()), delay)
                .is_err()
            {
                warn!(message_id = %id, "Transit closed before response could be scheduled");
            }
        }
    }

    async fn respond(&self, request_id: &MessageId) {
        let Some(request) = self.log.read().await.get(request_id).cloned() else {
            return;
        };
        let Some(responder_id) = request.to.agent() else {
            return;
        };
        let Some(responder) = self.directory.get(responder_id).await else {
            return;
        };

        let result = self
            .send(
                responder_id,
                &request.from,
                MessageKind::Response,
                responder.agent_type.canned_reply(),
                request.priority,
                request.encrypted,
                Some(request_id.clone()),
            )
            .await;

        if let Err(e) = result {
            warn!(message_id = %request_id, error = %e, "Synthesized response failed");
        }
    }

    async fn fail(&self, id: &MessageId, reason: &str) {
        {
            let mut log = self.log.write().await;
            match log.get_mut(id) {
                Some(message)
                    if message
                        .delivery_status
                        .can_transition_to(DeliveryStatus::Failed) =>
                {
                    message.delivery_status = DeliveryStatus::Failed;
                }
                _ => return,
            }
        }

        warn!(message_id = %id, reason, "Message delivery failed");
        self.event_bus
            .publish(AgentEvent::MessageFailed {
                message_id: id.clone(),
                reason: reason.to_string(),
            })
            .await;
    }
}
