//! Communication channel service
//!
//! Typed messages with delivery tracking, simulated transit, broadcast
//! fan-out and fixed-membership channels.

pub mod channel;
pub mod encoding;
pub mod message;
pub mod service;
pub mod transit;

pub use channel::{Channel, ChannelId, ChannelKind};
pub use encoding::{ContentCodec, PlaceholderCodec};
pub use message::{DeliveryStatus, Message, MessageId, MessageKind, Recipient};
pub use service::{CommunicationService, DEFAULT_HISTORY_LIMIT};
pub use transit::{DelayedQueue, ExpiryHandler, FixedDelay, JitteredDelay, TransitDelay};
