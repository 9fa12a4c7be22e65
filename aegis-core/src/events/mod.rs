//! Event system for aegis
//!
//! A process-wide, in-memory publish/subscribe bus. Every component
//! publishes its state transitions here; dashboards and monitors subscribe.

pub mod bus;
pub mod memory;
pub mod types;

pub use bus::{EventBus, EventSeq};
pub use memory::MemoryEventBus;
pub use types::AgentEvent;
