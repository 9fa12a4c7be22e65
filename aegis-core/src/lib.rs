//! aegis-core: Agent scheduling and inter-agent messaging for the aegis treasury assistant
//!
//! This crate provides the autonomous-agent core:
//!
//! - **Event system** - [`EventBus`] trait and [`MemoryEventBus`] carrying every state transition
//! - **Agent directory** - [`AgentDirectory`] owning agent records, plus the [`LivenessMonitor`]
//! - **Communication** - [`CommunicationService`] for messages, broadcasts and channels with simulated transit
//! - **Scheduling** - [`AgentRuntime`] running each agent's dependency-aware task queue
//! - **Decisions** - [`DecisionEngine`] with a deterministic rule-based fallback
//! - **Collaborators** - narrow traits for analysis, compliance and discovery, with stubs
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use aegis_core::collaborators::{Collaborators, ScriptedAnalysis, SimulatedCompliance, StaticDiscovery};
//! use aegis_core::comms::JitteredDelay;
//! use aegis_core::{AgentDirectory, AgentRuntime, CommunicationService, MemoryEventBus, RuntimeConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RuntimeConfig::default();
//!     let bus = Arc::new(MemoryEventBus::from_config(&config.bus));
//!     let directory = Arc::new(AgentDirectory::new(bus.clone()));
//!     let shutdown = CancellationToken::new();
//!     let comms = CommunicationService::new(
//!         directory,
//!         bus.clone(),
//!         Arc::new(JitteredDelay::new(config.transit.clone())),
//!         shutdown.clone(),
//!     );
//!     let collaborators = Collaborators::new(
//!         Arc::new(ScriptedAnalysis::conservative()),
//!         Arc::new(SimulatedCompliance::new()),
//!         Arc::new(StaticDiscovery::default_catalog()),
//!     );
//!
//!     for spec in aegis_core::directory::default_roster() {
//!         let runtime = AgentRuntime::new(
//!             spec,
//!             comms.clone(),
//!             bus.clone(),
//!             collaborators.clone(),
//!             config.scheduler.clone(),
//!         );
//!         runtime.start(&shutdown).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   cycles    ┌──────────────────┐
//! │ AgentRuntime │────────────>│  TaskHandlers    │──> collaborators
//! │  (per agent) │             └────────┬─────────┘
//! │              │──> DecisionEngine    │ send/broadcast
//! └──────┬───────┘                      v
//!        │ status          ┌──────────────────────┐
//!        v                 │ CommunicationService │──> DelayedQueue
//! ┌──────────────┐ <───────└──────────────────────┘
//! │AgentDirectory│ <── LivenessMonitor
//! └──────────────┘
//!        all of the above publish to the EventBus
//! ```

pub mod clock;
pub mod collaborators;
pub mod comms;
pub mod config;
pub mod decision;
pub mod directory;
pub mod error;
pub mod events;
pub mod priority;
pub mod scheduler;

// Re-export key types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use comms::{CommunicationService, Message, MessageKind};
pub use config::RuntimeConfig;
pub use decision::{DecisionEngine, DecisionPoint};
pub use directory::{AgentDirectory, AgentId, AgentStatus, AgentType, LivenessMonitor};
pub use error::{
    AegisError, AegisResult, CollaboratorError, CommsError, ConfigError, DirectoryError,
    HandlerError, SchedulerError,
};
pub use events::{AgentEvent, EventBus, EventSeq, MemoryEventBus};
pub use priority::Priority;
pub use scheduler::{AgentRuntime, Task, TaskId, TaskSpec, TaskStatus, TaskType};
