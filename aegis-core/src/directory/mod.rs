//! Agent directory and liveness
//!
//! This module provides:
//! - Agent identity, roles and status
//! - The directory that owns every agent record
//! - The liveness monitor that marks silent agents offline

pub mod agent;
pub mod liveness;
pub mod registry;

pub use agent::{Agent, AgentId, AgentSpec, AgentStatus, AgentType, default_roster};
pub use liveness::LivenessMonitor;
pub use registry::AgentDirectory;
