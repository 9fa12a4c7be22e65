//! Per-agent task scheduling
//!
//! Tasks with priorities and dependency edges, the handlers that run them,
//! task-scoped memory, and the agent runtime that drives the cycle.

pub mod handlers;
pub mod memory;
pub mod runtime;
pub mod task;

pub use handlers::{HandlerContext, HandlerSet, TaskHandler};
pub use memory::TaskMemory;
pub use runtime::{AgentRuntime, BlockedTask, CycleReport, initial_tasks};
pub use task::{Task, TaskId, TaskParameters, TaskSpec, TaskStatus, TaskType};
