//! Liveness monitor
//!
//! Periodically scans the directory and marks agents offline once their
//! `last_seen` is older than the heartbeat timeout. Each transition is
//! published exactly once as `agent_offline`; an agent that is already
//! offline is not reported again on later sweeps.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::agent::AgentId;
use super::registry::AgentDirectory;
use crate::config::LivenessConfig;
use crate::events::{AgentEvent, EventBus};

pub struct LivenessMonitor {
    directory: Arc<AgentDirectory>,
    event_bus: Arc<dyn EventBus>,
    config: LivenessConfig,
}

impl LivenessMonitor {
    pub fn new(
        directory: Arc<AgentDirectory>,
        event_bus: Arc<dyn EventBus>,
        config: LivenessConfig,
    ) -> Self {
        Self {
            directory,
            event_bus,
            config,
        }
    }

    /// Run one sweep, returning the agents marked offline by it
    pub async fn sweep(&self) -> Vec<AgentId> {
        let timeout = chrono::Duration::from_std(self.config.heartbeat_timeout)
            .unwrap_or(chrono::Duration::MAX);
        let flipped = self.directory.mark_silent_offline(timeout).await;

        let mut ids = Vec::with_capacity(flipped.len());
        for agent in flipped {
            warn!(agent_id = %agent.agent_id, last_seen = %agent.last_seen, "Agent went offline");
            self.event_bus
                .publish(AgentEvent::AgentOffline {
                    agent_id: agent.agent_id.clone(),
                    last_seen: agent.last_seen,
                })
                .await;
            ids.push(agent.agent_id);
        }
        ids
    }

    /// Spawn the periodic sweep until `shutdown` is cancelled
    ///
    /// Runs independently of every agent's processing cycle.
    pub fn spawn(self: Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.sweep_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately; the first sweep is one interval out
            ticker.tick().await;
            info!(interval = ?self.config.sweep_interval, "Liveness monitor started");

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let flipped = self.sweep().await;
                        debug!(offline = flipped.len(), "Liveness sweep complete");
                    }
                }
            }

            info!("Liveness monitor stopped");
        })
    }
}
