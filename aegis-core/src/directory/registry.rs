//! Agent directory
//!
//! The AgentDirectory is the single owner of agent records:
//! - Registering agents (append-only; there is no removal)
//! - Status updates, each stamping `last_seen`
//! - Queries by id, type and status
//!
//! Other components hold an `AgentId` and look the record up here, so no
//! private copy can drift.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::agent::{Agent, AgentId, AgentSpec, AgentStatus, AgentType};
use crate::clock::{Clock, SystemClock};
use crate::error::DirectoryError;
use crate::events::{AgentEvent, EventBus};

/// Registry of known agents
pub struct AgentDirectory {
    agents: RwLock<BTreeMap<AgentId, Agent>>,
    event_bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
}

impl AgentDirectory {
    /// Create an empty directory using the system clock
    pub fn new(event_bus: Arc<dyn EventBus>) -> Self {
        Self::with_clock(event_bus, Arc::new(SystemClock))
    }

    /// Create an empty directory with an explicit clock
    pub fn with_clock(event_bus: Arc<dyn EventBus>, clock: Arc<dyn Clock>) -> Self {
        Self {
            agents: RwLock::new(BTreeMap::new()),
            event_bus,
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Register a new agent
    ///
    /// The agent starts `Online` with `last_seen = now` and a freshly
    /// generated placeholder public key.
    pub async fn register(&self, spec: AgentSpec) -> Result<Agent, DirectoryError> {
        let agent = {
            let mut agents = self.agents.write().await;
            if agents.contains_key(&spec.agent_id) {
                return Err(DirectoryError::DuplicateAgent(spec.agent_id.to_string()));
            }

            let agent = Agent {
                public_key: generate_public_key(&spec.agent_id),
                agent_id: spec.agent_id,
                name: spec.name,
                agent_type: spec.agent_type,
                capabilities: spec.capabilities,
                status: AgentStatus::Online,
                last_seen: self.clock.now(),
            };
            agents.insert(agent.agent_id.clone(), agent.clone());
            agent
        };

        info!(agent_id = %agent.agent_id, agent_type = %agent.agent_type, "Agent registered");
        self.event_bus
            .publish(AgentEvent::AgentRegistered {
                agent_id: agent.agent_id.clone(),
                name: agent.name.clone(),
                agent_type: agent.agent_type,
            })
            .await;

        Ok(agent)
    }

    /// Get an agent by ID
    pub async fn get(&self, id: &AgentId) -> Option<Agent> {
        self.agents.read().await.get(id).cloned()
    }

    /// Get an agent by ID, failing if it is not registered
    pub async fn require(&self, id: &AgentId) -> Result<Agent, DirectoryError> {
        self.get(id)
            .await
            .ok_or_else(|| DirectoryError::UnknownAgent(id.to_string()))
    }

    pub async fn contains(&self, id: &AgentId) -> bool {
        self.agents.read().await.contains_key(id)
    }

    /// All registered agents, ordered by ID
    pub async fn list(&self) -> Vec<Agent> {
        self.agents.read().await.values().cloned().collect()
    }

    /// Agents currently `Online`
    pub async fn online_agents(&self) -> Vec<Agent> {
        self.by_status(AgentStatus::Online).await
    }

    pub async fn by_status(&self, status: AgentStatus) -> Vec<Agent> {
        self.agents
            .read()
            .await
            .values()
            .filter(|agent| agent.status == status)
            .cloned()
            .collect()
    }

    pub async fn by_type(&self, agent_type: AgentType) -> Vec<Agent> {
        self.agents
            .read()
            .await
            .values()
            .filter(|agent| agent.agent_type == agent_type)
            .cloned()
            .collect()
    }

    /// Set an agent's status and stamp `last_seen = now`
    pub async fn set_status(
        &self,
        id: &AgentId,
        status: AgentStatus,
    ) -> Result<Agent, DirectoryError> {
        let agent = {
            let mut agents = self.agents.write().await;
            let agent = agents
                .get_mut(id)
                .ok_or_else(|| DirectoryError::UnknownAgent(id.to_string()))?;
            agent.status = status;
            agent.last_seen = self.clock.now();
            agent.clone()
        };

        debug!(agent_id = %id, %status, "Agent status updated");
        self.event_bus
            .publish(AgentEvent::AgentStatusUpdated {
                agent_id: id.clone(),
                status,
            })
            .await;

        Ok(agent)
    }

    /// Mark every non-offline agent silent for longer than `timeout` as
    /// offline, returning the agents that transitioned
    ///
    /// The whole scan happens under one write lock, so a concurrent
    /// `set_status` either lands before the scan (and keeps the agent
    /// alive) or after it (and revives it).
    pub(crate) async fn mark_silent_offline(&self, timeout: chrono::Duration) -> Vec<Agent> {
        let now = self.clock.now();
        let mut agents = self.agents.write().await;
        agents
            .values_mut()
            .filter(|agent| agent.status != AgentStatus::Offline && now - agent.last_seen > timeout)
            .map(|agent| {
                agent.status = AgentStatus::Offline;
                agent.clone()
            })
            .collect()
    }
}

fn generate_public_key(id: &AgentId) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(13)
        .map(char::from)
        .collect();
    format!("pk_{}_{}", id, suffix.to_lowercase())
}
