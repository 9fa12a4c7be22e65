//! Per-agent runtime
//!
//! An `AgentRuntime` owns one agent's task queue and decision points and
//! runs its processing cycle on a fixed interval. Each runtime has its own
//! state and cycle guard; there is no lock shared between agents.
//!
//! A cycle:
//! 1. splits pending tasks into runnable (every dependency completed) and
//!    waiting (publishing `task_waiting` for each waiting task)
//! 2. orders runnable tasks by priority score, then creation time
//! 3. runs at most `batch_size` of them concurrently
//! 4. records each result and marks it completed or failed
//! 5. resolves open decision points and abandons expired ones
//! 6. reports the agent `busy` or `online` to the directory

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use serde::Serialize;
use serde_json::json;
use tokio::sync::{Notify, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::handlers::{HandlerContext, HandlerSet};
use super::memory::TaskMemory;
use super::task::{Task, TaskId, TaskSpec, TaskStatus, TaskType};
use crate::clock::Clock;
use crate::collaborators::{Collaborators, DiscoveryFilters};
use crate::comms::CommunicationService;
use crate::config::SchedulerConfig;
use crate::decision::{DecisionEngine, DecisionId, DecisionMaker, DecisionPoint};
use crate::directory::{AgentDirectory, AgentId, AgentSpec, AgentStatus, AgentType};
use crate::error::{HandlerError, SchedulerError};
use crate::events::{AgentEvent, EventBus};
use crate::priority::Priority;

/// A pending task that could not run, and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockedTask {
    pub task_id: TaskId,
    pub unmet_dependencies: Vec<TaskId>,
    /// Some unmet dependency has failed, so this task can never run
    pub starved: bool,
}

/// What one processing cycle did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub started: Vec<TaskId>,
    pub completed: Vec<TaskId>,
    pub failed: Vec<TaskId>,
    pub waiting: Vec<TaskId>,
    pub decided: Vec<DecisionId>,
    pub expired: Vec<DecisionId>,
    pub status: Option<AgentStatus>,
}

/// Tasks in insertion order, plus decision points
#[derive(Default)]
struct SchedulerState {
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
    decisions: Vec<DecisionPoint>,
    /// Decisions claimed by a caller that is consulting the engine
    deciding: HashSet<DecisionId>,
}

impl SchedulerState {
    fn task(&self, id: &TaskId) -> Option<&Task> {
        self.index.get(id).map(|&i| &self.tasks[i])
    }

    fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.index.get(id).map(|&i| &mut self.tasks[i])
    }

    fn unmet_dependencies(&self, task: &Task) -> Vec<TaskId> {
        task.dependencies
            .iter()
            .filter(|dep| {
                self.task(dep)
                    .is_none_or(|d| d.status != TaskStatus::Completed)
            })
            .cloned()
            .collect()
    }

    fn has_outstanding_work(&self) -> bool {
        self.tasks
            .iter()
            .any(|t| matches!(t.status, TaskStatus::Pending | TaskStatus::Running))
    }
}

struct Running {
    shutdown: CancellationToken,
    /// `None` while `start` is still bringing the agent online
    handle: Option<JoinHandle<()>>,
}

struct Inner {
    spec: AgentSpec,
    directory: Arc<AgentDirectory>,
    comms: CommunicationService,
    event_bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
    collaborators: Collaborators,
    handlers: HandlerSet,
    engine: DecisionEngine,
    config: SchedulerConfig,
    memory: Arc<TaskMemory>,
    state: RwLock<SchedulerState>,
    services: RwLock<Vec<String>>,
    cycle_guard: tokio::sync::Mutex<()>,
    running: Mutex<Option<Running>>,
    /// Woken whenever a decision claim is released
    decision_released: Notify,
}

/// One agent's scheduler, decision engine and processing loop
///
/// Cheap to clone; clones drive the same agent.
#[derive(Clone)]
pub struct AgentRuntime {
    inner: Arc<Inner>,
}

impl AgentRuntime {
    pub fn new(
        spec: AgentSpec,
        comms: CommunicationService,
        event_bus: Arc<dyn EventBus>,
        collaborators: Collaborators,
        config: SchedulerConfig,
    ) -> Self {
        Self::with_handlers(spec, comms, event_bus, collaborators, config, HandlerSet::standard())
    }

    pub fn with_handlers(
        spec: AgentSpec,
        comms: CommunicationService,
        event_bus: Arc<dyn EventBus>,
        collaborators: Collaborators,
        config: SchedulerConfig,
        handlers: HandlerSet,
    ) -> Self {
        let directory = comms.directory().clone();
        let clock = directory.clock().clone();
        let engine = DecisionEngine::new(
            DecisionMaker {
                agent_id: spec.agent_id.clone(),
                name: spec.name.clone(),
                capabilities: spec.capabilities.iter().cloned().collect(),
            },
            collaborators.analysis.clone(),
            collaborators.policy.clone(),
            event_bus.clone(),
            clock.clone(),
        );

        Self {
            inner: Arc::new(Inner {
                spec,
                directory,
                comms,
                event_bus,
                clock,
                collaborators,
                handlers,
                engine,
                config,
                memory: Arc::new(TaskMemory::new()),
                state: RwLock::new(SchedulerState::default()),
                services: RwLock::new(Vec::new()),
                cycle_guard: tokio::sync::Mutex::new(()),
                running: Mutex::new(None),
                decision_released: Notify::new(),
            }),
        }
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.inner.spec.agent_id
    }

    pub fn agent_type(&self) -> AgentType {
        self.inner.spec.agent_type
    }

    pub fn memory(&self) -> &Arc<TaskMemory> {
        &self.inner.memory
    }

    /// Services found by start-up discovery
    pub async fn services(&self) -> Vec<String> {
        self.inner.services.read().await.clone()
    }

    pub fn is_running(&self) -> bool {
        self.lock_running().is_some()
    }

    fn lock_running(&self) -> std::sync::MutexGuard<'_, Option<Running>> {
        self.inner
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ==================== Lifecycle ====================

    /// Bring the agent online and start its processing loop
    ///
    /// Registers the agent (or marks it online if already registered),
    /// runs service discovery, seeds role-specific tasks on first start and
    /// spawns the cycle loop. Cancelling `shutdown` stops the loop as well.
    /// Starting a running agent does nothing.
    pub async fn start(&self, shutdown: &CancellationToken) -> Result<(), SchedulerError> {
        let token = {
            let mut running = self.lock_running();
            if running.is_some() {
                debug!(agent_id = %self.agent_id(), "Agent already running");
                return Ok(());
            }
            let token = shutdown.child_token();
            *running = Some(Running {
                shutdown: token.clone(),
                handle: None,
            });
            token
        };

        if let Err(e) = self.bring_online().await {
            self.lock_running().take();
            return Err(e);
        }

        let runtime = self.clone();
        let loop_token = token.clone();
        let handle = tokio::spawn(async move { runtime.processing_loop(loop_token).await });
        // Empty if a concurrent stop took the slot; the cancelled token ends the loop
        if let Some(running) = self.lock_running().as_mut() {
            running.handle = Some(handle);
        }

        let inner = &self.inner;
        info!(agent_id = %inner.spec.agent_id, agent_type = %inner.spec.agent_type, "Agent started");
        inner
            .event_bus
            .publish(AgentEvent::AgentStarted {
                agent_id: inner.spec.agent_id.clone(),
                agent_type: inner.spec.agent_type,
            })
            .await;

        Ok(())
    }

    /// Register or re-mark online, discover services, seed first tasks
    async fn bring_online(&self) -> Result<(), SchedulerError> {
        let inner = &self.inner;
        if inner.directory.contains(&inner.spec.agent_id).await {
            inner
                .directory
                .set_status(&inner.spec.agent_id, AgentStatus::Online)
                .await?;
        } else {
            inner.directory.register(inner.spec.clone()).await?;
        }

        self.discover_services().await;

        if inner.state.read().await.tasks.is_empty() {
            for spec in initial_tasks(inner.spec.agent_type) {
                self.assign_task(spec).await?;
            }
        }
        Ok(())
    }

    /// Stop the processing loop and mark the agent offline
    ///
    /// A cycle already in progress finishes first.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let Some(running) = self.lock_running().take() else {
            return Ok(());
        };

        running.shutdown.cancel();
        if let Some(handle) = running.handle
            && let Err(e) = handle.await
        {
            error!(agent_id = %self.agent_id(), error = %e, "Processing loop panicked");
        }

        self.inner
            .directory
            .set_status(self.agent_id(), AgentStatus::Offline)
            .await?;

        info!(agent_id = %self.agent_id(), "Agent stopped");
        self.inner
            .event_bus
            .publish(AgentEvent::AgentStopped {
                agent_id: self.agent_id().clone(),
            })
            .await;

        Ok(())
    }

    async fn processing_loop(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.inner.config.cycle_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately; the first cycle runs one interval out
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        debug!(agent_id = %self.agent_id(), "Processing loop exited");
    }

    /// Start-up discovery; a failure leaves the list empty
    async fn discover_services(&self) {
        let inner = &self.inner;
        let filters = DiscoveryFilters {
            category: Some("ai_agent".to_string()),
            min_reputation: None,
            only_verified: true,
        };

        let services = match inner
            .collaborators
            .discovery
            .discover(inner.spec.agent_type.as_str(), &filters)
            .await
        {
            Ok(found) => found.into_iter().map(|s| s.id).collect(),
            Err(e) => {
                warn!(agent_id = %inner.spec.agent_id, error = %e, "Service discovery failed");
                Vec::new()
            }
        };

        *inner.services.write().await = services.clone();
        inner
            .event_bus
            .publish(AgentEvent::ServicesDiscovered {
                agent_id: inner.spec.agent_id.clone(),
                services,
            })
            .await;
    }

    // ==================== Tasks ====================

    /// Enqueue a task on this agent
    ///
    /// Every dependency must name a task already on this agent; unknown
    /// ids are rejected, which also rules out dependency cycles.
    pub async fn assign_task(&self, spec: TaskSpec) -> Result<Task, SchedulerError> {
        let inner = &self.inner;
        let task = {
            let mut state = inner.state.write().await;
            if let Some(missing) = spec
                .dependencies
                .iter()
                .find(|dep| !state.index.contains_key(*dep))
            {
                return Err(SchedulerError::UnknownDependency(missing.to_string()));
            }

            let task = Task {
                id: TaskId::generate(&inner.spec.agent_id),
                estimated_duration: spec.task_type.estimated_duration(),
                task_type: spec.task_type,
                description: spec.description,
                priority: spec.priority,
                status: TaskStatus::Pending,
                assigned_agent: inner.spec.agent_id.clone(),
                dependencies: spec.dependencies,
                parameters: spec.parameters,
                result: None,
                created_at: inner.clock.now(),
                started_at: None,
                completed_at: None,
            };
            let position = state.tasks.len();
            state.index.insert(task.id.clone(), position);
            state.tasks.push(task.clone());
            task
        };

        debug!(agent_id = %task.assigned_agent, task_id = %task.id, task_type = %task.task_type, "Task assigned");
        inner
            .event_bus
            .publish(AgentEvent::TaskAssigned {
                agent_id: task.assigned_agent.clone(),
                task_id: task.id.clone(),
                task_type: task.task_type,
                priority: task.priority,
                description: task.description.clone(),
            })
            .await;

        Ok(task)
    }

    /// Every task, in assignment order
    pub async fn tasks(&self) -> Vec<Task> {
        self.inner.state.read().await.tasks.clone()
    }

    pub async fn task(&self, id: &TaskId) -> Result<Task, SchedulerError> {
        self.inner
            .state
            .read()
            .await
            .task(id)
            .cloned()
            .ok_or_else(|| SchedulerError::UnknownTask(id.to_string()))
    }

    /// Pending tasks held back by unmet dependencies
    pub async fn blocked_tasks(&self) -> Vec<BlockedTask> {
        let state = self.inner.state.read().await;
        state
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Pending)
            .filter_map(|t| {
                let unmet = state.unmet_dependencies(t);
                if unmet.is_empty() {
                    return None;
                }
                let starved = unmet
                    .iter()
                    .any(|d| state.task(d).is_some_and(|d| d.status == TaskStatus::Failed));
                Some(BlockedTask {
                    task_id: t.id.clone(),
                    unmet_dependencies: unmet,
                    starved,
                })
            })
            .collect()
    }

    // ==================== Decisions ====================

    /// Register a decision point to be resolved by upcoming cycles
    pub async fn submit_decision(&self, point: DecisionPoint) -> Result<DecisionId, SchedulerError> {
        if point.options.is_empty() {
            return Err(SchedulerError::EmptyDecision(point.id.to_string()));
        }
        let mut state = self.inner.state.write().await;
        if state.decisions.iter().any(|d| d.id == point.id) {
            return Err(SchedulerError::DuplicateDecision(point.id.to_string()));
        }
        let id = point.id.clone();
        state.decisions.push(point);
        Ok(id)
    }

    pub async fn decisions(&self) -> Vec<DecisionPoint> {
        self.inner.state.read().await.decisions.clone()
    }

    pub async fn decision(&self, id: &DecisionId) -> Result<DecisionPoint, SchedulerError> {
        self.inner
            .state
            .read()
            .await
            .decisions
            .iter()
            .find(|d| &d.id == id)
            .cloned()
            .ok_or_else(|| SchedulerError::UnknownDecision(id.to_string()))
    }

    /// Resolve a submitted decision now, regardless of the cycle
    ///
    /// A resolved decision returns its recorded choice. If a cycle is
    /// already resolving it, waits for that outcome instead of asking the
    /// engine a second time.
    pub async fn decide(&self, id: &DecisionId) -> Result<String, SchedulerError> {
        let mut point = loop {
            // Registered before the state check so a release in between is not missed
            let released = self.inner.decision_released.notified();
            {
                let mut state = self.inner.state.write().await;
                let point = state
                    .decisions
                    .iter()
                    .find(|d| &d.id == id)
                    .cloned()
                    .ok_or_else(|| SchedulerError::UnknownDecision(id.to_string()))?;
                if let Some(decided) = &point.decision {
                    return Ok(decided.clone());
                }
                if state.deciding.insert(id.clone()) {
                    break point;
                }
            }
            debug!(decision_id = %id, "Decision in flight, waiting for its outcome");
            released.await;
        };

        let context = self.inner.memory.snapshot().await;
        match self.inner.engine.decide(&mut point, &context).await {
            Ok(_) => self.store_decision(point).await,
            Err(e) => {
                self.release_decision(id).await;
                Err(e)
            }
        }
    }

    /// Record a resolved point, release its claim and return the stored choice
    async fn store_decision(&self, resolved: DecisionPoint) -> Result<String, SchedulerError> {
        let id = resolved.id.clone();
        let stored = {
            let mut state = self.inner.state.write().await;
            state.deciding.remove(&id);
            state
                .decisions
                .iter_mut()
                .find(|d| d.id == id)
                .and_then(|slot| {
                    if !slot.is_resolved() {
                        *slot = resolved;
                    }
                    slot.decision.clone()
                })
        };
        self.inner.decision_released.notify_waiters();
        stored.ok_or_else(|| SchedulerError::UnknownDecision(id.to_string()))
    }

    /// Drop a claim without resolving, letting a waiter try instead
    async fn release_decision(&self, id: &DecisionId) {
        self.inner.state.write().await.deciding.remove(id);
        self.inner.decision_released.notify_waiters();
    }

    // ==================== Cycle ====================

    /// Run one processing cycle
    ///
    /// Returns `None` without doing anything if this agent's previous cycle
    /// is still in progress.
    #[instrument(name = "agent::cycle", skip(self), fields(agent_id = %self.inner.spec.agent_id))]
    pub async fn run_cycle(&self) -> Option<CycleReport> {
        let Ok(_guard) = self.inner.cycle_guard.try_lock() else {
            debug!("Previous cycle still running, skipping");
            return None;
        };

        let mut report = CycleReport::default();
        let batch = self.select_batch(&mut report).await;

        let outcomes = join_all(batch.into_iter().map(|task| self.execute(task))).await;
        for (id, ok) in outcomes {
            if ok {
                report.completed.push(id);
            } else {
                report.failed.push(id);
            }
        }

        self.evaluate_decisions(&mut report).await;
        report.status = self.publish_status().await;

        debug!(
            started = report.started.len(),
            waiting = report.waiting.len(),
            decided = report.decided.len(),
            "Cycle complete"
        );
        Some(report)
    }

    /// Mark up to `batch_size` runnable tasks running and return them
    async fn select_batch(&self, report: &mut CycleReport) -> Vec<Task> {
        let inner = &self.inner;
        let now = inner.clock.now();
        let mut waiting = Vec::new();

        let batch: Vec<Task> = {
            let mut state = inner.state.write().await;
            let mut runnable: Vec<(Priority, chrono::DateTime<chrono::Utc>, TaskId)> = Vec::new();
            for task in state.tasks.iter().filter(|t| t.status == TaskStatus::Pending) {
                let unmet = state.unmet_dependencies(task);
                if unmet.is_empty() {
                    runnable.push((task.priority, task.created_at, task.id.clone()));
                } else {
                    waiting.push((task.id.clone(), unmet));
                }
            }

            // Stable sort keeps assignment order for equal keys
            runnable.sort_by(|a, b| b.0.score().cmp(&a.0.score()).then(a.1.cmp(&b.1)));

            runnable
                .into_iter()
                .take(inner.config.batch_size)
                .filter_map(|(_, _, id)| {
                    let task = state.task_mut(&id)?;
                    debug_assert!(task.status.can_transition_to(TaskStatus::Running));
                    task.status = TaskStatus::Running;
                    task.started_at = Some(now);
                    Some(task.clone())
                })
                .collect()
        };

        for (task_id, unmet) in waiting {
            debug!(task_id = %task_id, unmet = unmet.len(), "Task waiting on dependencies");
            inner
                .event_bus
                .publish(AgentEvent::TaskWaiting {
                    agent_id: inner.spec.agent_id.clone(),
                    task_id: task_id.clone(),
                    unmet_dependencies: unmet,
                })
                .await;
            report.waiting.push(task_id);
        }

        for task in &batch {
            inner
                .event_bus
                .publish(AgentEvent::TaskStarted {
                    agent_id: inner.spec.agent_id.clone(),
                    task_id: task.id.clone(),
                })
                .await;
            report.started.push(task.id.clone());
        }

        batch
    }

    /// Run one task to completion or failure; returns whether it completed
    async fn execute(&self, task: Task) -> (TaskId, bool) {
        let inner = &self.inner;
        let task_id = task.id.clone();

        if inner.config.simulate_task_duration {
            tokio::time::sleep(task.estimated_duration).await;
        }

        let outcome = match inner.handlers.get(task.task_type).cloned() {
            Some(handler) => {
                let ctx = HandlerContext {
                    agent_id: inner.spec.agent_id.clone(),
                    agent_type: inner.spec.agent_type,
                    task,
                    comms: inner.comms.clone(),
                    collaborators: inner.collaborators.clone(),
                    memory: inner.memory.clone(),
                };
                handler.handle(&ctx).await
            }
            None => Err(HandlerError::InvalidParameters(
                "no handler for task type".to_string(),
            )),
        };

        let completed = outcome.is_ok();
        let result = match &outcome {
            Ok(value) => value.clone(),
            Err(e) => json!({ "error": e.to_string() }),
        };

        {
            let mut state = inner.state.write().await;
            if let Some(task) = state.task_mut(&task_id) {
                let next = if completed {
                    TaskStatus::Completed
                } else {
                    TaskStatus::Failed
                };
                debug_assert!(task.status.can_transition_to(next));
                task.status = next;
                task.result = Some(result.clone());
                task.completed_at = Some(inner.clock.now());
            }
        }

        match outcome {
            Ok(_) => {
                inner.memory.record(&task_id, result).await;
                info!(agent_id = %inner.spec.agent_id, task_id = %task_id, "Task completed");
                inner
                    .event_bus
                    .publish(AgentEvent::TaskCompleted {
                        agent_id: inner.spec.agent_id.clone(),
                        task_id: task_id.clone(),
                    })
                    .await;
            }
            Err(e) => {
                warn!(agent_id = %inner.spec.agent_id, task_id = %task_id, error = %e, "Task failed");
                inner
                    .event_bus
                    .publish(AgentEvent::TaskFailed {
                        agent_id: inner.spec.agent_id.clone(),
                        task_id: task_id.clone(),
                        error: e.to_string(),
                    })
                    .await;
            }
        }

        (task_id, completed)
    }

    /// Resolve open decisions and abandon expired ones
    async fn evaluate_decisions(&self, report: &mut CycleReport) {
        let inner = &self.inner;
        let now = inner.clock.now();

        let (open, expired) = {
            let mut guard = inner.state.write().await;
            let state = &mut *guard;
            let mut open = Vec::new();
            let mut expired = Vec::new();
            for point in state.decisions.iter_mut() {
                // Claimed by an explicit decide; its outcome lands there
                if state.deciding.contains(&point.id) {
                    continue;
                }
                if !point.is_resolved() && !point.expired && now >= point.deadline {
                    point.expired = true;
                    expired.push((point.id.clone(), point.deadline));
                } else if point.is_open(now) {
                    state.deciding.insert(point.id.clone());
                    open.push(point.clone());
                }
            }
            (open, expired)
        };

        for (decision_id, deadline) in expired {
            warn!(decision_id = %decision_id, %deadline, "Decision expired unresolved");
            inner
                .event_bus
                .publish(AgentEvent::DecisionExpired {
                    agent_id: inner.spec.agent_id.clone(),
                    decision_id: decision_id.clone(),
                    deadline,
                })
                .await;
            report.expired.push(decision_id);
        }

        if open.is_empty() {
            return;
        }
        let context = inner.memory.snapshot().await;
        for mut point in open {
            let decision_id = point.id.clone();
            match inner.engine.decide(&mut point, &context).await {
                Ok(_) => match self.store_decision(point).await {
                    Ok(_) => report.decided.push(decision_id),
                    Err(e) => warn!(decision_id = %decision_id, error = %e, "Decision could not be stored"),
                },
                Err(e) => {
                    self.release_decision(&decision_id).await;
                    warn!(decision_id = %decision_id, error = %e, "Decision could not be resolved");
                }
            }
        }
    }

    /// Report `busy` while work remains, else `online`
    async fn publish_status(&self) -> Option<AgentStatus> {
        let status = if self.inner.state.read().await.has_outstanding_work() {
            AgentStatus::Busy
        } else {
            AgentStatus::Online
        };

        match self.inner.directory.set_status(self.agent_id(), status).await {
            Ok(_) => Some(status),
            Err(e) => {
                warn!(error = %e, "Could not publish agent status");
                None
            }
        }
    }
}

/// Tasks an agent of each role starts with
pub fn initial_tasks(agent_type: AgentType) -> Vec<TaskSpec> {
    match agent_type {
        AgentType::FinancialAnalyst => vec![
            TaskSpec::new(TaskType::Analysis, "Daily portfolio risk assessment")
                .priority(Priority::High)
                .param("analysis_type", "risk")
                .param("frequency", "daily"),
            TaskSpec::new(TaskType::Monitoring, "Monitor market sentiment indicators")
                .priority(Priority::Medium)
                .param("indicators", json!(["fear_greed", "volatility", "volume"])),
        ],
        AgentType::RiskManager => vec![
            TaskSpec::new(TaskType::Analysis, "Evaluate treasury exposure against risk policy")
                .priority(Priority::High)
                .param("analysis_type", "exposure"),
        ],
        AgentType::MarketMonitor => vec![
            TaskSpec::new(TaskType::Monitoring, "Track price feeds and volatility")
                .priority(Priority::High)
                .param("indicators", json!(["price", "volatility"]))
                .param("pairs", json!(["ETH/USDC"])),
        ],
        AgentType::ExecutionEngine => vec![
            TaskSpec::new(TaskType::Compliance, "Validate execution venue configuration")
                .priority(Priority::Low),
        ],
        AgentType::ComplianceChecker => vec![
            TaskSpec::new(TaskType::Compliance, "Audit recent transactions against policy")
                .priority(Priority::Medium),
        ],
    }
}
