//! Demo command: run the five treasury agents and stream their events.

use std::sync::Arc;
use std::time::Duration;

use aegis_core::collaborators::{
    Collaborators, ScriptedAnalysis, SimulatedCompliance, StaticDiscovery,
};
use aegis_core::comms::JitteredDelay;
use aegis_core::decision::{DecisionKind, DecisionOption};
use aegis_core::directory::default_roster;
use aegis_core::{
    AgentDirectory, AgentEvent, AgentId, AgentRuntime, CommunicationService, DecisionPoint,
    EventBus, LivenessMonitor, MemoryEventBus, MessageKind, Priority, RuntimeConfig, TaskStatus,
};
use anyhow::{Context, Result};
use clap::Args;
use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ConfigLoader;

#[derive(Debug, Args)]
pub struct DemoArgs {
    /// How long to run, in seconds
    #[arg(short, long, default_value_t = 30)]
    pub duration: u64,

    /// Only print these event types (e.g. `task_completed,message`)
    ///
    /// A bare prefix such as `message` matches every `message_*` event.
    #[arg(short, long, value_delimiter = ',')]
    pub events: Vec<String>,

    /// Also append every event as JSON to the data directory
    #[arg(long)]
    pub record: bool,
}

pub async fn run(args: DemoArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let collaborators = Collaborators::new(
        Arc::new(ScriptedAnalysis::conservative()),
        Arc::new(SimulatedCompliance::new()),
        Arc::new(StaticDiscovery::default_catalog()),
    );

    let swarm = Swarm::new(config, collaborators);
    let printer = spawn_printer(swarm.bus.clone(), args.events, args.record, swarm.shutdown.clone())?;

    swarm.start().await?;
    swarm.seed_conversation().await?;

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(args.duration)) => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    let summary = swarm.stop().await;
    if let Err(e) = printer.await {
        warn!(error = %e, "Event printer panicked");
    }

    eprintln!();
    for agent in summary {
        eprintln!(
            "{:<28} completed={:<3} failed={:<3} pending={}",
            agent.agent_id, agent.completed, agent.failed, agent.pending
        );
    }
    Ok(())
}

/// Task totals for one agent at shutdown
#[derive(Debug)]
struct AgentSummary {
    agent_id: AgentId,
    completed: usize,
    failed: usize,
    pending: usize,
}

/// Every shared service plus one runtime per roster agent
struct Swarm {
    config: RuntimeConfig,
    bus: Arc<MemoryEventBus>,
    comms: CommunicationService,
    runtimes: Vec<AgentRuntime>,
    monitor: std::sync::Mutex<Option<JoinHandle<()>>>,
    directory: Arc<AgentDirectory>,
    shutdown: CancellationToken,
}

impl Swarm {
    fn new(config: RuntimeConfig, collaborators: Collaborators) -> Self {
        let bus = Arc::new(MemoryEventBus::from_config(&config.bus));
        let directory = Arc::new(AgentDirectory::new(bus.clone()));
        let shutdown = CancellationToken::new();
        let comms = CommunicationService::new(
            directory.clone(),
            bus.clone(),
            Arc::new(JitteredDelay::new(config.transit.clone())),
            shutdown.clone(),
        );

        let runtimes = default_roster()
            .into_iter()
            .map(|spec| {
                AgentRuntime::new(
                    spec,
                    comms.clone(),
                    bus.clone(),
                    collaborators.clone(),
                    config.scheduler.clone(),
                )
            })
            .collect();

        Self {
            config,
            bus,
            comms,
            runtimes,
            monitor: std::sync::Mutex::new(None),
            directory,
            shutdown,
        }
    }

    async fn start(&self) -> Result<()> {
        for runtime in &self.runtimes {
            runtime
                .start(&self.shutdown)
                .await
                .with_context(|| format!("Failed to start {}", runtime.agent_id()))?;
        }

        let monitor = Arc::new(LivenessMonitor::new(
            self.directory.clone(),
            self.bus.clone(),
            self.config.liveness.clone(),
        ));
        let handle = monitor.spawn(self.shutdown.child_token());
        *self
            .monitor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);

        info!(agents = self.runtimes.len(), "Swarm started");
        Ok(())
    }

    /// Give the agents something to talk and decide about
    async fn seed_conversation(&self) -> Result<()> {
        let (Some(analyst), Some(risk)) = (self.runtimes.first(), self.runtimes.get(1)) else {
            return Ok(());
        };

        self.comms
            .send(
                analyst.agent_id(),
                risk.agent_id(),
                MessageKind::Request,
                "Evaluate current ETH exposure against the drawdown limit",
                Priority::High,
                true,
            )
            .await?;

        self.comms
            .broadcast(
                risk.agent_id(),
                MessageKind::Alert,
                "Volatility elevated on ETH/USDC",
                Priority::Medium,
                None,
            )
            .await?;

        let window = self.config.scheduler.cycle_interval * 4;
        let deadline = chrono::Utc::now()
            + chrono::Duration::from_std(window).unwrap_or(chrono::Duration::seconds(20));
        analyst
            .submit_decision(DecisionPoint::new(
                DecisionKind::Tactical,
                "Rebalance ETH into stablecoins?",
                vec![
                    DecisionOption::new("rebalance", "Move 10% of ETH into USDC", 20.0, 70.0),
                    DecisionOption::new("hold", "Keep the current allocation", 0.0, 80.0),
                ],
                deadline,
            ))
            .await?;

        Ok(())
    }

    /// Stop every runtime, then the shared services
    async fn stop(&self) -> Vec<AgentSummary> {
        let mut summary = Vec::with_capacity(self.runtimes.len());
        for runtime in &self.runtimes {
            if let Err(e) = runtime.stop().await {
                warn!(agent_id = %runtime.agent_id(), error = %e, "Failed to stop agent");
            }

            let tasks = runtime.tasks().await;
            let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
            summary.push(AgentSummary {
                agent_id: runtime.agent_id().clone(),
                completed: count(TaskStatus::Completed),
                failed: count(TaskStatus::Failed),
                pending: count(TaskStatus::Pending),
            });
        }

        self.shutdown.cancel();
        let monitor = self
            .monitor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = monitor
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Liveness monitor panicked");
        }

        info!("Swarm stopped");
        summary
    }
}

/// Whether `kind` is selected by the `--events` filters
fn matches_filter(kind: &str, filters: &[String]) -> bool {
    filters.is_empty()
        || filters.iter().any(|f| {
            kind == f
                || kind
                    .strip_prefix(f.as_str())
                    .is_some_and(|rest| rest.starts_with('_'))
        })
}

fn spawn_printer(
    bus: Arc<MemoryEventBus>,
    filters: Vec<String>,
    record: bool,
    shutdown: CancellationToken,
) -> Result<JoinHandle<()>> {
    let record_path = if record {
        let dir = aegis_paths::data_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Some(dir.join("events.jsonl"))
    } else {
        None
    };

    let mut rx = bus.subscribe();
    Ok(tokio::spawn(async move {
        let mut sink = match &record_path {
            Some(path) => match tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .await
            {
                Ok(file) => {
                    info!(path = %path.display(), "Recording events");
                    Some(file)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Cannot record events");
                    None
                }
            },
            None => None,
        };

        loop {
            let (seq, event) = tokio::select! {
                _ = shutdown.cancelled() => break,
                received = rx.recv() => match received {
                    Ok(received) => received,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event printer lagged");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            let line = match serde_json::to_string(&event) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Cannot serialize event");
                    continue;
                }
            };

            if let Some(file) = sink.as_mut()
                && let Err(e) = file.write_all(format!("{line}\n").as_bytes()).await
            {
                warn!(error = %e, "Stopped recording events");
                sink = None;
            }

            if matches_filter(event.kind(), &filters) {
                println!("{seq:>6} {}", describe(&event, &line));
            }
        }
    }))
}

/// One-line rendering for the terminal
fn describe(event: &AgentEvent, json: &str) -> String {
    match event.agent_id() {
        Some(agent_id) => format!("{:<22} {:<26} {json}", event.kind(), agent_id),
        None => format!("{:<22} {:<26} {json}", event.kind(), "-"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::collaborators::Analysis;

    fn deterministic_collaborators() -> Collaborators {
        Collaborators::new(
            Arc::new(ScriptedAnalysis::canned(Analysis {
                recommendation: "hold".to_string(),
                justification: "steady".to_string(),
                risk_assessment: "low".to_string(),
            })),
            Arc::new(SimulatedCompliance::with_drawdown(1.0)),
            Arc::new(StaticDiscovery::default_catalog()),
        )
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(matches_filter("task_started", &[]));
    }

    #[test]
    fn test_filter_matches_exact_kind_and_prefix() {
        let filters = vec!["message".to_string(), "decision_made".to_string()];
        assert!(matches_filter("message_delivered", &filters));
        assert!(matches_filter("decision_made", &filters));
        assert!(!matches_filter("decision_fallback", &filters));
        assert!(!matches_filter("messages", &filters));
        assert!(!matches_filter("task_completed", &filters));
    }

    #[tokio::test(start_paused = true)]
    async fn test_swarm_runs_roster_tasks_and_stops() {
        let swarm = Swarm::new(RuntimeConfig::default(), deterministic_collaborators());
        swarm.start().await.unwrap();
        swarm.seed_conversation().await.unwrap();

        tokio::time::sleep(Duration::from_secs(30)).await;
        let summary = swarm.stop().await;

        assert_eq!(summary.len(), 5);
        for agent in &summary {
            assert!(
                agent.completed + agent.failed > 0,
                "{} ran no tasks",
                agent.agent_id
            );
        }
        assert!(swarm.runtimes.iter().all(|r| !r.is_running()));

        let events = swarm.bus.events_from(0).await;
        assert!(
            events
                .iter()
                .any(|(_, e)| matches!(e, AgentEvent::AgentStopped { .. }))
        );
        assert!(
            events
                .iter()
                .any(|(_, e)| matches!(e, AgentEvent::MessageDelivered { .. }))
        );
    }
}
