//! Concurrency tests for agent runtimes
//!
//! These tests validate that per-agent cycle exclusion works correctly:
//! - Cycles of different agents proceed in parallel
//! - A second cycle of the same agent is skipped, not queued behind the first
//! - The liveness sweep is never blocked by a running cycle
//! - A decision point is resolved once even when a cycle and an explicit
//!   decide race for it
//! - Concurrent starts spawn a single processing loop

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use aegis_core::collaborators::{
    Analysis, AnalysisCollaborator, AnalysisRequest, Collaborators, ScriptedAnalysis,
    SimulatedCompliance, StaticDiscovery,
};
use aegis_core::comms::FixedDelay;
use aegis_core::config::{LivenessConfig, SchedulerConfig};
use aegis_core::decision::{DecisionKind, DecisionOption};
use aegis_core::directory::AgentSpec;
use aegis_core::error::{CollaboratorError, HandlerError};
use aegis_core::scheduler::{HandlerContext, HandlerSet, TaskHandler, TaskSpec};
use aegis_core::{
    AgentDirectory, AgentRuntime, AgentStatus, AgentType, Clock, CommunicationService,
    DecisionPoint, EventBus, LivenessMonitor, ManualClock, MemoryEventBus, TaskStatus, TaskType,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Handler that takes a fixed time to finish
struct Slow(Duration);

#[async_trait]
impl TaskHandler for Slow {
    async fn handle(&self, _ctx: &HandlerContext) -> Result<Value, HandlerError> {
        tokio::time::sleep(self.0).await;
        Ok(json!({ "slept_ms": self.0.as_millis() as u64 }))
    }
}

struct Fixture {
    directory: Arc<AgentDirectory>,
    bus: Arc<MemoryEventBus>,
    clock: Arc<ManualClock>,
    comms: CommunicationService,
}

fn fixture() -> Fixture {
    let bus = Arc::new(MemoryEventBus::new(1000));
    let clock = Arc::new(ManualClock::default());
    let directory = Arc::new(AgentDirectory::with_clock(bus.clone(), clock.clone()));
    let comms = CommunicationService::new(
        directory.clone(),
        bus.clone(),
        Arc::new(FixedDelay::instant()),
        CancellationToken::new(),
    );
    Fixture {
        directory,
        bus,
        clock,
        comms,
    }
}

async fn slow_runtime(f: &Fixture, id: &str, delay: Duration) -> AgentRuntime {
    let spec = AgentSpec::new(id, id, AgentType::MarketMonitor);
    f.directory.register(spec.clone()).await.unwrap();
    let runtime = AgentRuntime::with_handlers(
        spec,
        f.comms.clone(),
        f.bus.clone(),
        Collaborators::new(
            Arc::new(ScriptedAnalysis::new()),
            Arc::new(SimulatedCompliance::new()),
            Arc::new(StaticDiscovery::default_catalog()),
        ),
        SchedulerConfig::default(),
        HandlerSet::standard().with_handler(TaskType::Monitoring, Arc::new(Slow(delay))),
    );
    runtime
        .assign_task(TaskSpec::new(TaskType::Monitoring, "watch"))
        .await
        .unwrap();
    runtime
}

#[tokio::test(start_paused = true)]
async fn cycles_of_different_agents_overlap() {
    let f = fixture();
    let a = slow_runtime(&f, "a", Duration::from_secs(1)).await;
    let b = slow_runtime(&f, "b", Duration::from_secs(1)).await;

    let start = Instant::now();
    let (ra, rb) = tokio::join!(a.run_cycle(), b.run_cycle());

    assert_eq!(ra.unwrap().completed.len(), 1);
    assert_eq!(rb.unwrap().completed.len(), 1);
    assert!(
        start.elapsed() < Duration::from_millis(1500),
        "cycles ran serially: {:?}",
        start.elapsed()
    );
}

#[tokio::test(start_paused = true)]
async fn batch_tasks_run_concurrently_within_a_cycle() {
    let f = fixture();
    let a = slow_runtime(&f, "a", Duration::from_secs(1)).await;
    for _ in 0..2 {
        a.assign_task(TaskSpec::new(TaskType::Monitoring, "more"))
            .await
            .unwrap();
    }

    let start = Instant::now();
    let report = a.run_cycle().await.unwrap();

    assert_eq!(report.completed.len(), 3);
    assert!(start.elapsed() < Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn same_agent_cycles_never_overlap() {
    let f = fixture();
    let a = slow_runtime(&f, "a", Duration::from_secs(1)).await;

    let (first, second) = tokio::join!(a.run_cycle(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        a.run_cycle().await
    });

    assert!(first.is_some());
    assert!(second.is_none());
    let tasks = a.tasks().await;
    assert_eq!(tasks[0].status, TaskStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn liveness_sweep_runs_during_a_cycle() {
    let f = fixture();
    let a = slow_runtime(&f, "a", Duration::from_secs(10)).await;
    f.directory
        .register(AgentSpec::new("quiet", "Quiet", AgentType::ComplianceChecker))
        .await
        .unwrap();
    let monitor = LivenessMonitor::new(f.directory.clone(), f.bus.clone(), LivenessConfig::default());
    f.clock.advance(Duration::from_secs(61));

    let cycle = tokio::spawn({
        let a = a.clone();
        async move { a.run_cycle().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let start = Instant::now();
    let flipped = monitor.sweep().await;
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(flipped.len(), 2);

    // the cycle's own status report revives its agent afterwards
    assert!(cycle.await.unwrap().is_some());
    assert_eq!(
        f.directory
            .get(a.agent_id())
            .await
            .unwrap()
            .status,
        AgentStatus::Online
    );
}

/// Analysis that takes a while and changes its answer after the first call
#[derive(Default)]
struct SlowAnalysis {
    calls: AtomicUsize,
}

#[async_trait]
impl AnalysisCollaborator for SlowAnalysis {
    async fn analyze(&self, _request: AnalysisRequest) -> Result<Analysis, CollaboratorError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(Analysis {
            recommendation: if call == 0 { "y" } else { "x" }.to_string(),
            justification: "considered".to_string(),
            risk_assessment: "low".to_string(),
        })
    }
}

async fn deciding_runtime(f: &Fixture, analysis: Arc<SlowAnalysis>) -> AgentRuntime {
    let spec = AgentSpec::new("analyst", "Analyst", AgentType::FinancialAnalyst);
    f.directory.register(spec.clone()).await.unwrap();
    AgentRuntime::new(
        spec,
        f.comms.clone(),
        f.bus.clone(),
        Collaborators::new(
            analysis,
            Arc::new(SimulatedCompliance::new()),
            Arc::new(StaticDiscovery::default_catalog()),
        ),
        SchedulerConfig::default(),
    )
}

fn rebalance_decision(f: &Fixture) -> DecisionPoint {
    DecisionPoint::new(
        DecisionKind::Tactical,
        "Rebalance?",
        vec![
            DecisionOption::new("x", "rebalance", 50.0, 80.0),
            DecisionOption::new("y", "hold", -10.0, 95.0),
        ],
        f.clock.now() + chrono::Duration::seconds(60),
    )
}

async fn decision_made_count(f: &Fixture) -> usize {
    f.bus
        .events_from(0)
        .await
        .iter()
        .filter(|(_, e)| e.kind() == "decision_made")
        .count()
}

#[tokio::test(start_paused = true)]
async fn explicit_decide_waits_for_cycle_in_flight() {
    let f = fixture();
    let analysis = Arc::new(SlowAnalysis::default());
    let runtime = deciding_runtime(&f, analysis.clone()).await;
    let id = runtime.submit_decision(rebalance_decision(&f)).await.unwrap();

    let cycle = tokio::spawn({
        let runtime = runtime.clone();
        async move { runtime.run_cycle().await }
    });
    tokio::time::sleep(Duration::from_millis(10)).await;

    let returned = runtime.decide(&id).await.unwrap();
    let report = cycle.await.unwrap().unwrap();
    let stored = runtime.decision(&id).await.unwrap().decision;

    assert_eq!(report.decided, vec![id.clone()]);
    assert_eq!(returned, "y");
    assert_eq!(stored.as_deref(), Some("y"));
    assert_eq!(analysis.calls.load(Ordering::SeqCst), 1);
    assert_eq!(decision_made_count(&f).await, 1);
}

#[tokio::test(start_paused = true)]
async fn cycle_skips_decision_claimed_by_explicit_decide() {
    let f = fixture();
    let analysis = Arc::new(SlowAnalysis::default());
    let runtime = deciding_runtime(&f, analysis.clone()).await;
    let id = runtime.submit_decision(rebalance_decision(&f)).await.unwrap();

    let (returned, report) = tokio::join!(runtime.decide(&id), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        runtime.run_cycle().await
    });

    assert_eq!(returned.unwrap(), "y");
    assert!(report.unwrap().decided.is_empty());
    assert_eq!(
        runtime.decision(&id).await.unwrap().decision.as_deref(),
        Some("y")
    );
    assert_eq!(analysis.calls.load(Ordering::SeqCst), 1);
    assert_eq!(decision_made_count(&f).await, 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_starts_spawn_one_loop() {
    let f = fixture();
    let a = slow_runtime(&f, "a", Duration::from_millis(100)).await;
    let b = a.clone();
    let shutdown = CancellationToken::new();

    let (ra, rb) = tokio::join!(a.start(&shutdown), b.start(&shutdown));
    ra.unwrap();
    rb.unwrap();

    let started = f
        .bus
        .events_from(0)
        .await
        .iter()
        .filter(|(_, e)| e.kind() == "agent_started")
        .count();
    assert_eq!(started, 1);

    a.stop().await.unwrap();
    assert!(!b.is_running());

    // no orphaned loop keeps reporting the agent busy or online
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(
        f.directory.get(a.agent_id()).await.unwrap().status,
        AgentStatus::Offline
    );
}
