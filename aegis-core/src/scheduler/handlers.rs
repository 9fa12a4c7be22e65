//! Task-type handlers
//!
//! A handler turns a task's parameters (plus its dependencies' recorded
//! results) into a JSON result, calling collaborators or the communication
//! service as needed. Any `Err` marks the task failed; the scheduler never
//! retries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::memory::TaskMemory;
use super::task::{Task, TaskType};
use crate::collaborators::{AnalysisRequest, Collaborators, ProposedAction};
use crate::comms::{CommunicationService, MessageKind};
use crate::directory::{AgentId, AgentType};
use crate::error::HandlerError;
use crate::priority::Priority;

/// Everything a handler may use while running one task
pub struct HandlerContext {
    pub agent_id: AgentId,
    pub agent_type: AgentType,
    pub task: Task,
    pub comms: CommunicationService,
    pub collaborators: Collaborators,
    pub memory: Arc<TaskMemory>,
}

impl HandlerContext {
    /// Recorded results of this task's dependencies, in dependency order
    pub async fn dependency_results(&self) -> Vec<Value> {
        let mut results = Vec::with_capacity(self.task.dependencies.len());
        for dep in &self.task.dependencies {
            if let Some(value) = self.memory.get(dep).await {
                results.push(value);
            }
        }
        results
    }

    fn params<T: for<'de> Deserialize<'de>>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(Value::Object(self.task.parameters.clone()))
            .map_err(|e| HandlerError::InvalidParameters(e.to_string()))
    }
}

#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, ctx: &HandlerContext) -> Result<Value, HandlerError>;
}

/// Handlers keyed by task type
#[derive(Clone)]
pub struct HandlerSet {
    handlers: HashMap<TaskType, Arc<dyn TaskHandler>>,
}

impl HandlerSet {
    /// The built-in handler for every task type
    pub fn standard() -> Self {
        let mut handlers: HashMap<TaskType, Arc<dyn TaskHandler>> = HashMap::new();
        handlers.insert(TaskType::Analysis, Arc::new(AnalysisHandler));
        handlers.insert(TaskType::Monitoring, Arc::new(MonitoringHandler));
        handlers.insert(TaskType::Execution, Arc::new(ExecutionHandler));
        handlers.insert(TaskType::Communication, Arc::new(CommunicationHandler));
        handlers.insert(TaskType::Compliance, Arc::new(ComplianceHandler));
        Self { handlers }
    }

    /// Replace the handler for one task type
    #[must_use]
    pub fn with_handler(mut self, task_type: TaskType, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(task_type, handler);
        self
    }

    pub fn get(&self, task_type: TaskType) -> Option<&Arc<dyn TaskHandler>> {
        self.handlers.get(&task_type)
    }
}

impl Default for HandlerSet {
    fn default() -> Self {
        Self::standard()
    }
}

/// Asks the analysis collaborator for a treasury proposal
///
/// A failed or unparseable analysis degrades to the conservative "hold"
/// proposal instead of failing the task.
pub struct AnalysisHandler;

#[async_trait]
impl TaskHandler for AnalysisHandler {
    async fn handle(&self, ctx: &HandlerContext) -> Result<Value, HandlerError> {
        let request = AnalysisRequest {
            context: json!({
                "parameters": &ctx.task.parameters,
                "dependencies": ctx.dependency_results().await,
            }),
            prompt: format!(
                "As a {} agent, analyze the treasury for: {}. Respond with a JSON proposal \
                 {{\"action\", \"asset_out\", \"asset_in\", \"amount\", \"justification\", \"confidence\"}}.",
                ctx.agent_type, ctx.task.description
            ),
            policy: ctx.collaborators.policy.clone(),
        };

        let (proposal, degraded) = match ctx.collaborators.analysis.analyze(request).await {
            Ok(analysis) => match embedded_proposal(&analysis.justification) {
                Some(proposal) => (proposal, false),
                None => {
                    debug!(task_id = %ctx.task.id, "Analysis carried no proposal, holding");
                    let mut hold = ProposedAction::hold();
                    hold.justification = analysis.justification;
                    (hold, false)
                }
            },
            Err(e) => {
                warn!(task_id = %ctx.task.id, error = %e, "Analysis unavailable, using default proposal");
                (ProposedAction::hold(), true)
            }
        };

        Ok(json!({
            "analysis": "Analysis completed",
            "confidence": proposal.confidence,
            "proposal": proposal,
            "degraded": degraded,
        }))
    }
}

fn embedded_proposal(text: &str) -> Option<ProposedAction> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

pub struct MonitoringHandler;

#[async_trait]
impl TaskHandler for MonitoringHandler {
    async fn handle(&self, ctx: &HandlerContext) -> Result<Value, HandlerError> {
        Ok(json!({
            "monitoring": "Monitoring active",
            "indicators": ctx.task.parameters.get("indicators").cloned().unwrap_or(Value::Null),
            "alerts_triggered": 0,
        }))
    }
}

/// Submits a proposal for compliance checking and execution
///
/// The proposal comes from the `proposal` parameter, or else from the first
/// dependency whose result carries one. A rejection fails the task.
pub struct ExecutionHandler;

#[derive(Deserialize)]
struct ProposalResult {
    proposal: ProposedAction,
}

#[async_trait]
impl TaskHandler for ExecutionHandler {
    async fn handle(&self, ctx: &HandlerContext) -> Result<Value, HandlerError> {
        let proposal = match ctx.task.parameters.get("proposal") {
            Some(value) => serde_json::from_value::<ProposedAction>(value.clone())
                .map_err(|e| HandlerError::InvalidParameters(e.to_string()))?,
            None => ctx
                .dependency_results()
                .await
                .into_iter()
                .find_map(|v| serde_json::from_value::<ProposalResult>(v).ok())
                .map(|r| r.proposal)
                .ok_or_else(|| {
                    HandlerError::InvalidParameters("no proposal to execute".to_string())
                })?,
        };

        let outcome = ctx
            .collaborators
            .compliance
            .check_and_execute(&proposal, &ctx.collaborators.policy)
            .await?;

        if !outcome.accepted {
            return Err(HandlerError::Rejected(if outcome.violations.is_empty() {
                "compliance check failed".to_string()
            } else {
                outcome.violations.join(", ")
            }));
        }

        Ok(json!({
            "execution": "Execution completed",
            "transaction_id": format!("tx_{}", ctx.task.id),
            "action": proposal.action,
            "proof": outcome.proof,
            "metrics": outcome.metrics,
        }))
    }
}

/// Parameters of a communication task
#[derive(Debug, Deserialize)]
struct CommunicationParams {
    recipient: AgentId,
    message: String,
    #[serde(default)]
    message_type: MessageKind,
    #[serde(default)]
    encrypted: bool,
}

/// Sends a message on the agent's behalf
pub struct CommunicationHandler;

#[async_trait]
impl TaskHandler for CommunicationHandler {
    async fn handle(&self, ctx: &HandlerContext) -> Result<Value, HandlerError> {
        let params: CommunicationParams = ctx.params()?;
        let priority = if ctx.task.priority == Priority::Critical {
            Priority::Critical
        } else {
            Priority::Medium
        };

        let message = ctx
            .comms
            .send(
                &ctx.agent_id,
                &params.recipient,
                params.message_type,
                &params.message,
                priority,
                params.encrypted,
            )
            .await?;

        Ok(json!({
            "communication": "Message sent successfully",
            "recipient": params.recipient,
            "message_id": message.id,
        }))
    }
}

pub struct ComplianceHandler;

#[async_trait]
impl TaskHandler for ComplianceHandler {
    async fn handle(&self, _ctx: &HandlerContext) -> Result<Value, HandlerError> {
        Ok(json!({
            "compliance": "Compliance check passed",
            "violations": 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::Duration;

    use chrono::Utc;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::collaborators::{Analysis, ScriptedAnalysis, SimulatedCompliance, StaticDiscovery};
    use crate::comms::FixedDelay;
    use crate::directory::{AgentDirectory, AgentSpec};
    use crate::error::CollaboratorError;
    use crate::events::MemoryEventBus;
    use crate::scheduler::{TaskId, TaskParameters, TaskStatus};

    async fn context(
        task_type: TaskType,
        parameters: Value,
        analysis: ScriptedAnalysis,
        drawdown: f64,
    ) -> HandlerContext {
        let bus = Arc::new(MemoryEventBus::new(100));
        let directory = Arc::new(AgentDirectory::new(bus.clone()));
        directory
            .register(AgentSpec::new("a", "Analyst", AgentType::FinancialAnalyst))
            .await
            .unwrap();
        directory
            .register(AgentSpec::new("b", "Risk", AgentType::RiskManager))
            .await
            .unwrap();
        let comms = CommunicationService::new(
            directory,
            bus,
            Arc::new(FixedDelay::new(Duration::from_millis(10), Duration::from_millis(10))),
            CancellationToken::new(),
        );
        let parameters: TaskParameters = match parameters {
            Value::Object(map) => map,
            _ => TaskParameters::new(),
        };
        HandlerContext {
            agent_id: AgentId::from("a"),
            agent_type: AgentType::FinancialAnalyst,
            task: Task {
                id: TaskId::from("task_1"),
                task_type,
                description: "test".to_string(),
                priority: Priority::High,
                status: TaskStatus::Running,
                assigned_agent: AgentId::from("a"),
                dependencies: BTreeSet::new(),
                parameters,
                result: None,
                created_at: Utc::now(),
                started_at: Some(Utc::now()),
                completed_at: None,
                estimated_duration: task_type.estimated_duration(),
            },
            comms,
            collaborators: Collaborators::new(
                Arc::new(analysis),
                Arc::new(SimulatedCompliance::with_drawdown(drawdown)),
                Arc::new(StaticDiscovery::default_catalog()),
            ),
            memory: Arc::new(TaskMemory::new()),
        }
    }

    // ==================== Analysis Tests ====================

    #[tokio::test]
    async fn analysis_failure_yields_hold_proposal() {
        let stub = ScriptedAnalysis::new();
        stub.queue_error(CollaboratorError::Timeout);
        let ctx = context(TaskType::Analysis, json!({}), stub, 0.0).await;

        let result = AnalysisHandler.handle(&ctx).await.unwrap();

        assert_eq!(result["proposal"]["action"], "hold");
        assert_eq!(result["degraded"], true);
    }

    #[tokio::test]
    async fn analysis_extracts_embedded_proposal() {
        let stub = ScriptedAnalysis::new();
        stub.queue_response(Analysis {
            recommendation: "Recommended".to_string(),
            justification: r#"{"action": "rebalance", "asset_out": "ETH", "asset_in": "USDC", "amount": 1.5, "justification": "reduce volatility", "confidence": 80}"#.to_string(),
            risk_assessment: "moderate".to_string(),
        });
        let ctx = context(TaskType::Analysis, json!({}), stub, 0.0).await;

        let result = AnalysisHandler.handle(&ctx).await.unwrap();

        assert_eq!(result["proposal"]["action"], "rebalance");
        assert_eq!(result["confidence"], 80.0);
        assert_eq!(result["degraded"], false);
    }

    // ==================== Execution Tests ====================

    #[tokio::test]
    async fn execution_without_proposal_is_invalid() {
        let ctx = context(TaskType::Execution, json!({}), ScriptedAnalysis::new(), 0.0).await;
        assert!(matches!(
            ExecutionHandler.handle(&ctx).await,
            Err(HandlerError::InvalidParameters(_))
        ));
    }

    #[tokio::test]
    async fn execution_rejection_is_an_error() {
        let params = json!({"proposal": ProposedAction::hold()});
        let ctx = context(TaskType::Execution, params, ScriptedAnalysis::new(), 14.0).await;

        let result = ExecutionHandler.handle(&ctx).await;

        assert_eq!(
            result,
            Err(HandlerError::Rejected("Max Drawdown Exceeded".to_string()))
        );
    }

    #[tokio::test]
    async fn execution_uses_dependency_proposal() {
        let mut ctx = context(TaskType::Execution, json!({}), ScriptedAnalysis::new(), 1.0).await;
        let dep = TaskId::from("task_0");
        ctx.task.dependencies.insert(dep.clone());
        ctx.memory
            .record(&dep, json!({"proposal": ProposedAction::hold()}))
            .await;

        let result = ExecutionHandler.handle(&ctx).await.unwrap();

        assert_eq!(result["action"], "hold");
        assert_eq!(result["proof"].as_str().unwrap().len(), 64);
    }

    // ==================== Communication Tests ====================

    #[tokio::test]
    async fn communication_sends_message() {
        let params = json!({"recipient": "b", "message": "status?", "message_type": "request"});
        let ctx = context(TaskType::Communication, params, ScriptedAnalysis::new(), 0.0).await;

        let result = CommunicationHandler.handle(&ctx).await.unwrap();

        assert_eq!(result["recipient"], "b");
        let history = ctx.comms.history(&AgentId::from("b"), None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, MessageKind::Request);
        assert_eq!(history[0].priority, Priority::Medium);
    }

    #[tokio::test]
    async fn communication_to_unknown_agent_fails() {
        let params = json!({"recipient": "ghost", "message": "hi"});
        let ctx = context(TaskType::Communication, params, ScriptedAnalysis::new(), 0.0).await;

        assert!(matches!(
            CommunicationHandler.handle(&ctx).await,
            Err(HandlerError::Comms(_))
        ));
    }

    #[tokio::test]
    async fn communication_requires_recipient() {
        let ctx = context(
            TaskType::Communication,
            json!({"message": "hi"}),
            ScriptedAnalysis::new(),
            0.0,
        )
        .await;

        assert!(matches!(
            CommunicationHandler.handle(&ctx).await,
            Err(HandlerError::InvalidParameters(_))
        ));
    }

    #[test]
    fn standard_set_covers_every_type() {
        let set = HandlerSet::standard();
        for task_type in [
            TaskType::Analysis,
            TaskType::Monitoring,
            TaskType::Execution,
            TaskType::Communication,
            TaskType::Compliance,
        ] {
            assert!(set.get(task_type).is_some());
        }
    }
}
