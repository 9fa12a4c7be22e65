//! Decision engine
//!
//! Resolves a decision point by asking the analysis collaborator, and
//! falls back to the rule-based score when the answer is unusable or the
//! call fails. A collaborator failure never escapes `decide`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::point::DecisionPoint;
use crate::clock::Clock;
use crate::collaborators::{Analysis, AnalysisCollaborator, AnalysisRequest, RiskPolicy};
use crate::directory::AgentId;
use crate::error::SchedulerError;
use crate::events::{AgentEvent, EventBus};

/// Rationale recorded when the analysis call itself failed
const FALLBACK_RATIONALE: &str = "Fallback decision due to analysis error";

/// JSON shape the analysis is asked to answer in
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Selection {
    selected_option: String,
    #[serde(default)]
    rationale: Option<String>,
}

/// Who is deciding, for the prompt
#[derive(Debug, Clone)]
pub struct DecisionMaker {
    pub agent_id: AgentId,
    pub name: String,
    pub capabilities: Vec<String>,
}

pub struct DecisionEngine {
    maker: DecisionMaker,
    analysis: Arc<dyn AnalysisCollaborator>,
    policy: RiskPolicy,
    event_bus: Arc<dyn EventBus>,
    clock: Arc<dyn Clock>,
}

impl DecisionEngine {
    pub fn new(
        maker: DecisionMaker,
        analysis: Arc<dyn AnalysisCollaborator>,
        policy: RiskPolicy,
        event_bus: Arc<dyn EventBus>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            maker,
            analysis,
            policy,
            event_bus,
            clock,
        }
    }

    /// Resolve `point`, returning the chosen option id
    ///
    /// Already-resolved points are returned as-is without consulting the
    /// collaborator again. `context` is the agent's working state, passed
    /// through to the analysis request.
    #[instrument(name = "decision::decide", skip(self, point, context), fields(agent_id = %self.maker.agent_id, decision_id = %point.id))]
    pub async fn decide(
        &self,
        point: &mut DecisionPoint,
        context: &Value,
    ) -> Result<String, SchedulerError> {
        if let Some(decided) = &point.decision {
            debug!(option_id = %decided, "Decision already resolved");
            return Ok(decided.clone());
        }
        if point.options.is_empty() {
            return Err(SchedulerError::EmptyDecision(point.id.to_string()));
        }

        self.event_bus
            .publish(AgentEvent::DecisionStart {
                agent_id: self.maker.agent_id.clone(),
                decision_id: point.id.clone(),
                description: point.description.clone(),
            })
            .await;

        let request = AnalysisRequest {
            context: json!({
                "decision": &point.id,
                "kind": point.kind,
                "memory": context,
            }),
            prompt: self.prompt(point),
            policy: self.policy.clone(),
        };

        let (option_id, rationale, fallback_reason) = match self.analysis.analyze(request).await {
            Ok(analysis) => match select(point, &analysis) {
                Some((option_id, rationale)) => (option_id, rationale, None),
                None => {
                    let option_id = fallback_id(point)?;
                    (
                        option_id,
                        analysis.justification,
                        Some("analysis did not name a known option".to_string()),
                    )
                }
            },
            Err(e) => {
                warn!(error = %e, "Analysis failed, using fallback decision");
                (
                    fallback_id(point)?,
                    FALLBACK_RATIONALE.to_string(),
                    Some(e.to_string()),
                )
            }
        };

        point.resolve(option_id.clone(), rationale.clone(), self.clock.now());

        let event = match fallback_reason {
            None => {
                info!(%option_id, "Decision made");
                AgentEvent::DecisionMade {
                    agent_id: self.maker.agent_id.clone(),
                    decision_id: point.id.clone(),
                    option_id: option_id.clone(),
                    rationale,
                }
            }
            Some(reason) => {
                info!(%option_id, %reason, "Fallback decision made");
                AgentEvent::DecisionFallback {
                    agent_id: self.maker.agent_id.clone(),
                    decision_id: point.id.clone(),
                    option_id: option_id.clone(),
                    reason,
                }
            }
        };
        self.event_bus.publish(event).await;

        Ok(option_id)
    }

    /// Natural-language summary submitted to the analysis collaborator
    pub fn prompt(&self, point: &DecisionPoint) -> String {
        let options = point
            .options
            .iter()
            .map(|o| {
                format!(
                    "- {}: {} (Impact: {}, Confidence: {})",
                    o.id, o.description, o.impact, o.confidence
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "As {name}, evaluate the following {kind} decision:\n{description}\n\n\
             Options:\n{options}\n\n\
             Consider:\n\
             - Agent capabilities: {capabilities}\n\
             - Deadline: {deadline}\n\n\
             Respond with the option ID and rationale in JSON format:\n\
             {{\"selectedOption\": \"option_id\", \"rationale\": \"explanation\"}}",
            name = self.maker.name,
            kind = point.kind,
            description = point.description,
            capabilities = self.maker.capabilities.join(", "),
            deadline = point.deadline.to_rfc3339(),
        )
    }
}

fn fallback_id(point: &DecisionPoint) -> Result<String, SchedulerError> {
    point
        .fallback_choice()
        .map(|o| o.id.clone())
        .ok_or_else(|| SchedulerError::EmptyDecision(point.id.to_string()))
}

/// Extract a valid option choice from an analysis
///
/// Accepts a bare option id as the recommendation, or a
/// `{"selectedOption", "rationale"}` object embedded in the justification.
fn select(point: &DecisionPoint, analysis: &Analysis) -> Option<(String, String)> {
    let recommended = analysis.recommendation.trim();
    if point.option(recommended).is_some() {
        return Some((recommended.to_string(), analysis.justification.clone()));
    }

    let selection = embedded_json(&analysis.justification)?;
    point.option(&selection.selected_option)?;
    Some((
        selection.selected_option,
        selection
            .rationale
            .unwrap_or_else(|| analysis.justification.clone()),
    ))
}

fn embedded_json(text: &str) -> Option<Selection> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::collaborators::ScriptedAnalysis;
    use crate::decision::{DecisionKind, DecisionOption};
    use crate::error::CollaboratorError;
    use crate::events::MemoryEventBus;

    fn engine(analysis: Arc<ScriptedAnalysis>) -> (DecisionEngine, Arc<MemoryEventBus>) {
        let bus = Arc::new(MemoryEventBus::new(100));
        let engine = DecisionEngine::new(
            DecisionMaker {
                agent_id: AgentId::from("a"),
                name: "Analyst".to_string(),
                capabilities: vec!["portfolio_analysis".to_string()],
            },
            analysis,
            RiskPolicy::default(),
            bus.clone(),
            Arc::new(ManualClock::default()),
        );
        (engine, bus)
    }

    fn x_or_y() -> DecisionPoint {
        DecisionPoint::new(
            DecisionKind::Tactical,
            "Rebalance now?",
            vec![
                DecisionOption::new("x", "rebalance", 50.0, 80.0),
                DecisionOption::new("y", "hold", -10.0, 95.0),
            ],
            Utc::now() + chrono::Duration::hours(1),
        )
    }

    fn analysis(recommendation: &str, justification: &str) -> Analysis {
        Analysis {
            recommendation: recommendation.to_string(),
            justification: justification.to_string(),
            risk_assessment: "moderate".to_string(),
        }
    }

    async fn event_kinds(bus: &MemoryEventBus) -> Vec<&'static str> {
        bus.events_from(0).await.iter().map(|(_, e)| e.kind()).collect()
    }

    #[tokio::test]
    async fn collaborator_error_falls_back_to_best_score() {
        let stub = Arc::new(ScriptedAnalysis::new());
        stub.queue_error(CollaboratorError::Timeout);
        let (engine, bus) = engine(stub);
        let mut point = x_or_y();

        let chosen = engine.decide(&mut point, &json!({})).await.unwrap();

        assert_eq!(chosen, "x");
        assert_eq!(point.decision.as_deref(), Some("x"));
        assert_eq!(point.rationale.as_deref(), Some(FALLBACK_RATIONALE));
        assert!(point.decided_at.is_some());
        assert_eq!(event_kinds(&bus).await, vec!["decision_start", "decision_fallback"]);
    }

    #[tokio::test]
    async fn recommendation_naming_option_is_accepted() {
        let stub = Arc::new(ScriptedAnalysis::new());
        stub.queue_response(analysis("y", "holding is safer"));
        let (engine, bus) = engine(stub);
        let mut point = x_or_y();

        assert_eq!(engine.decide(&mut point, &json!({})).await.unwrap(), "y");
        assert_eq!(point.rationale.as_deref(), Some("holding is safer"));
        assert_eq!(event_kinds(&bus).await, vec!["decision_start", "decision_made"]);
    }

    #[tokio::test]
    async fn json_selection_in_justification_is_accepted() {
        let stub = Arc::new(ScriptedAnalysis::new());
        stub.queue_response(analysis(
            "Recommended",
            r#"Here you go: {"selectedOption": "y", "rationale": "volatility too high"}"#,
        ));
        let (engine, _) = engine(stub);
        let mut point = x_or_y();

        assert_eq!(engine.decide(&mut point, &json!({})).await.unwrap(), "y");
        assert_eq!(point.rationale.as_deref(), Some("volatility too high"));
    }

    #[tokio::test]
    async fn unknown_option_falls_back() {
        let stub = Arc::new(ScriptedAnalysis::new());
        stub.queue_response(analysis("z", r#"{"selectedOption": "z"}"#));
        let (engine, bus) = engine(stub);
        let mut point = x_or_y();

        assert_eq!(engine.decide(&mut point, &json!({})).await.unwrap(), "x");
        assert!(event_kinds(&bus).await.contains(&"decision_fallback"));
    }

    #[tokio::test]
    async fn resolved_decision_is_not_reevaluated() {
        let stub = Arc::new(ScriptedAnalysis::new());
        stub.queue_response(analysis("y", "first"));
        stub.queue_response(analysis("x", "second"));
        let (engine, bus) = engine(stub.clone());
        let mut point = x_or_y();

        engine.decide(&mut point, &json!({})).await.unwrap();
        let decided_at = point.decided_at;
        let again = engine.decide(&mut point, &json!({})).await.unwrap();

        assert_eq!(again, "y");
        assert_eq!(point.decided_at, decided_at);
        assert_eq!(stub.prompts().len(), 1);
        assert_eq!(event_kinds(&bus).await.len(), 2);
    }

    #[tokio::test]
    async fn empty_options_rejected() {
        let (engine, _) = engine(Arc::new(ScriptedAnalysis::new()));
        let mut point = DecisionPoint::new(DecisionKind::Emergency, "nothing", vec![], Utc::now());
        assert!(matches!(
            engine.decide(&mut point, &json!({})).await,
            Err(SchedulerError::EmptyDecision(_))
        ));
    }

    #[test]
    fn prompt_lists_every_option() {
        let (engine, _) = engine(Arc::new(ScriptedAnalysis::new()));
        let prompt = engine.prompt(&x_or_y());
        assert!(prompt.contains("As Analyst"));
        assert!(prompt.contains("- x: rebalance (Impact: 50, Confidence: 80)"));
        assert!(prompt.contains("- y: hold (Impact: -10, Confidence: 95)"));
        assert!(prompt.contains("selectedOption"));
    }
}
