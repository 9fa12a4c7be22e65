//! Stub collaborators for demos and tests
//!
//! None of these talk to anything external. `ScriptedAnalysis` replays
//! queued responses, `SimulatedCompliance` draws a random drawdown the way a
//! mock proof service would, and `StaticDiscovery` filters a fixed catalog.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use rand::Rng;

use super::traits::{
    Analysis, AnalysisCollaborator, AnalysisRequest, ComplianceCollaborator, DiscoveryCollaborator,
    DiscoveryFilters, ExecutionMetrics, ExecutionOutcome, ProposedAction, RiskPolicy, Service,
};
use crate::error::CollaboratorError;

/// Analysis collaborator that replays queued results
///
/// Queue results with `queue_response()` / `queue_error()`. Each call
/// consumes one; once the queue is empty every call returns the fallback
/// response if one is set, else `Unavailable`.
#[derive(Default)]
pub struct ScriptedAnalysis {
    responses: Mutex<VecDeque<Result<Analysis, CollaboratorError>>>,
    fallback: Option<Analysis>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer with `analysis` once the queue is drained
    pub fn canned(analysis: Analysis) -> Self {
        Self {
            fallback: Some(analysis),
            ..Self::default()
        }
    }

    /// The conservative answer a failed upstream analysis degrades to
    pub fn conservative() -> Self {
        Self::canned(Analysis {
            recommendation: "Not Recommended".to_string(),
            justification: "Unable to analyze trade. Defaulting to conservative approach."
                .to_string(),
            risk_assessment: "High uncertainty due to analysis failure.".to_string(),
        })
    }

    pub fn queue_response(&self, analysis: Analysis) {
        self.lock_responses().push_back(Ok(analysis));
    }

    pub fn queue_error(&self, error: CollaboratorError) {
        self.lock_responses().push_back(Err(error));
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<Analysis, CollaboratorError>>> {
        self.responses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AnalysisCollaborator for ScriptedAnalysis {
    async fn analyze(&self, request: AnalysisRequest) -> Result<Analysis, CollaboratorError> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.prompt);

        if let Some(next) = self.lock_responses().pop_front() {
            return next;
        }
        self.fallback
            .clone()
            .ok_or_else(|| CollaboratorError::Unavailable("no scripted analysis left".to_string()))
    }
}

/// Compliance collaborator with a simulated drawdown projection
///
/// An action is accepted when its projected drawdown stays within the
/// policy's `max_drawdown`. The projection is random in `[0, 15)` unless
/// pinned with [`SimulatedCompliance::with_drawdown`].
#[derive(Debug, Default, Clone)]
pub struct SimulatedCompliance {
    drawdown: Option<f64>,
}

impl SimulatedCompliance {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always project `drawdown`
    pub fn with_drawdown(drawdown: f64) -> Self {
        Self {
            drawdown: Some(drawdown),
        }
    }
}

fn mock_proof() -> String {
    let mut rng = rand::thread_rng();
    (0..64)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect()
}

#[async_trait]
impl ComplianceCollaborator for SimulatedCompliance {
    async fn check_and_execute(
        &self,
        _action: &ProposedAction,
        policy: &RiskPolicy,
    ) -> Result<ExecutionOutcome, CollaboratorError> {
        let (projected_drawdown, volatility_impact) = {
            let mut rng = rand::thread_rng();
            (
                self.drawdown.unwrap_or_else(|| rng.gen_range(0.0..15.0)),
                rng.gen_range(0.0..0.2),
            )
        };
        let accepted = projected_drawdown <= policy.max_drawdown;

        Ok(ExecutionOutcome {
            accepted,
            proof: mock_proof(),
            metrics: ExecutionMetrics {
                projected_drawdown,
                volatility_impact,
            },
            violations: if accepted {
                Vec::new()
            } else {
                vec!["Max Drawdown Exceeded".to_string()]
            },
        })
    }
}

/// Discovery collaborator over a fixed catalog
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    catalog: Vec<Service>,
    unavailable: bool,
}

impl StaticDiscovery {
    pub fn new(catalog: Vec<Service>) -> Self {
        Self {
            catalog,
            unavailable: false,
        }
    }

    /// A registry that fails every lookup
    pub fn unavailable() -> Self {
        Self {
            catalog: Vec::new(),
            unavailable: true,
        }
    }

    /// The services a fresh marketplace registry starts with
    pub fn default_catalog() -> Self {
        let service = |id: &str, name: &str, description: &str, category: &str, reputation| Service {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            category: category.to_string(),
            reputation,
            verified: true,
        };
        Self::new(vec![
            service(
                "svc_aegis_financial",
                "Aegis AI Financial Agent",
                "AI-powered financial analysis and portfolio management",
                "ai_agent",
                95.0,
            ),
            service(
                "svc_price_oracle",
                "ChainLink Price Oracle",
                "Decentralized price feeds for DeFi applications",
                "oracle",
                92.0,
            ),
            service(
                "svc_privacy_protocol",
                "Midnight Privacy Protocol",
                "Zero-knowledge transaction privacy service",
                "defi_protocol",
                88.0,
            ),
        ])
    }
}

#[async_trait]
impl DiscoveryCollaborator for StaticDiscovery {
    async fn discover(
        &self,
        query: &str,
        filters: &DiscoveryFilters,
    ) -> Result<Vec<Service>, CollaboratorError> {
        if self.unavailable {
            return Err(CollaboratorError::Unavailable(
                "service registry unreachable".to_string(),
            ));
        }

        let query = query.to_lowercase();
        let terms: Vec<&str> = query
            .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .collect();
        let mut results: Vec<Service> = self
            .catalog
            .iter()
            .filter(|s| {
                let text = format!("{} {}", s.name, s.description).to_lowercase();
                terms.is_empty() || terms.iter().any(|t| text.contains(t))
            })
            .filter(|s| filters.category.as_ref().is_none_or(|c| &s.category == c))
            .filter(|s| filters.min_reputation.is_none_or(|min| s.reputation >= min))
            .filter(|s| !filters.only_verified || s.verified)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.reputation.total_cmp(&a.reputation));
        Ok(results)
    }
}
