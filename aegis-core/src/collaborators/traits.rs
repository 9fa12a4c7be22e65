//! Contracts for the external collaborators the core calls
//!
//! The core never depends on how these are bound (LLM API, chain RPC,
//! registry contract); it only relies on the call/return/error shape here.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CollaboratorError;

/// Treasury risk policy passed to analysis and compliance calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    /// Maximum tolerated drawdown, in percent
    pub max_drawdown: f64,
    pub volatility_target: String,
    /// Target stablecoin share of the treasury, in percent
    pub stablecoin_allocation: f64,
    pub preferred_asset_class: String,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            max_drawdown: 10.0,
            volatility_target: "low".to_string(),
            stablecoin_allocation: 60.0,
            preferred_asset_class: "stablecoins".to_string(),
        }
    }
}

/// Input to the analysis collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Structured state the prompt refers to
    pub context: Value,
    pub prompt: String,
    pub policy: RiskPolicy,
}

/// Output of the analysis collaborator
///
/// `recommendation` may name an option id outright; `justification` may
/// carry a JSON object `{"selectedOption": .., "rationale": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub recommendation: String,
    pub justification: String,
    pub risk_assessment: String,
}

#[async_trait]
pub trait AnalysisCollaborator: Send + Sync {
    async fn analyze(&self, request: AnalysisRequest) -> Result<Analysis, CollaboratorError>;
}

/// A treasury action submitted for compliance checking and execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedAction {
    pub action: String,
    pub asset_out: String,
    pub asset_in: String,
    pub amount: f64,
    pub justification: String,
    pub confidence: f64,
}

impl ProposedAction {
    /// Conservative no-op proposal used when analysis is unavailable
    pub fn hold() -> Self {
        Self {
            action: "hold".to_string(),
            asset_out: "ETH".to_string(),
            asset_in: "USDC".to_string(),
            amount: 0.0,
            justification: "Conservative approach due to analysis failure. Maintaining current allocation pending manual review.".to_string(),
            confidence: 50.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    pub projected_drawdown: f64,
    pub volatility_impact: f64,
}

/// Result of a compliance check, plus execution when accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub accepted: bool,
    /// Opaque proof reference
    pub proof: String,
    pub metrics: ExecutionMetrics,
    #[serde(default)]
    pub violations: Vec<String>,
}

#[async_trait]
pub trait ComplianceCollaborator: Send + Sync {
    async fn check_and_execute(
        &self,
        action: &ProposedAction,
        policy: &RiskPolicy,
    ) -> Result<ExecutionOutcome, CollaboratorError>;
}

/// Filters applied to service discovery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryFilters {
    pub category: Option<String>,
    pub min_reputation: Option<f64>,
    #[serde(default)]
    pub only_verified: bool,
}

/// A service offered through the discovery collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub reputation: f64,
    pub verified: bool,
}

#[async_trait]
pub trait DiscoveryCollaborator: Send + Sync {
    /// Services matching `query` (name or description) and `filters`
    async fn discover(
        &self,
        query: &str,
        filters: &DiscoveryFilters,
    ) -> Result<Vec<Service>, CollaboratorError>;
}

/// The collaborator bindings an agent runtime calls through
#[derive(Clone)]
pub struct Collaborators {
    pub analysis: Arc<dyn AnalysisCollaborator>,
    pub compliance: Arc<dyn ComplianceCollaborator>,
    pub discovery: Arc<dyn DiscoveryCollaborator>,
    pub policy: RiskPolicy,
}

impl Collaborators {
    pub fn new(
        analysis: Arc<dyn AnalysisCollaborator>,
        compliance: Arc<dyn ComplianceCollaborator>,
        discovery: Arc<dyn DiscoveryCollaborator>,
    ) -> Self {
        Self {
            analysis,
            compliance,
            discovery,
            policy: RiskPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RiskPolicy) -> Self {
        self.policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hold_proposal_moves_nothing() {
        let hold = ProposedAction::hold();
        assert_eq!(hold.action, "hold");
        assert_eq!(hold.amount, 0.0);
    }

    #[test]
    fn risk_policy_json_uses_snake_case_fields() {
        let json = serde_json::to_value(RiskPolicy::default()).unwrap();
        assert_eq!(json["max_drawdown"], 10.0);
        assert_eq!(json["preferred_asset_class"], "stablecoins");
    }
}
