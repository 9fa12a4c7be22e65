//! Agent record type definitions

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique, immutable identifier for an agent
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Declared role of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    FinancialAnalyst,
    RiskManager,
    MarketMonitor,
    ExecutionEngine,
    ComplianceChecker,
}

impl AgentType {
    /// All roles, in roster order
    pub const ALL: [AgentType; 5] = [
        AgentType::FinancialAnalyst,
        AgentType::RiskManager,
        AgentType::MarketMonitor,
        AgentType::ExecutionEngine,
        AgentType::ComplianceChecker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FinancialAnalyst => "financial_analyst",
            Self::RiskManager => "risk_manager",
            Self::MarketMonitor => "market_monitor",
            Self::ExecutionEngine => "execution_engine",
            Self::ComplianceChecker => "compliance_checker",
        }
    }

    /// Parse from the snake_case or kebab-case role name
    pub fn parse(s: &str) -> Option<Self> {
        match s.replace('-', "_").as_str() {
            "financial_analyst" => Some(Self::FinancialAnalyst),
            "risk_manager" => Some(Self::RiskManager),
            "market_monitor" => Some(Self::MarketMonitor),
            "execution_engine" => Some(Self::ExecutionEngine),
            "compliance_checker" => Some(Self::ComplianceChecker),
            _ => None,
        }
    }

    /// Fixed reply an agent of this role gives to any request
    pub fn canned_reply(&self) -> &'static str {
        match self {
            Self::FinancialAnalyst => {
                "Analysis complete. Market conditions suggest moderate risk. Recommendation: proceed with caution."
            }
            Self::RiskManager => {
                "Risk assessment complete. Current exposure within acceptable parameters. No immediate action required."
            }
            Self::MarketMonitor => {
                "Market monitoring active. Recent volatility detected in ETH/USDC pair. Alert threshold not exceeded."
            }
            Self::ExecutionEngine => {
                "Trade execution parameters validated. Ready to execute on confirmation."
            }
            Self::ComplianceChecker => {
                "Compliance check passed. Transaction meets regulatory requirements."
            }
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Liveness status of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Online,
    Busy,
    Offline,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Busy => "busy",
            Self::Offline => "offline",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration request for a new agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub agent_id: AgentId,
    pub name: String,
    pub agent_type: AgentType,
    pub capabilities: BTreeSet<String>,
}

impl AgentSpec {
    pub fn new(agent_id: impl Into<AgentId>, name: impl Into<String>, agent_type: AgentType) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: name.into(),
            agent_type,
            capabilities: BTreeSet::new(),
        }
    }

    /// Add capabilities
    #[must_use]
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities
            .extend(capabilities.into_iter().map(Into::into));
        self
    }
}

/// A registered agent as held by the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: AgentId,
    pub name: String,
    pub agent_type: AgentType,
    pub capabilities: BTreeSet<String>,
    pub status: AgentStatus,
    pub last_seen: DateTime<Utc>,
    /// Placeholder key used to tag simulated-encrypted content
    pub public_key: String,
}

/// The five canonical treasury agents
pub fn default_roster() -> Vec<AgentSpec> {
    vec![
        AgentSpec::new(
            "aegis_financial_analyst",
            "Aegis Financial Analyst",
            AgentType::FinancialAnalyst,
        )
        .with_capabilities(["portfolio_analysis", "risk_assessment", "market_research"]),
        AgentSpec::new(
            "sentinel_risk_manager",
            "Sentinel Risk Manager",
            AgentType::RiskManager,
        )
        .with_capabilities(["risk_monitoring", "position_sizing", "drawdown_protection"]),
        AgentSpec::new(
            "oracle_market_monitor",
            "Oracle Market Monitor",
            AgentType::MarketMonitor,
        )
        .with_capabilities(["price_monitoring", "volatility_tracking", "sentiment_analysis"]),
        AgentSpec::new(
            "nexus_execution_engine",
            "Nexus Execution Engine",
            AgentType::ExecutionEngine,
        )
        .with_capabilities(["trade_execution", "order_management", "slippage_optimization"]),
        AgentSpec::new(
            "guardian_compliance",
            "Guardian Compliance Checker",
            AgentType::ComplianceChecker,
        )
        .with_capabilities(["regulatory_compliance", "audit_trails", "reporting"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_type_parse_accepts_both_spellings() {
        assert_eq!(
            AgentType::parse("risk-manager"),
            Some(AgentType::RiskManager)
        );
        assert_eq!(
            AgentType::parse("risk_manager"),
            Some(AgentType::RiskManager)
        );
        assert_eq!(AgentType::parse("trader"), None);
    }

    #[test]
    fn agent_type_json_format() {
        assert_eq!(
            serde_json::to_string(&AgentType::ExecutionEngine).unwrap(),
            "\"execution_engine\""
        );
    }

    #[test]
    fn agent_status_default_is_online() {
        assert_eq!(AgentStatus::default(), AgentStatus::Online);
    }

    #[test]
    fn default_roster_covers_every_role_once() {
        let roster = default_roster();
        assert_eq!(roster.len(), AgentType::ALL.len());
        for agent_type in AgentType::ALL {
            assert_eq!(
                roster.iter().filter(|a| a.agent_type == agent_type).count(),
                1
            );
        }
    }

    #[test]
    fn canned_replies_differ_per_role() {
        let replies: BTreeSet<_> = AgentType::ALL.iter().map(|t| t.canned_reply()).collect();
        assert_eq!(replies.len(), AgentType::ALL.len());
    }
}
