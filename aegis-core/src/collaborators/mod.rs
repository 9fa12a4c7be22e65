//! External collaborators
//!
//! Narrow async contracts for analysis, compliance/execution and service
//! discovery, plus in-process stubs.

pub mod stub;
pub mod traits;

pub use stub::{ScriptedAnalysis, SimulatedCompliance, StaticDiscovery};
pub use traits::{
    Analysis, AnalysisCollaborator, AnalysisRequest, Collaborators, ComplianceCollaborator,
    DiscoveryCollaborator, DiscoveryFilters, ExecutionMetrics, ExecutionOutcome, ProposedAction,
    RiskPolicy, Service,
};
