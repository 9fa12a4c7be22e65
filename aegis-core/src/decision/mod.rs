//! Decision points and the engine that resolves them

pub mod engine;
pub mod point;

pub use engine::{DecisionEngine, DecisionMaker};
pub use point::{DecisionId, DecisionKind, DecisionOption, DecisionPoint};
